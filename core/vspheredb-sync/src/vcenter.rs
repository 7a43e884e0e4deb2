//! vCenter records and their per-connection cache.

use crate::error::{SyncError, SyncResult};
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use vspheredb_db::Db;
use vspheredb_types::VCenterId;

/// A vCenter or standalone ESXi host results are synchronized for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCenter {
    pub id: VCenterId,
    pub instance_uuid: Uuid,
    pub name: String,
    /// `VirtualCenter` or `HostAgent`.
    pub api_type: String,
    pub api_version: Option<String>,
}

impl VCenter {
    /// Loads a vCenter by id.
    pub fn load(db: &Db, id: VCenterId) -> SyncResult<Self> {
        let row = db
            .connection()
            .query_row(
                "SELECT instance_uuid, name, api_type, api_version FROM vcenter WHERE id = ?1",
                params![id.get()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((uuid, name, api_type, api_version)) = row else {
            return Err(SyncError::NotFound(format!("vCenter {id}")));
        };
        let instance_uuid = Uuid::parse_str(&uuid)
            .map_err(|e| SyncError::Storage(format!("invalid instance_uuid for vCenter {id}: {e}")))?;

        Ok(Self {
            id,
            instance_uuid,
            name,
            api_type,
            api_version,
        })
    }

    /// Registers a new vCenter and returns it with its assigned id.
    pub fn create(db: &Db, instance_uuid: Uuid, name: &str, api_type: &str) -> SyncResult<Self> {
        db.connection().execute(
            "INSERT INTO vcenter (instance_uuid, name, api_type) VALUES (?1, ?2, ?3)",
            params![instance_uuid.to_string(), name, api_type],
        )?;
        let id = u32::try_from(db.connection().last_insert_rowid())
            .map_err(|e| SyncError::Storage(format!("vCenter id out of range: {e}")))?;
        Self::load(db, VCenterId::new(id))
    }
}

/// vCenters loaded through the current connection.
#[derive(Debug, Default)]
pub struct VCenterRegistry {
    vcenters: HashMap<VCenterId, Arc<VCenter>>,
}

impl VCenterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached vCenter, loading it on first access.
    pub fn require(&mut self, db: &Db, id: VCenterId) -> SyncResult<Arc<VCenter>> {
        if let Some(vcenter) = self.vcenters.get(&id) {
            return Ok(Arc::clone(vcenter));
        }
        let vcenter = Arc::new(VCenter::load(db, id)?);
        debug!("Loaded vCenter {} ({})", id, vcenter.name);
        self.vcenters.insert(id, Arc::clone(&vcenter));
        Ok(vcenter)
    }

    pub fn len(&self) -> usize {
        self.vcenters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vcenters.is_empty()
    }

    /// Drops every cached vCenter.
    pub fn clear(&mut self) {
        self.vcenters.clear();
    }
}
