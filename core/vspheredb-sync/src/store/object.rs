//! Table-backed object stores.
//!
//! Each vSphere object becomes one row keyed by `(vcenter_id, moref)`. The
//! mapped property values are hashed into a checksum; rows are only written
//! when the checksum changes.

use super::SyncStore;
use crate::error::{SyncError, SyncResult};
use crate::vcenter::VCenter;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};
use vspheredb_db::Db;
use vspheredb_types::{ManagedObject, ResultBatch, ResultKind, SyncStats, VCenterId};

static NULL: Value = Value::Null;

/// Maps a vSphere property path to a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub property: &'static str,
}

const fn col(name: &'static str, property: &'static str) -> Column {
    Column { name, property }
}

/// Layout of one object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectTable {
    /// Result kind stored into this table.
    pub kind: &'static str,
    pub table: &'static str,
    pub columns: &'static [Column],
    /// Remove rows whose object is missing from a batch. Only valid for
    /// tasks that always deliver the full object set.
    pub prune_missing: bool,
}

const BUILTIN_TABLES: &[ObjectTable] = &[
    ObjectTable {
        kind: "HostSystem",
        table: "host_system",
        columns: &[
            col("host_name", "name"),
            col("hardware_uuid", "summary.hardware.uuid"),
            col("cpu_cores", "summary.hardware.numCpuCores"),
            col("memory_size", "summary.hardware.memorySize"),
            col("overall_status", "overallStatus"),
        ],
        prune_missing: true,
    },
    ObjectTable {
        kind: "VirtualMachine",
        table: "virtual_machine",
        columns: &[
            col("object_name", "name"),
            col("guest_host_name", "guest.hostName"),
            col("power_state", "runtime.powerState"),
            col("runtime_host", "runtime.host"),
            col("memory_mb", "config.hardware.memoryMB"),
            col("overall_status", "overallStatus"),
        ],
        prune_missing: true,
    },
    ObjectTable {
        kind: "Datastore",
        table: "datastore",
        columns: &[
            col("object_name", "name"),
            col("capacity", "summary.capacity"),
            col("free_space", "summary.freeSpace"),
            col("accessible", "summary.accessible"),
            col("overall_status", "overallStatus"),
        ],
        prune_missing: true,
    },
    ObjectTable {
        kind: "HostQuickStats",
        table: "host_quick_stats",
        columns: &[
            col("overall_cpu_usage", "summary.quickStats.overallCpuUsage"),
            col("overall_memory_usage", "summary.quickStats.overallMemoryUsage"),
            col("uptime", "summary.quickStats.uptime"),
        ],
        prune_missing: false,
    },
    ObjectTable {
        kind: "VmQuickStats",
        table: "vm_quick_stats",
        columns: &[
            col("overall_cpu_usage", "summary.quickStats.overallCpuUsage"),
            col("guest_memory_usage", "summary.quickStats.guestMemoryUsage"),
            col("host_memory_usage", "summary.quickStats.hostMemoryUsage"),
            col("uptime_seconds", "summary.quickStats.uptimeSeconds"),
        ],
        prune_missing: false,
    },
];

/// Tables backing the built-in result kinds.
pub fn builtin_tables() -> &'static [ObjectTable] {
    BUILTIN_TABLES
}

/// Stores objects of one kind for one vCenter into an [`ObjectTable`].
pub struct ObjectSyncStore {
    vcenter: Arc<VCenter>,
    table: &'static ObjectTable,
    /// moref → checksum of the stored row, loaded on first use.
    known: Option<HashMap<String, String>>,
}

impl ObjectSyncStore {
    pub fn new(vcenter: Arc<VCenter>, table: &'static ObjectTable) -> Self {
        Self {
            vcenter,
            table,
            known: None,
        }
    }

    pub fn table(&self) -> &'static ObjectTable {
        self.table
    }

    /// Whether the stored checksums are currently loaded.
    pub fn has_loaded_state(&self) -> bool {
        self.known.is_some()
    }

    fn load_known(&mut self, db: &Db) -> SyncResult<&mut HashMap<String, String>> {
        if self.known.is_none() {
            let mut stmt = db.connection().prepare(&format!(
                "SELECT moref, checksum FROM {} WHERE vcenter_id = ?1",
                self.table.table
            ))?;
            let rows = stmt
                .query_map([self.vcenter.id.get()], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<HashMap<String, String>, _>>()?;
            debug!(
                "Loaded {} known {} objects for vCenter {}",
                rows.len(),
                self.table.kind,
                self.vcenter.id
            );
            self.known = Some(rows);
        }
        Ok(self.known.get_or_insert_with(HashMap::new))
    }
}

impl SyncStore for ObjectSyncStore {
    fn vcenter(&self) -> &VCenter {
        &self.vcenter
    }

    fn store(
        &mut self,
        db: &Db,
        batch: &ResultBatch,
        kind: &ResultKind,
        stats: &mut SyncStats,
    ) -> SyncResult<()> {
        let table = self.table;
        if kind.as_str() != table.kind {
            return Err(SyncError::Storage(format!(
                "{} store cannot handle {kind} results",
                table.kind
            )));
        }
        let vcenter_id = self.vcenter.id;
        let known = self.load_known(db)?;

        let mut seen = HashSet::new();
        for object in batch.objects() {
            if object.moref.is_empty() || !seen.insert(object.moref.as_str()) {
                warn!(
                    "Skipping {} object with missing or duplicate moref {:?}",
                    table.kind, object.moref
                );
                stats.inc_failed();
                continue;
            }

            let values = mapped_values(table, object);
            let checksum = checksum_of(&values);
            let unchanged = known.get(&object.moref).map(|stored| *stored == checksum);
            match unchanged {
                Some(true) => stats.inc_unchanged(),
                Some(false) => {
                    upsert_row(db, table, vcenter_id, &object.moref, &checksum, &values)?;
                    known.insert(object.moref.clone(), checksum);
                    stats.inc_updated();
                }
                None => {
                    upsert_row(db, table, vcenter_id, &object.moref, &checksum, &values)?;
                    known.insert(object.moref.clone(), checksum);
                    stats.inc_created();
                }
            }
        }

        if table.prune_missing {
            let gone: Vec<String> = known
                .keys()
                .filter(|moref| !seen.contains(moref.as_str()))
                .cloned()
                .collect();
            for moref in gone {
                delete_row(db, table, vcenter_id, &moref)?;
                known.remove(&moref);
                stats.inc_removed();
            }
        }

        Ok(())
    }

    fn forget_state(&mut self) {
        self.known = None;
    }
}

fn mapped_values<'a>(table: &ObjectTable, object: &'a ManagedObject) -> Vec<&'a Value> {
    table
        .columns
        .iter()
        .map(|column| object.property(column.property).unwrap_or(&NULL))
        .collect()
}

fn checksum_of(values: &[&Value]) -> String {
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(value.to_string().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn upsert_row(
    db: &Db,
    table: &ObjectTable,
    vcenter_id: VCenterId,
    moref: &str,
    checksum: &str,
    values: &[&Value],
) -> SyncResult<()> {
    let names: Vec<&str> = table.columns.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (4..4 + names.len()).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = std::iter::once("checksum")
        .chain(names.iter().copied())
        .map(|name| format!("{name} = excluded.{name}"))
        .collect();
    let sql = format!(
        "INSERT INTO {} (vcenter_id, moref, checksum{}{}) VALUES (?1, ?2, ?3{}{})
         ON CONFLICT (vcenter_id, moref) DO UPDATE SET {}",
        table.table,
        if names.is_empty() { "" } else { ", " },
        names.join(", "),
        if placeholders.is_empty() { "" } else { ", " },
        placeholders.join(", "),
        updates.join(", "),
    );

    let params = [
        SqlValue::Integer(i64::from(vcenter_id.get())),
        SqlValue::Text(moref.to_string()),
        SqlValue::Text(checksum.to_string()),
    ]
    .into_iter()
    .chain(values.iter().map(|value| sql_value(value)));
    db.connection().execute(&sql, params_from_iter(params))?;
    Ok(())
}

fn delete_row(db: &Db, table: &ObjectTable, vcenter_id: VCenterId, moref: &str) -> SyncResult<()> {
    db.connection().execute(
        &format!(
            "DELETE FROM {} WHERE vcenter_id = ?1 AND moref = ?2",
            table.table
        ),
        rusqlite::params![vcenter_id.get(), moref],
    )?;
    Ok(())
}
