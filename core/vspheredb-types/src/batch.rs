//! Raw result batches delivered by the poller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single managed object as fetched from the vSphere API.
///
/// Properties are keyed by their full property path, the way a
/// `RetrievePropertiesEx` result flattens them (`summary.hardware.numCpuCores`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedObject {
    /// Managed object reference, unique within one vCenter (`host-12`, `vm-1043`).
    #[serde(rename = "obj")]
    pub moref: String,
    /// Property path to raw value.
    #[serde(default, rename = "propSet")]
    pub properties: Map<String, Value>,
}

impl ManagedObject {
    /// Creates an object without properties.
    pub fn new(moref: impl Into<String>) -> Self {
        Self {
            moref: moref.into(),
            properties: Map::new(),
        }
    }

    /// Adds a property, builder style.
    pub fn with_property(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(path.into(), value.into());
        self
    }

    /// Looks up a property by path.
    pub fn property(&self, path: &str) -> Option<&Value> {
        self.properties.get(path)
    }
}

/// One result batch, as handed over by a sync task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultBatch {
    objects: Vec<ManagedObject>,
}

impl ResultBatch {
    /// Creates a batch from the given objects.
    pub fn new(objects: Vec<ManagedObject>) -> Self {
        Self { objects }
    }

    /// Parses a batch from its JSON wire form.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the objects of this batch.
    pub fn objects(&self) -> &[ManagedObject] {
        &self.objects
    }

    /// Number of objects in the batch.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the batch carries no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<ManagedObject> for ResultBatch {
    fn from_iter<I: IntoIterator<Item = ManagedObject>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
