//! Identifier types used throughout the sync backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Numeric identifier of a vCenter (or standalone ESXi host) row.
///
/// Matches the auto-increment id of the `vcenter` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VCenterId(u32);

impl VCenterId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for VCenterId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for VCenterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VCenterId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| Error::InvalidVCenterId(s.to_string()))
    }
}

/// Kind of result a sync task produces, e.g. `HostSystem` or `VmQuickStats`.
///
/// The kind selects the store that persists a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultKind(String);

impl ResultKind {
    /// Creates a result kind, rejecting empty or whitespace-containing names.
    pub fn parse(name: &str) -> Result<Self, Error> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidResultKind(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// Creates a result kind from a known-good static name.
    #[must_use]
    pub fn from_static(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// Returns the kind name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResultKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
