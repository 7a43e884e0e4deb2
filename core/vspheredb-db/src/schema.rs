//! Built-in vSphereDB schema.
//!
//! Object tables are keyed by `(vcenter_id, moref)` and carry a `checksum`
//! column the sync stores use to detect modifications.

use crate::migration::Migration;

/// Tables whose rows belong to a single vCenter.
pub const VCENTER_SCOPED_TABLES: &[&str] = &[
    "vcenter_server",
    "host_system",
    "virtual_machine",
    "datastore",
    "host_quick_stats",
    "vm_quick_stats",
];

/// Quick stats tables and the object table their rows hang off.
pub const QUICK_STATS_PARENTS: &[(&str, &str)] = &[
    ("host_quick_stats", "host_system"),
    ("vm_quick_stats", "virtual_machine"),
];

const MIGRATIONS: &[Migration] = &[
    Migration::new(
        1,
        "vcenter",
        "CREATE TABLE vcenter (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instance_uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            api_type TEXT NOT NULL DEFAULT 'VirtualCenter',
            api_version TEXT
        );
        CREATE TABLE vcenter_server (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vcenter_id INTEGER,
            host TEXT NOT NULL,
            username TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1
        );",
    ),
    Migration::new(
        2,
        "host_system",
        "CREATE TABLE host_system (
            vcenter_id INTEGER NOT NULL,
            moref TEXT NOT NULL,
            checksum TEXT NOT NULL,
            host_name TEXT,
            hardware_uuid TEXT,
            cpu_cores INTEGER,
            memory_size INTEGER,
            overall_status TEXT,
            PRIMARY KEY (vcenter_id, moref)
        );",
    ),
    Migration::new(
        3,
        "virtual_machine",
        "CREATE TABLE virtual_machine (
            vcenter_id INTEGER NOT NULL,
            moref TEXT NOT NULL,
            checksum TEXT NOT NULL,
            object_name TEXT,
            guest_host_name TEXT,
            power_state TEXT,
            runtime_host TEXT,
            memory_mb INTEGER,
            overall_status TEXT,
            PRIMARY KEY (vcenter_id, moref)
        );",
    ),
    Migration::new(
        4,
        "datastore",
        "CREATE TABLE datastore (
            vcenter_id INTEGER NOT NULL,
            moref TEXT NOT NULL,
            checksum TEXT NOT NULL,
            object_name TEXT,
            capacity INTEGER,
            free_space INTEGER,
            accessible INTEGER,
            overall_status TEXT,
            PRIMARY KEY (vcenter_id, moref)
        );",
    ),
    Migration::new(
        5,
        "quick_stats",
        "CREATE TABLE host_quick_stats (
            vcenter_id INTEGER NOT NULL,
            moref TEXT NOT NULL,
            checksum TEXT NOT NULL,
            overall_cpu_usage INTEGER,
            overall_memory_usage INTEGER,
            uptime INTEGER,
            PRIMARY KEY (vcenter_id, moref)
        );
        CREATE TABLE vm_quick_stats (
            vcenter_id INTEGER NOT NULL,
            moref TEXT NOT NULL,
            checksum TEXT NOT NULL,
            overall_cpu_usage INTEGER,
            guest_memory_usage INTEGER,
            host_memory_usage INTEGER,
            uptime_seconds INTEGER,
            PRIMARY KEY (vcenter_id, moref)
        );",
    ),
];

/// The full known migration sequence, in version order.
pub fn migrations() -> &'static [Migration] {
    MIGRATIONS
}

/// Version the built-in schema ends at.
pub fn target_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}
