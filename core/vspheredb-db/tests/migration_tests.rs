use proptest::prelude::*;
use std::collections::BTreeSet;
use vspheredb_db::schema;
use vspheredb_db::{Db, DbConfig, DbError, Migration, Migrations, MIGRATION_TABLE};

fn open() -> Db {
    Db::open(&DbConfig::in_memory()).unwrap()
}

const FIVE_STEPS: &[Migration] = &[
    Migration::new(1, "one", "CREATE TABLE t1 (id INTEGER);"),
    Migration::new(2, "two", "CREATE TABLE t2 (id INTEGER);"),
    Migration::new(3, "three", "CREATE TABLE t3 (id INTEGER);"),
    Migration::new(4, "four", "CREATE TABLE t4 (id INTEGER);"),
    Migration::new(5, "five", "CREATE TABLE t5 (id INTEGER);"),
];

const BROKEN_AT_FOUR: &[Migration] = &[
    Migration::new(1, "one", "CREATE TABLE t1 (id INTEGER);"),
    Migration::new(2, "two", "CREATE TABLE t2 (id INTEGER);"),
    Migration::new(3, "three", "CREATE TABLE t3 (id INTEGER);"),
    Migration::new(4, "four", "CREATE TABLE t4 (id INTEGER"),
    Migration::new(5, "five", "CREATE TABLE t5 (id INTEGER);"),
];

// ── Schema detection ─────────────────────────────────────────────

#[test]
fn empty_store_has_no_schema_and_no_tables() {
    let db = open();
    let migrations = Migrations::for_db(&db);
    assert!(!migrations.has_schema().unwrap());
    assert!(!migrations.has_any_table().unwrap());
    assert_eq!(migrations.current_version().unwrap(), 0);
}

#[test]
fn foreign_tables_are_detected() {
    let db = open();
    db.connection()
        .execute_batch("CREATE TABLE invoices (id INTEGER); INSERT INTO invoices VALUES (1);")
        .unwrap();
    let migrations = Migrations::for_db(&db);
    assert!(!migrations.has_schema().unwrap());
    assert!(migrations.has_any_table().unwrap());
}

// ── Pending set ──────────────────────────────────────────────────

#[test]
fn everything_pending_on_empty_store() {
    let db = open();
    let migrations = Migrations::for_db(&db);
    assert!(migrations.has_pending_migrations().unwrap());
    let versions: Vec<u32> = migrations
        .pending()
        .unwrap()
        .iter()
        .map(|m| m.version)
        .collect();
    assert_eq!(versions, vec![1, 2, 3, 4, 5]);
}

#[test]
fn pending_is_sorted_even_if_sequence_is_not() {
    let db = open();
    let shuffled = [FIVE_STEPS[3], FIVE_STEPS[0], FIVE_STEPS[4], FIVE_STEPS[1]];
    let migrations = Migrations::new(&db, &shuffled);
    let versions: Vec<u32> = migrations
        .pending()
        .unwrap()
        .iter()
        .map(|m| m.version)
        .collect();
    assert_eq!(versions, vec![1, 2, 4, 5]);
}

// ── Application ──────────────────────────────────────────────────

#[test]
fn apply_builtin_schema() {
    let db = open();
    let migrations = Migrations::for_db(&db);
    let applied = migrations.apply_pending().unwrap();

    assert_eq!(applied, vec![1, 2, 3, 4, 5]);
    assert!(migrations.has_schema().unwrap());
    assert!(!migrations.has_pending_migrations().unwrap());
    assert_eq!(migrations.current_version().unwrap(), schema::target_version());
    for table in schema::VCENTER_SCOPED_TABLES {
        assert!(db.has_table(table).unwrap(), "missing table {table}");
    }
}

#[test]
fn applying_twice_is_a_noop() {
    let db = open();
    Migrations::for_db(&db).apply_pending().unwrap();
    let second = Migrations::for_db(&db).apply_pending().unwrap();
    assert!(second.is_empty());

    let markers: i64 = db
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {MIGRATION_TABLE}"), [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(markers, 5);
}

#[test]
fn only_missing_versions_are_applied() {
    let db = open();
    Migrations::new(&db, &FIVE_STEPS[..2]).apply_pending().unwrap();

    let migrations = Migrations::new(&db, FIVE_STEPS);
    assert_eq!(migrations.current_version().unwrap(), 2);
    assert_eq!(migrations.apply_pending().unwrap(), vec![3, 4, 5]);
    assert_eq!(migrations.current_version().unwrap(), 5);
}

#[test]
fn failure_stops_sequence_and_keeps_earlier_versions() {
    let db = open();
    Migrations::new(&db, &BROKEN_AT_FOUR[..2]).apply_pending().unwrap();

    let migrations = Migrations::new(&db, BROKEN_AT_FOUR);
    let err = migrations.apply_pending().unwrap_err();
    match err {
        DbError::Migration { version, name, .. } => {
            assert_eq!(version, 4);
            assert_eq!(name, "four");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(migrations.current_version().unwrap(), 3);
    assert!(db.has_table("t3").unwrap());
    assert!(!db.has_table("t4").unwrap());
    assert!(!db.has_table("t5").unwrap());
    assert_eq!(
        migrations.applied_versions().unwrap(),
        BTreeSet::from([1, 2, 3])
    );
}

#[test]
fn failing_first_migration_leaves_no_marker_table() {
    let db = open();
    let broken = [Migration::new(1, "broken", "CREATE TABLE (")];
    let migrations = Migrations::new(&db, &broken);
    assert!(migrations.apply_pending().is_err());
    assert!(!migrations.has_schema().unwrap());
    assert!(db.table_names().unwrap().is_empty());
}

proptest! {
    #[test]
    fn pending_excludes_applied_and_ascends(applied_count in 0usize..=5) {
        let db = open();
        Migrations::new(&db, &FIVE_STEPS[..applied_count]).apply_pending().unwrap();

        let migrations = Migrations::new(&db, FIVE_STEPS);
        let pending: Vec<u32> = migrations.pending().unwrap().iter().map(|m| m.version).collect();
        let expected: Vec<u32> = ((applied_count as u32 + 1)..=5).collect();
        prop_assert_eq!(pending, expected);
        prop_assert_eq!(migrations.current_version().unwrap(), applied_count as u32);
    }
}
