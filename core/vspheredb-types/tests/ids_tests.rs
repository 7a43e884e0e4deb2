use std::collections::HashSet;
use std::str::FromStr;
use vspheredb_types::{ResultKind, VCenterId};

// ── VCenterId ─────────────────────────────────────────────────────

#[test]
fn vcenter_id_raw_value() {
    let id = VCenterId::new(7);
    assert_eq!(id.get(), 7);
    assert_eq!(VCenterId::from(7), id);
}

#[test]
fn vcenter_id_display_and_parse() {
    let id = VCenterId::new(42);
    assert_eq!(id.to_string(), "42");
    assert_eq!(VCenterId::from_str("42").unwrap(), id);
    assert_eq!(VCenterId::from_str(" 42 ").unwrap(), id);
}

#[test]
fn vcenter_id_parse_invalid() {
    assert!(VCenterId::from_str("vc-1").is_err());
    assert!(VCenterId::from_str("-1").is_err());
    assert!(VCenterId::from_str("").is_err());
}

#[test]
fn vcenter_id_serializes_as_number() {
    let json = serde_json::to_string(&VCenterId::new(3)).unwrap();
    assert_eq!(json, "3");
    let parsed: VCenterId = serde_json::from_str("3").unwrap();
    assert_eq!(parsed, VCenterId::new(3));
}

// ── ResultKind ────────────────────────────────────────────────────

#[test]
fn result_kind_parse() {
    let kind = ResultKind::parse("HostSystem").unwrap();
    assert_eq!(kind.as_str(), "HostSystem");
    assert_eq!(kind.to_string(), "HostSystem");
    assert_eq!(kind, ResultKind::from_static("HostSystem"));
}

#[test]
fn result_kind_rejects_empty_and_whitespace() {
    assert!(ResultKind::parse("").is_err());
    assert!(ResultKind::parse("Host System").is_err());
    assert!("\tVm".parse::<ResultKind>().is_err());
}

#[test]
fn result_kind_hash_and_eq() {
    let mut set = HashSet::new();
    set.insert(ResultKind::from_static("Datastore"));
    set.insert(ResultKind::parse("Datastore").unwrap());
    set.insert(ResultKind::from_static("VirtualMachine"));
    assert_eq!(set.len(), 2);
}

#[test]
fn result_kind_serializes_as_string() {
    let json = serde_json::to_string(&ResultKind::from_static("VmQuickStats")).unwrap();
    assert_eq!(json, "\"VmQuickStats\"");
}
