use super::*;
use std::collections::HashSet;

#[test]
fn display_joins_with_colons() {
    let p = ControlPath::root("live")
        .layer("a")
        .item("b")
        .effect_param("fx1", "value");
    assert_eq!(p.to_string(), "live:layer_a:item_b:effects:fx1:value");
}

#[test]
fn structurally_distinct_paths_do_not_collide() {
    // Same display string, different shape.
    let a = ControlPath::from_segments(["live", "a:b"]);
    let b = ControlPath::from_segments(["live", "a", "b"]);
    assert_eq!(a.to_string(), b.to_string());
    assert_ne!(a, b);

    let set: HashSet<_> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn parse_and_prefix_checks() {
    let p = ControlPath::parse("live:item_x:h");
    assert_eq!(p.segments(), &["live", "item_x", "h"]);
    assert!(p.starts_with(&ControlPath::parse("live:item_x")));
    assert!(!p.starts_with(&ControlPath::parse("ready")));
    assert!(ControlPath::parse("").is_empty());
}

#[test]
fn with_root_swaps_side() {
    let p = ControlPath::parse("ready:layer_a");
    assert_eq!(p.with_root("live").to_string(), "live:layer_a");
}

#[test]
fn serde_accepts_string_or_segments() {
    let a: ControlPath = serde_json::from_str("\"live:layer_a\"").unwrap();
    let b: ControlPath = serde_json::from_str("[\"live\", \"layer_a\"]").unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_string(&a).unwrap(), "\"live:layer_a\"");
}
