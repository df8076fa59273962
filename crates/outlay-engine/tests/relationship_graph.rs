//! End-to-end relationship management: config-driven edge building,
//! constraint enforcement, and chain traversal.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use outlay_core::config::EntityConfig;
use outlay_engine::RelationshipManager;
use outlay_engine::relationships::{AddOutcome, RejectReason};

fn manager() -> RelationshipManager {
    let entities: BTreeMap<String, EntityConfig> = serde_yaml::from_str(
        r"
recipient:
  relationships:
    hierarchical:
      - type: HAS_SUBSIDIARY
        inverse_type: SUBSIDIARY_OF
        from_level: parent
        to_level: child
    flat:
      - type: LOCATED_IN
        from_field: recipient_key
        to_field: location_key
        rules:
          exclusive: true
award:
  relationships:
    flat:
      - type: AWARDED_TO
        inverse_type: RECEIVED
        from_field: award_key
        to_field: recipient_key
        rules:
          max_cardinality: 3
",
    )
    .expect("config parses");
    RelationshipManager::from_config(&entities)
}

fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn records_build_a_queryable_graph() {
    let mut m = manager();

    m.process_hierarchical_relationships(&obj(json!({
        "parent": "megacorp",
        "child": "subsidiary-a",
    })));
    m.process_flat_relationships(&obj(json!({
        "award_key": "AWD-1",
        "recipient_key": "subsidiary-a",
        "location_key": "denver",
    })));

    assert_eq!(m.related_entities("megacorp", "HAS_SUBSIDIARY"), ["subsidiary-a"]);
    assert_eq!(m.related_entities("subsidiary-a", "SUBSIDIARY_OF"), ["megacorp"]);
    assert_eq!(m.related_entities("AWD-1", "AWARDED_TO"), ["subsidiary-a"]);
    assert_eq!(m.related_entities("subsidiary-a", "RECEIVED"), ["AWD-1"]);
    assert_eq!(m.related_entities("subsidiary-a", "LOCATED_IN"), ["denver"]);

    let all = m.all_relationships("subsidiary-a");
    let types: Vec<&str> = all.iter().map(|(ty, _)| *ty).collect();
    assert_eq!(types, ["LOCATED_IN", "RECEIVED", "SUBSIDIARY_OF"]);
}

#[test]
fn deep_hierarchy_cycle_is_rejected() {
    let mut m = manager();
    for (parent, child) in [("a", "b"), ("b", "c"), ("c", "d")] {
        assert_eq!(
            m.add_relationship(parent, "HAS_SUBSIDIARY", child),
            AddOutcome::Added
        );
    }

    assert_eq!(
        m.add_relationship("d", "HAS_SUBSIDIARY", "a"),
        AddOutcome::Rejected(RejectReason::WouldCreateCycle)
    );
    // Diamonds are fine: two parents sharing a descendant is not a
    // cycle.
    assert_eq!(m.add_relationship("a", "HAS_SUBSIDIARY", "c"), AddOutcome::Added);
}

#[test]
fn exclusive_location_keeps_first_writer() {
    let mut m = manager();
    m.process_flat_relationships(&obj(json!({
        "recipient_key": "r1",
        "location_key": "denver",
    })));
    let summary = m.process_flat_relationships(&obj(json!({
        "recipient_key": "r1",
        "location_key": "boulder",
    })));

    assert_eq!(summary.rejected, 1);
    assert_eq!(m.related_entities("r1", "LOCATED_IN"), ["denver"]);
}

#[test]
fn cardinality_cap_applies_across_records() {
    let mut m = manager();
    for recipient in ["r1", "r2", "r3"] {
        let summary = m.process_flat_relationships(&obj(json!({
            "award_key": "AWD-9",
            "recipient_key": recipient,
        })));
        assert_eq!(summary.added, 1);
    }

    let summary = m.process_flat_relationships(&obj(json!({
        "award_key": "AWD-9",
        "recipient_key": "r4",
    })));
    assert_eq!(summary.rejected, 1);
    assert_eq!(m.related_entities("AWD-9", "AWARDED_TO").len(), 3);
}

#[test]
fn chain_walks_across_relationship_types() {
    let mut m = manager();
    m.process_hierarchical_relationships(&obj(json!({
        "parent": "megacorp",
        "child": "sub-a",
    })));
    m.process_hierarchical_relationships(&obj(json!({
        "parent": "megacorp",
        "child": "sub-b",
    })));
    m.process_flat_relationships(&obj(json!({
        "recipient_key": ["sub-a", "sub-b"],
        "location_key": "denver",
    })));

    let path = vec!["HAS_SUBSIDIARY".to_string(), "LOCATED_IN".to_string()];
    let reached: Vec<String> = m.relationship_chain("megacorp", &path).collect();

    // Both subsidiaries, then denver once per route.
    assert_eq!(reached, ["sub-a", "sub-b", "denver", "denver"]);
}

#[test]
fn chain_is_lazy_per_hop() {
    let mut m = manager();
    m.process_hierarchical_relationships(&obj(json!({
        "parent": "megacorp",
        "child": "sub-a",
    })));
    m.process_flat_relationships(&obj(json!({
        "recipient_key": "sub-a",
        "location_key": "denver",
    })));

    let path = vec!["HAS_SUBSIDIARY".to_string(), "LOCATED_IN".to_string()];
    let mut chain = m.relationship_chain("megacorp", &path);
    assert_eq!(chain.next().as_deref(), Some("sub-a"));
    assert_eq!(chain.next().as_deref(), Some("denver"));
    assert_eq!(chain.next(), None);
}
