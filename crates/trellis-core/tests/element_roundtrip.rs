//! Serde roundtrip and JsonSchema validation tests for the element model.

use chrono::Utc;
use schemars::schema_for;
use trellis_core::element::{Edge, EdgeUpdate, Element, ElementPatch};
use trellis_core::ids::{ElementId, Namespace};

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            // Serde roundtrip
            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            // Schema validation
            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn id(raw: &str) -> ElementId {
    ElementId::parse(raw).unwrap()
}

roundtrip_and_validate!(
    element_roundtrip,
    Element,
    {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.name = "Engine".into();
        el.element_type = "Block".into();
        el.documentation = Some("Primary drive unit.".into());
        el.custom = serde_json::json!({"sku": "W-100"});
        el.created_by = Some("mallory".into());
        el.created_at = Some(Utc::now());
        el
    }
);

roundtrip_and_validate!(
    element_with_cross_project_edge_roundtrip,
    Element,
    {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.set_edge(Some(Edge {
            source: id("acme/gadgets/main/e9"),
            target: id("acme/widgets/main/e2"),
            source_namespace: Some(Namespace {
                org: "acme".into(),
                project: "gadgets".into(),
                branch: "main".into(),
            }),
            target_namespace: None,
        }));
        el
    }
);

roundtrip_and_validate!(
    root_element_roundtrip,
    Element,
    Element::root(id("acme/widgets/main/model"))
);

roundtrip_and_validate!(
    patch_roundtrip,
    ElementPatch,
    ElementPatch {
        name: Some("Engine".into()),
        parent: Some(id("acme/widgets/main/pkg1")),
        archived: Some(false),
        edge: Some(EdgeUpdate::Set(Edge {
            source: id("acme/widgets/main/e2"),
            target: id("acme/widgets/main/e3"),
            source_namespace: None,
            target_namespace: None,
        })),
        ..ElementPatch::default()
    }
);

#[test]
fn schema_rejects_malformed_id() {
    let schema = serde_json::to_value(schema_for!(Element)).unwrap();
    let invalid = serde_json::json!({
        "id": "not-a-composite-id",
        "parent": "acme/widgets/main/model"
    });
    let errors = validate_against_schema(&schema, &invalid);
    assert!(!errors.is_empty(), "Should reject id without four segments");
}

#[test]
fn schema_rejects_missing_id() {
    let schema = serde_json::to_value(schema_for!(Element)).unwrap();
    let invalid = serde_json::json!({ "name": "Engine" });
    let errors = validate_against_schema(&schema, &invalid);
    assert!(!errors.is_empty(), "Should reject element without 'id'");
}

#[test]
fn element_tolerates_stale_contains_on_input() {
    // The API layer may stamp a stale `contains`; the record must carry it
    // through deserialization unchanged (consumers recompute it).
    let raw = serde_json::json!({
        "id": "acme/widgets/main/pkg1",
        "parent": "acme/widgets/main/model",
        "contains": ["acme/widgets/main/gone"]
    });
    let el: Element = serde_json::from_value(raw).unwrap();
    assert_eq!(el.contains, vec![id("acme/widgets/main/gone")]);
}
