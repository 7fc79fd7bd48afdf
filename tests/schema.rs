use serde_json::json;
use shop_probe::schema::{FieldKind, ORDER_SCHEMA, SchemaFinding, check_order, print_assumptions};

#[test]
fn well_formed_order_has_no_findings() {
    let order = json!({
        "id": 10,
        "user_id": 3,
        "items": "[{\"id\":1,\"quantity\":1}]",
        "total_amount": 25.5,
        "status": "paid"
    });
    assert!(check_order(&order).is_empty());
}

#[test]
fn status_may_be_left_to_its_default() {
    let order = json!({
        "id": 10,
        "user_id": 3,
        "items": [],
        "total_amount": "0"
    });
    assert!(check_order(&order).is_empty());
}

#[test]
fn missing_and_mistyped_fields_are_flagged() {
    let order = json!({
        "id": "abc",
        "items": "{}",
        "total_amount": true
    });
    let findings = check_order(&order);

    assert!(findings.contains(&SchemaFinding::WrongKind {
        field: "id",
        expected: FieldKind::Integer,
        found: "string".into(),
    }));
    assert!(findings.contains(&SchemaFinding::MissingField("user_id")));
    assert!(
        findings
            .iter()
            .any(|f| matches!(f, SchemaFinding::ItemsNotJson(_)))
    );
    assert!(findings.contains(&SchemaFinding::WrongKind {
        field: "total_amount",
        expected: FieldKind::Number,
        found: "boolean".into(),
    }));
    assert!(findings.iter().all(|f| !f.is_warning()));
}

#[test]
fn non_objects_are_rejected_outright() {
    assert_eq!(check_order(&json!([1, 2])), vec![SchemaFinding::NotAnObject]);
    assert_eq!(check_order(&json!(null)), vec![SchemaFinding::NotAnObject]);
}

#[test]
fn assumptions_list_every_column() {
    let table = print_assumptions();
    for column in ORDER_SCHEMA {
        assert!(table.contains(column.name), "missing {}", column.name);
    }
    assert!(table.contains("default \"pending\""));
}
