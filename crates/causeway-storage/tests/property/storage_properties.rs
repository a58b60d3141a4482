//! Property tests: stored payloads verify against the checksum written with
//! them, whatever the change set holds.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::Value;

use causeway_core::checksum;
use causeway_core::models::payload::TaskUpdated;
use causeway_core::models::InsertOutcome;
use causeway_core::traits::ILedgerStorage;
use causeway_core::EventPayload;
use causeway_storage::StorageEngine;
use test_fixtures::new_event;

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("json numbers are finite", |f| f.is_finite())
            .prop_map(Value::from),
        "[a-zA-Z0-9 é]{0,12}".prop_map(Value::from),
    ]
}

fn change_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn untouched_rows_always_verify(
        changes in prop::collection::btree_map("[a-z_]{1,10}", change_value(), 1..5),
    ) {
        let engine = StorageEngine::open_in_memory().unwrap();
        let payload = EventPayload::TaskUpdated(TaskUpdated {
            task_id: "task-1".into(),
            changes,
        });
        let event = new_event("trace-p", 1, payload.clone());
        let record = match engine.insert_event(&event).unwrap() {
            InsertOutcome::Inserted(record) => record,
            InsertOutcome::KeyExists(record) => panic!("unexpected existing record {}", record.id),
        };

        prop_assert_eq!(engine.verify_stored_checksum(record.id).unwrap(), Some(true));
        let stored = engine.get_event(record.id).unwrap().unwrap();
        prop_assert_eq!(&stored.payload, &payload);
        prop_assert!(checksum::verify(&stored).unwrap());
    }
}

#[test]
fn tiny_float_row_verifies() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut changes = BTreeMap::new();
    changes.insert("estimate".to_string(), Value::from(1.0715660391465826e-75_f64));
    let payload = EventPayload::TaskUpdated(TaskUpdated {
        task_id: "task-1".into(),
        changes,
    });
    let id = match engine.insert_event(&new_event("trace-f", 1, payload)).unwrap() {
        InsertOutcome::Inserted(record) => record.id,
        InsertOutcome::KeyExists(record) => record.id,
    };
    assert_eq!(engine.verify_stored_checksum(id).unwrap(), Some(true));
}
