// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{TimeZone, Utc};
use claims::*;
use serde_json::json;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn orders_schema() -> RecordSchema {
    RecordSchema::new("order_id", "status", "wa_message_created_ts")
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_decode_unclaimed_row() {
    let snapshot = RecordSnapshot::from_json(
        &orders_schema(),
        &json!({
            "order_id": "O1",
            "status": "Placed",
            "wa_message_created_ts": null,
            "v_id": 17,
            "user_order_id": "U-100",
        }),
    )
    .unwrap();

    assert_eq!(snapshot.id, RecordID::new("O1"));
    assert_eq!(snapshot.status.as_deref(), Some("Placed"));
    assert!(!snapshot.is_claimed());
    assert_eq!(
        serde_json::Value::Object(snapshot.fields),
        json!({"v_id": 17, "user_order_id": "U-100"})
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_decode_numeric_id_and_missing_optional_fields() {
    let snapshot =
        RecordSnapshot::from_json(&RecordSchema::default(), &json!({"id": 42})).unwrap();

    assert_eq!(snapshot.id.as_str(), "42");
    assert_eq!(snapshot.status, None);
    assert_eq!(snapshot.claimed_at, None);
    assert!(snapshot.fields.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_decode_claim_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2050, 1, 2, 3, 4, 5).unwrap();

    for ts in [
        "2050-01-02T03:04:05Z",
        "2050-01-02T03:04:05+00:00",
        "2050-01-02T03:04:05+00",
        "2050-01-02T05:04:05+02:00",
        "2050-01-02T03:04:05",
    ] {
        let snapshot = RecordSnapshot::from_json(
            &RecordSchema::default(),
            &json!({"id": "O3", "status": "Placed", "claimed_at": ts}),
        )
        .unwrap();

        assert_eq!(snapshot.claimed_at, Some(expected), "{ts}");
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_decode_errors() {
    let schema = orders_schema();

    assert_eq!(
        RecordSnapshot::from_json(&schema, &json!(["O1"])),
        Err(DecodeSnapshotError::NotAnObject)
    );
    assert_eq!(
        RecordSnapshot::from_json(&schema, &json!({"status": "Placed"})),
        Err(DecodeSnapshotError::MissingField {
            field: "order_id".to_string()
        })
    );
    assert_eq!(
        RecordSnapshot::from_json(&schema, &json!({"order_id": "O1", "status": 5})),
        Err(DecodeSnapshotError::InvalidField {
            field: "status".to_string(),
            expected: "string"
        })
    );
    assert_eq!(
        RecordSnapshot::from_json(
            &schema,
            &json!({"order_id": "O1", "wa_message_created_ts": "yesterday"})
        ),
        Err(DecodeSnapshotError::InvalidField {
            field: "wa_message_created_ts".to_string(),
            expected: "timestamp"
        })
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_to_json_is_decodable() {
    let schema = orders_schema();
    let snapshot = RecordSnapshot::new("O9", "Placed")
        .with_claimed_at(Utc.with_ymd_and_hms(2050, 1, 1, 0, 0, 0).unwrap())
        .with_field("v_id", 3);

    let value = snapshot.to_json(&schema);
    assert_eq!(value["order_id"], json!("O9"));
    assert_eq!(value["v_id"], json!(3));

    assert_eq!(RecordSnapshot::from_json(&schema, &value).unwrap(), snapshot);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_change_kind_parsing() {
    assert_eq!("UPDATE".parse::<ChangeKind>(), Ok(ChangeKind::Update));
    assert_eq!("insert".parse::<ChangeKind>(), Ok(ChangeKind::Insert));
    assert_eq!(ChangeKind::Delete.to_string(), "DELETE");
    assert_eq!(
        "TRUNCATE".parse::<ChangeKind>(),
        Err(UnknownChangeKindError {
            value: "TRUNCATE".to_string()
        })
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
