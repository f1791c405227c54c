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

fn placed_order() -> RecordSnapshot {
    RecordSnapshot::new("O1", "Placed")
        .with_field("v_id", 17)
        .with_field("user_order_id", "U-100")
        .with_field("notes", "leave at the door")
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_empty_payload_fields_select_everything() {
    let config = ClaimDispatcherConfig::new("orders", "Placed");

    let payload = config.select_payload(&placed_order());

    assert_eq!(
        serde_json::Value::Object(payload),
        json!({"v_id": 17, "user_order_id": "U-100", "notes": "leave at the door"})
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_selected_payload_fields() {
    let config = ClaimDispatcherConfig {
        schema: RecordSchema::new("order_id", "status", "wa_message_created_ts"),
        payload_fields: vec![
            "order_id".to_string(),
            "v_id".to_string(),
            "user_order_id".to_string(),
            "missing".to_string(),
        ],
        ..ClaimDispatcherConfig::new("orders", "Placed")
    };

    let payload = config.select_payload(&placed_order());

    assert_eq!(
        serde_json::Value::Object(payload),
        json!({"order_id": "O1", "v_id": 17, "user_order_id": "U-100"})
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_claim_field_is_selectable() {
    let config = ClaimDispatcherConfig {
        schema: RecordSchema::new("order_id", "status", "wa_message_created_ts"),
        payload_fields: vec![
            "order_id".to_string(),
            "wa_message_created_ts".to_string(),
        ],
        ..ClaimDispatcherConfig::new("orders", "Placed")
    };

    let claimed_at = Utc.with_ymd_and_hms(2050, 1, 1, 12, 0, 0).unwrap();
    let payload = config.select_payload(&placed_order().with_claimed_at(claimed_at));

    assert_eq!(
        serde_json::Value::Object(payload),
        json!({"order_id": "O1", "wa_message_created_ts": "2050-01-01T12:00:00Z"})
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
