// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use claims::*;
use serde::Deserialize;
use serde_json::Value;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Decoded payload of the `claims_notify_record_change` trigger
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    pub db_schema: String,
    pub event: RecordChangeEvent,
    /// Row did not fit into a notification and was sent without its long
    /// values. Only the identifier is reliable.
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ChangeNotificationPayload {
    schema: String,
    table: String,
    #[serde(rename = "type")]
    change_kind: String,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
    #[serde(default)]
    truncated: bool,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Parses a NOTIFY payload of the form
/// `{"schema", "table", "type", "record", "old_record"}`.
///
/// Deletions carry the removed row in `old_record`, which then becomes the
/// snapshot of the event.
pub fn decode_change_notification(
    record_schema: &RecordSchema,
    payload: &str,
) -> Result<ChangeNotification, DecodeChangeNotificationError> {
    let payload: ChangeNotificationPayload = serde_json::from_str(payload)?;
    let change_kind: ChangeKind = payload.change_kind.parse()?;

    let row = match change_kind {
        ChangeKind::Insert | ChangeKind::Update => payload.record,
        ChangeKind::Delete => payload.old_record,
    };
    let row = match row {
        Some(row) if !row.is_null() => row,
        _ => return Err(DecodeChangeNotificationError::MissingRecord { change_kind }),
    };

    let snapshot = RecordSnapshot::from_json(record_schema, &row)?;

    Ok(ChangeNotification {
        db_schema: payload.schema,
        event: RecordChangeEvent::new(payload.table, change_kind, snapshot),
        truncated: payload.truncated,
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum DecodeChangeNotificationError {
    #[error("Malformed notification payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    UnknownChangeKind(#[from] UnknownChangeKindError),

    #[error("{change_kind} notification carries no record")]
    MissingRecord { change_kind: ChangeKind },

    #[error(transparent)]
    Snapshot(#[from] DecodeSnapshotError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
