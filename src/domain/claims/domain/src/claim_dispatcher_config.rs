// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::num::NonZeroUsize;

use chrono::SecondsFormat;

use serde_json::{Map, Value};

use crate::{RecordSchema, RecordSnapshot};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct ClaimDispatcherConfig {
    /// Table or collection whose update notifications are consumed
    pub collection: String,

    /// Status a record must have in the notification to be claimed
    pub target_status: String,

    pub schema: RecordSchema,

    /// Fields passed to the downstream handler. Empty means all fields.
    pub payload_fields: Vec<String>,

    /// Limit of notifications processed concurrently. Unbounded if not set.
    pub max_concurrent_events: Option<NonZeroUsize>,
}

impl ClaimDispatcherConfig {
    pub fn new(collection: impl Into<String>, target_status: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            target_status: target_status.into(),
            schema: RecordSchema::default(),
            payload_fields: Vec::new(),
            max_concurrent_events: None,
        }
    }

    /// Picks the configured payload fields out of a snapshot. Fields missing
    /// from the snapshot are left out.
    pub fn select_payload(&self, snapshot: &RecordSnapshot) -> Map<String, Value> {
        if self.payload_fields.is_empty() {
            return snapshot.fields.clone();
        }

        let mut payload = Map::new();
        for name in &self.payload_fields {
            let value = if *name == self.schema.id_field {
                Some(Value::String(snapshot.id.to_string()))
            } else if *name == self.schema.status_field {
                snapshot.status.clone().map(Value::String)
            } else if *name == self.schema.claim_field {
                snapshot
                    .claimed_at
                    .map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            } else {
                snapshot.fields.get(name).cloned()
            };

            if let Some(value) = value {
                payload.insert(name.clone(), value);
            }
        }
        payload
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
