// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::{RecordID, RecordSchema};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// State of a record at some point in time: as carried by a change
/// notification, or as held by a store
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSnapshot {
    pub id: RecordID,
    pub status: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    /// All other fields of the record
    pub fields: Map<String, Value>,
}

impl RecordSnapshot {
    pub fn new(id: impl Into<RecordID>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: Some(status.into()),
            claimed_at: None,
            fields: Map::new(),
        }
    }

    pub fn with_claimed_at(mut self, claimed_at: DateTime<Utc>) -> Self {
        self.claimed_at = Some(claimed_at);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_at.is_some()
    }

    pub fn has_status(&self, status: &str) -> bool {
        self.status.as_deref() == Some(status)
    }

    /// Decodes a row-shaped JSON object, as emitted by change notification
    /// transports, into a snapshot
    pub fn from_json(schema: &RecordSchema, value: &Value) -> Result<Self, DecodeSnapshotError> {
        let Value::Object(object) = value else {
            return Err(DecodeSnapshotError::NotAnObject);
        };

        let id = match object.get(&schema.id_field) {
            Some(Value::String(s)) => RecordID::new(s.as_str()),
            Some(Value::Number(n)) => RecordID::new(n.to_string()),
            Some(Value::Null) | None => {
                return Err(DecodeSnapshotError::MissingField {
                    field: schema.id_field.clone(),
                });
            }
            Some(_) => return Err(DecodeSnapshotError::invalid(&schema.id_field, "string or number")),
        };

        let status = match object.get(&schema.status_field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(_) => return Err(DecodeSnapshotError::invalid(&schema.status_field, "string")),
        };

        let claimed_at = match object.get(&schema.claim_field) {
            Some(Value::String(s)) => Some(
                parse_timestamp(s)
                    .ok_or_else(|| DecodeSnapshotError::invalid(&schema.claim_field, "timestamp"))?,
            ),
            Some(Value::Null) | None => None,
            Some(_) => return Err(DecodeSnapshotError::invalid(&schema.claim_field, "timestamp")),
        };

        let fields = object
            .iter()
            .filter(|(name, _)| !schema.is_protocol_field(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            id,
            status,
            claimed_at,
            fields,
        })
    }

    /// Inverse of [`RecordSnapshot::from_json`]
    pub fn to_json(&self, schema: &RecordSchema) -> Value {
        let mut object = self.fields.clone();
        object.insert(schema.id_field.clone(), Value::String(self.id.to_string()));
        object.insert(
            schema.status_field.clone(),
            self.status.clone().map_or(Value::Null, Value::String),
        );
        object.insert(
            schema.claim_field.clone(),
            self.claimed_at
                .map_or(Value::Null, |t| Value::String(t.to_rfc3339())),
        );
        Value::Object(object)
    }
}

// Accepts RFC 3339 and the zone-less ISO format of `timestamp` columns
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }

    // Postgres renders offsets as "+00" which is not valid RFC 3339
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Some(t.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DecodeSnapshotError {
    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Record has no '{field}' field")]
    MissingField { field: String },

    #[error("Record field '{field}' is not a valid {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
}

impl DecodeSnapshotError {
    fn invalid(field: &str, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            expected,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
