// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_ID_FIELD: &str = "id";
pub const DEFAULT_STATUS_FIELD: &str = "status";
pub const DEFAULT_CLAIM_FIELD: &str = "claimed_at";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Names of the fields that carry the claim protocol state, both in change
/// notifications and in the backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub id_field: String,
    pub status_field: String,
    /// Nullable timestamp: null means unclaimed
    pub claim_field: String,
}

impl RecordSchema {
    pub fn new(
        id_field: impl Into<String>,
        status_field: impl Into<String>,
        claim_field: impl Into<String>,
    ) -> Self {
        Self {
            id_field: id_field.into(),
            status_field: status_field.into(),
            claim_field: claim_field.into(),
        }
    }

    pub fn is_protocol_field(&self, name: &str) -> bool {
        name == self.id_field || name == self.status_field || name == self.claim_field
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD, DEFAULT_STATUS_FIELD, DEFAULT_CLAIM_FIELD)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
