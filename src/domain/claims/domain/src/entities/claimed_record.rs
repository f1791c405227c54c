// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::RecordID;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Payload handed to the downstream handler once a record was claimed by
/// this process
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedRecord {
    pub collection: String,
    pub record_id: RecordID,
    pub status: String,
    pub claimed_at: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
