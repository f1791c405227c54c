// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use claims::{ClaimedRecord, ClaimedRecordHandler};
use dill::*;
use internal_error::{InternalError, ResultIntoInternal};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Handler that only writes claimed records to the log. Useful for dry runs
/// against a live database.
pub struct LoggingClaimedRecordHandler {}

#[component(pub)]
#[interface(dyn ClaimedRecordHandler)]
#[scope(Singleton)]
impl LoggingClaimedRecordHandler {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait::async_trait]
impl ClaimedRecordHandler for LoggingClaimedRecordHandler {
    async fn handle_claimed_record(&self, record: ClaimedRecord) -> Result<(), InternalError> {
        let payload = serde_json::to_string(&record).int_err()?;

        tracing::info!(
            collection = %record.collection,
            record_id = %record.record_id,
            %payload,
            "Claimed record"
        );

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
