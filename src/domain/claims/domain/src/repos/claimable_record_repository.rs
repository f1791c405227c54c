// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use internal_error::InternalError;

use crate::{RecordID, RecordSnapshot};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait ClaimableRecordRepository: Send + Sync {
    /// Inserts the record or replaces its status, claim and fields
    async fn save_record(
        &self,
        collection: &str,
        record: RecordSnapshot,
    ) -> Result<(), SaveRecordError>;

    async fn get_record(
        &self,
        collection: &str,
        record_id: &RecordID,
    ) -> Result<Option<RecordSnapshot>, GetRecordError>;

    /// Atomically sets the claim timestamp of the record, but only if it is
    /// still unset. Returns identifiers of the records that were updated: a
    /// single one if this call won the claim, none if the record is already
    /// claimed or does not exist.
    async fn try_claim(
        &self,
        collection: &str,
        record_id: &RecordID,
        claimed_at: DateTime<Utc>,
    ) -> Result<Vec<RecordID>, TryClaimError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum SaveRecordError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum GetRecordError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum TryClaimError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
