// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use claims::{ClaimedRecord, ClaimedRecordHandler};
use dill::*;
use internal_error::{InternalError, ResultIntoInternal};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const HEADER_CLAIM_COLLECTION: &str = "x-claim-collection";
pub const HEADER_CLAIM_RECORD_ID: &str = "x-claim-record-id";
pub const HEADER_CLAIM_TIMESTAMP: &str = "x-claim-timestamp";

pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct WebhookHandlerConfig {
    pub target_url: url::Url,
    pub timeout: Duration,
    pub bearer_token: Option<String>,
}

impl WebhookHandlerConfig {
    pub fn new(target_url: url::Url) -> Self {
        Self {
            target_url,
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
            bearer_token: None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// POSTs every claimed record as JSON to the configured endpoint. Any
/// non-success status is a handler failure.
pub struct WebhookClaimedRecordHandler {
    config: Arc<WebhookHandlerConfig>,
}

#[component(pub)]
#[interface(dyn ClaimedRecordHandler)]
impl WebhookClaimedRecordHandler {
    pub fn new(config: Arc<WebhookHandlerConfig>) -> Self {
        Self { config }
    }

    fn get_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .timeout(self.config.timeout)
            .build()
    }

    pub fn build_request(
        &self,
        client: &reqwest::Client,
        record: &ClaimedRecord,
    ) -> Result<reqwest::Request, InternalError> {
        let mut request = client
            .post(self.config.target_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(HEADER_CLAIM_COLLECTION, record.collection.as_str())
            .header(HEADER_CLAIM_RECORD_ID, record.record_id.as_str())
            .header(HEADER_CLAIM_TIMESTAMP, record.claimed_at.to_rfc3339())
            .json(record);

        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        request.build().int_err()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl ClaimedRecordHandler for WebhookClaimedRecordHandler {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            collection = %record.collection,
            record_id = %record.record_id,
            target_url = %self.config.target_url,
        )
    )]
    async fn handle_claimed_record(&self, record: ClaimedRecord) -> Result<(), InternalError> {
        let client = self.get_client().int_err()?;
        let request = self.build_request(&client, &record)?;

        let response = client
            .execute(request)
            .await
            .int_err()?
            .error_for_status()
            .int_err()?;

        tracing::debug!(status = %response.status(), "Claimed record delivered");

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
