// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use claims::*;
use time_source::SystemTimeSource;

use crate::ClaimDispatcherMetrics;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Filter, claim and dispatch steps for a single change notification.
///
/// Shared between the tasks spawned per notification. Holds no mutable
/// state: exclusivity is decided by the store.
pub struct ClaimProcessor {
    record_repo: Arc<dyn ClaimableRecordRepository>,
    handler: Arc<dyn ClaimedRecordHandler>,
    time_source: Arc<dyn SystemTimeSource>,
    config: Arc<ClaimDispatcherConfig>,
    metrics: Arc<ClaimDispatcherMetrics>,
}

impl ClaimProcessor {
    pub fn new(
        record_repo: Arc<dyn ClaimableRecordRepository>,
        handler: Arc<dyn ClaimedRecordHandler>,
        time_source: Arc<dyn SystemTimeSource>,
        config: Arc<ClaimDispatcherConfig>,
        metrics: Arc<ClaimDispatcherMetrics>,
    ) -> Self {
        Self {
            record_repo,
            handler,
            time_source,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &ClaimDispatcherConfig {
        &self.config
    }

    fn collection(&self) -> &str {
        &self.config.collection
    }

    fn filter(&self, event: &RecordChangeEvent) -> Option<FilterReason> {
        if event.collection != self.config.collection {
            Some(FilterReason::CollectionMismatch)
        } else if event.change_kind != ChangeKind::Update {
            Some(FilterReason::ChangeKindMismatch)
        } else if !event.new.has_status(&self.config.target_status) {
            Some(FilterReason::StatusMismatch)
        } else if event.new.is_claimed() {
            Some(FilterReason::AlreadyClaimed)
        } else {
            None
        }
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            collection = %self.config.collection,
            record_id = %event.new.id,
        )
    )]
    pub async fn handle_event(&self, event: RecordChangeEvent) -> EventOutcome {
        self.metrics
            .events_received_total
            .with_label_values(&[self.collection()])
            .inc();

        if let Some(reason) = self.filter(&event) {
            tracing::debug!(?reason, status = ?event.new.status, "Notification filtered out");
            self.metrics
                .events_filtered_total
                .with_label_values(&[self.collection(), filter_reason_label(reason)])
                .inc();
            return EventOutcome::Filtered(reason);
        }

        let claimed_at = self.time_source.now();

        let claimed_ids = match self
            .record_repo
            .try_claim(self.collection(), &event.new.id, claimed_at)
            .await
        {
            Ok(claimed_ids) => claimed_ids,
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    error_msg = %e,
                    "Claim attempt failed, notification dropped"
                );
                self.metrics
                    .claim_errors_total
                    .with_label_values(&[self.collection()])
                    .inc();
                return EventOutcome::ClaimFailed;
            }
        };

        match claimed_ids.len() {
            0 => {
                // Expected when duplicates race: someone else got there first
                tracing::debug!("Record already claimed by another observer");
                self.metrics
                    .claims_lost_total
                    .with_label_values(&[self.collection()])
                    .inc();
                return EventOutcome::ClaimLost;
            }
            1 => {}
            num_claimed => {
                tracing::error!(
                    num_claimed,
                    ?claimed_ids,
                    "Claim matched more than one record, identifier is not unique"
                );
                self.metrics
                    .claim_errors_total
                    .with_label_values(&[self.collection()])
                    .inc();
                return EventOutcome::ClaimFailed;
            }
        }

        self.metrics
            .claims_won_total
            .with_label_values(&[self.collection()])
            .inc();

        let claimed_record = ClaimedRecord {
            collection: self.config.collection.clone(),
            record_id: event.new.id.clone(),
            status: self.config.target_status.clone(),
            claimed_at,
            fields: self
                .config
                .select_payload(&event.new.clone().with_claimed_at(claimed_at)),
        };

        tracing::info!(%claimed_at, "Record claimed, invoking handler");

        match self
            .handler
            .handle_claimed_record(claimed_record.clone())
            .await
        {
            Ok(()) => {
                tracing::debug!("Handler finished");
                EventOutcome::Dispatched
            }
            Err(e) => {
                // Claim is committed and is never rolled back: the record is
                // reported here for manual replay
                tracing::error!(
                    error = ?e,
                    error_msg = %e,
                    ?claimed_record,
                    "Handler failed for claimed record"
                );
                self.metrics
                    .handler_failures_total
                    .with_label_values(&[self.collection()])
                    .inc();
                EventOutcome::HandlerFailed
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn filter_reason_label(reason: FilterReason) -> &'static str {
    match reason {
        FilterReason::CollectionMismatch => "collection_mismatch",
        FilterReason::ChangeKindMismatch => "change_kind_mismatch",
        FilterReason::StatusMismatch => "status_mismatch",
        FilterReason::AlreadyClaimed => "already_claimed",
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
