// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use dill::*;
use observability::metrics::MetricsProvider;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const CLAIMS_METRICS_PREFIX: &str = "claims";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct ClaimDispatcherMetrics {
    pub events_received_total: prometheus::IntCounterVec,
    pub events_filtered_total: prometheus::IntCounterVec,
    pub claims_won_total: prometheus::IntCounterVec,
    pub claims_lost_total: prometheus::IntCounterVec,
    pub claim_errors_total: prometheus::IntCounterVec,
    pub handler_failures_total: prometheus::IntCounterVec,
}

#[component(pub)]
#[interface(dyn MetricsProvider)]
#[scope(Singleton)]
impl ClaimDispatcherMetrics {
    pub fn new() -> Self {
        use prometheus::*;

        let counter = |name: &str, help: &str, labels: &[&str]| {
            IntCounterVec::new(
                Opts::new(format!("{CLAIMS_METRICS_PREFIX}_{name}"), help),
                labels,
            )
            .unwrap()
        };

        Self {
            events_received_total: counter(
                "events_received_total",
                "Number of change notifications received by collection",
                &["collection"],
            ),
            events_filtered_total: counter(
                "events_filtered_total",
                "Number of change notifications dropped before a claim attempt by collection and reason",
                &["collection", "reason"],
            ),
            claims_won_total: counter(
                "claims_won_total",
                "Number of records claimed by this process by collection",
                &["collection"],
            ),
            claims_lost_total: counter(
                "claims_lost_total",
                "Number of claim attempts that found the record already claimed by collection",
                &["collection"],
            ),
            claim_errors_total: counter(
                "claim_errors_total",
                "Number of claim attempts that failed in the store by collection",
                &["collection"],
            ),
            handler_failures_total: counter(
                "handler_failures_total",
                "Number of claimed records whose handler failed by collection",
                &["collection"],
            ),
        }
    }
}

impl MetricsProvider for ClaimDispatcherMetrics {
    fn register(&self, reg: &prometheus::Registry) -> prometheus::Result<()> {
        reg.register(Box::new(self.events_received_total.clone()))?;
        reg.register(Box::new(self.events_filtered_total.clone()))?;
        reg.register(Box::new(self.claims_won_total.clone()))?;
        reg.register(Box::new(self.claims_lost_total.clone()))?;
        reg.register(Box::new(self.claim_errors_total.clone()))?;
        reg.register(Box::new(self.handler_failures_total.clone()))?;

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
