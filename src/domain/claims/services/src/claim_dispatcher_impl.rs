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
use dill::*;
use futures::StreamExt;
use observability::tracing::root_span;
use time_source::SystemTimeSource;
use tokio::sync::{Mutex, Semaphore, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::Instrument as _;

use crate::{ClaimDispatcherMetrics, ClaimProcessor};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct ClaimDispatcherImpl {
    processor: Arc<ClaimProcessor>,
    change_feed: Arc<dyn ChangeFeed>,
    state: Mutex<Option<RunningSubscription>>,
}

struct RunningSubscription {
    shutdown_tx: oneshot::Sender<()>,
    pump: JoinHandle<()>,
}

impl RunningSubscription {
    fn is_active(&self) -> bool {
        !self.pump.is_finished()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn ClaimDispatcher)]
#[scope(Singleton)]
impl ClaimDispatcherImpl {
    pub fn new(
        change_feed: Arc<dyn ChangeFeed>,
        record_repo: Arc<dyn ClaimableRecordRepository>,
        handler: Arc<dyn ClaimedRecordHandler>,
        time_source: Arc<dyn SystemTimeSource>,
        config: Arc<ClaimDispatcherConfig>,
        metrics: Arc<ClaimDispatcherMetrics>,
    ) -> Self {
        Self {
            processor: Arc::new(ClaimProcessor::new(
                record_repo,
                handler,
                time_source,
                config,
                metrics,
            )),
            change_feed,
            state: Mutex::new(None),
        }
    }

    async fn run_pump(
        processor: Arc<ClaimProcessor>,
        mut stream: RecordChangeStream,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let limiter = processor
            .config()
            .max_concurrent_events
            .map(|max| Arc::new(Semaphore::new(max.get())));

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::debug!("Shutdown requested");
                    break;
                }
                maybe_event = stream.next() => {
                    let Some(event) = maybe_event else {
                        tracing::warn!("Change feed closed the subscription");
                        break;
                    };

                    let permit = match &limiter {
                        Some(limiter) => match limiter.clone().acquire_owned().await {
                            Ok(permit) => Some(permit),
                            Err(_) => break,
                        },
                        None => None,
                    };

                    let span = root_span!(
                        "ClaimDispatcher::handle_event",
                        collection = %event.collection,
                        record_id = %event.new.id
                    );

                    let processor = processor.clone();
                    in_flight.spawn(
                        async move {
                            let outcome = processor.handle_event(event).await;
                            tracing::debug!(?outcome, "Notification processed");
                            drop(permit);
                        }
                        .instrument(span),
                    );
                }
                Some(res) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_task_result(res);
                }
            }
        }

        // Stream is dropped first so the transport can release the subscription
        drop(stream);

        while let Some(res) = in_flight.join_next().await {
            log_task_result(res);
        }

        tracing::info!("Claim dispatcher stopped");
    }
}

fn log_task_result(res: Result<(), tokio::task::JoinError>) {
    if let Err(e) = res {
        tracing::error!(error = ?e, error_msg = %e, "Notification task panicked");
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl ClaimDispatcher for ClaimDispatcherImpl {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(collection = %self.processor.config().collection)
    )]
    async fn start(&self) -> Result<StartOutcome, StartError> {
        let mut state = self.state.lock().await;

        if state.as_ref().is_some_and(RunningSubscription::is_active) {
            tracing::warn!("Claim dispatcher is already running, ignoring start request");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let config = self.processor.config();
        let stream = self
            .change_feed
            .subscribe(&config.collection, ChangeKind::Update)
            .await?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let pump = tokio::spawn(
            Self::run_pump(self.processor.clone(), stream, shutdown_rx).instrument(root_span!(
                "ClaimDispatcher::pump",
                collection = %config.collection
            )),
        );

        *state = Some(RunningSubscription { shutdown_tx, pump });

        tracing::info!(
            target_status = %config.target_status,
            max_concurrent_events = ?config.max_concurrent_events,
            "Claim dispatcher started"
        );

        Ok(StartOutcome::Started)
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(collection = %self.processor.config().collection)
    )]
    async fn stop(&self) {
        let mut state = self.state.lock().await;

        let Some(running) = state.take() else {
            tracing::debug!("Claim dispatcher is not running");
            return;
        };

        // Pump may have exited on its own already
        let _ = running.shutdown_tx.send(());

        if let Err(e) = running.pump.await {
            tracing::error!(error = ?e, error_msg = %e, "Claim dispatcher pump panicked");
        }
    }

    async fn is_running(&self) -> bool {
        self.state
            .lock()
            .await
            .as_ref()
            .is_some_and(RunningSubscription::is_active)
    }

    async fn handle_event(&self, event: RecordChangeEvent) -> EventOutcome {
        self.processor.handle_event(event).await
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
