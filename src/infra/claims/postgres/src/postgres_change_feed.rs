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

use claims::*;
use dill::*;
use internal_error::ResultIntoInternal;
use sqlx::PgPool;
use sqlx::postgres::PgListener;

use crate::{PostgresClaimableRecordRepository, PostgresClaimsConfig, decode_change_notification};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Change feed over LISTEN/NOTIFY. Each subscription holds a dedicated
/// connection that reconnects on failure, so the stream never ends on its
/// own. Notifications sent while the connection is down are lost.
pub struct PostgresChangeFeed {
    pool: Arc<PgPool>,
    config: Arc<PostgresClaimsConfig>,
}

#[component(pub)]
#[interface(dyn ChangeFeed)]
impl PostgresChangeFeed {
    pub fn new(pool: Arc<PgPool>, config: Arc<PostgresClaimsConfig>) -> Self {
        Self { pool, config }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl ChangeFeed for PostgresChangeFeed {
    #[tracing::instrument(level = "debug", skip_all, fields(%collection, %change_kind))]
    async fn subscribe(
        &self,
        collection: &str,
        change_kind: ChangeKind,
    ) -> Result<RecordChangeStream, SubscribeError> {
        let mut subscription = ListenerSubscription {
            listener: None,
            pool: self.pool.clone(),
            config: self.config.clone(),
            record_repo: PostgresClaimableRecordRepository::new(
                self.pool.clone(),
                self.config.clone(),
            ),
            collection: collection.to_string(),
            change_kind,
        };

        // Failing to connect initially is reported to the caller
        subscription.listener = Some(subscription.connect().await.int_err()?);

        tracing::info!(
            channel = %self.config.notify_channel,
            "Listening for record changes"
        );

        let stream = futures::stream::unfold(subscription, |mut subscription| async move {
            let event = subscription.next_event().await;
            Some((event, subscription))
        });

        Ok(Box::pin(stream))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct ListenerSubscription {
    listener: Option<PgListener>,
    pool: Arc<PgPool>,
    config: Arc<PostgresClaimsConfig>,
    record_repo: PostgresClaimableRecordRepository,
    collection: String,
    change_kind: ChangeKind,
}

impl ListenerSubscription {
    async fn connect(&self) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.config.notify_channel).await?;
        Ok(listener)
    }

    async fn next_event(&mut self) -> RecordChangeEvent {
        loop {
            if self.listener.is_none() {
                match self.connect().await {
                    Ok(listener) => {
                        tracing::info!("Change listener reconnected");
                        self.listener = Some(listener);
                    }
                    Err(e) => {
                        tracing::error!(
                            error = ?e,
                            error_msg = %e,
                            "Failed to reconnect change listener, will retry after delay",
                        );
                        tokio::time::sleep(LISTENER_RETRY_DELAY).await;
                        continue;
                    }
                }
            }

            let Some(listener) = self.listener.as_mut() else {
                continue;
            };

            match listener.recv().await {
                Ok(notification) => {
                    if let Some(event) = self.resolve(notification.payload()).await {
                        return event;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = ?e,
                        error_msg = %e,
                        "Change listener connection error, will reconnect after delay",
                    );
                    self.listener = None;
                    tokio::time::sleep(LISTENER_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn resolve(&self, payload: &str) -> Option<RecordChangeEvent> {
        let notification = match decode_change_notification(&self.config.record_schema, payload) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    error_msg = %e,
                    payload,
                    "Skipping undecodable change notification",
                );
                return None;
            }
        };

        if notification.db_schema != self.config.db_schema
            || notification.event.collection != self.collection
            || notification.event.change_kind != self.change_kind
        {
            return None;
        }

        if !notification.truncated || notification.event.change_kind == ChangeKind::Delete {
            return Some(notification.event);
        }

        let event = notification.event;
        match self
            .record_repo
            .get_record(&self.collection, &event.new.id)
            .await
        {
            Ok(Some(snapshot)) => Some(RecordChangeEvent::new(
                event.collection,
                event.change_kind,
                snapshot,
            )),
            Ok(None) => {
                tracing::debug!(
                    record_id = %event.new.id,
                    "Record of a truncated notification no longer exists"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    error_msg = %e,
                    record_id = %event.new.id,
                    "Failed to read record of a truncated notification",
                );
                None
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
