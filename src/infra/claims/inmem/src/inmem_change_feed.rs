// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use claims::*;
use dill::*;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_CHANGE_FEED_CAPACITY: usize = 1024;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Process-local change feed. Every subscriber receives every published
/// event matching its collection and change kind. Subscribers that fall
/// behind by more than the channel capacity lose the oldest events.
/// Clones publish to the same subscribers.
#[derive(Clone)]
pub struct InMemoryChangeFeed {
    tx: broadcast::Sender<RecordChangeEvent>,
}

#[component(pub)]
#[interface(dyn ChangeFeed)]
#[scope(Singleton)]
impl InMemoryChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANGE_FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Delivers an event to all current subscribers. Returns the number of
    /// subscriptions that will see it.
    pub fn publish(&self, event: RecordChangeEvent) -> usize {
        // No subscribers is not an error for a notification transport
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl ChangeFeed for InMemoryChangeFeed {
    async fn subscribe(
        &self,
        collection: &str,
        change_kind: ChangeKind,
    ) -> Result<RecordChangeStream, SubscribeError> {
        let collection = collection.to_string();

        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(move |res| {
            let event = match res {
                Ok(event) if event.collection == collection && event.change_kind == change_kind => {
                    Some(event)
                }
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, %collection, "Change feed subscriber lagged behind");
                    None
                }
            };
            futures::future::ready(event)
        });

        Ok(Box::pin(stream))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
