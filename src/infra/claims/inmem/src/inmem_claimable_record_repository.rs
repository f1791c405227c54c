// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use claims::*;
use dill::*;

use crate::InMemoryChangeFeed;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryClaimableRecordRepository {
    state: Arc<Mutex<State>>,
    change_feed: Option<Arc<InMemoryChangeFeed>>,
}

#[derive(Default)]
struct State {
    records: HashMap<String, HashMap<RecordID, RecordSnapshot>>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn ClaimableRecordRepository)]
#[scope(Singleton)]
impl InMemoryClaimableRecordRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            change_feed: None,
        }
    }

    /// Publishes a change event to the feed after every write, the way a
    /// database trigger would
    pub fn with_change_feed(mut self, change_feed: Arc<InMemoryChangeFeed>) -> Self {
        self.change_feed = Some(change_feed);
        self
    }

    fn notify(&self, collection: &str, change_kind: ChangeKind, snapshot: RecordSnapshot) {
        if let Some(change_feed) = &self.change_feed {
            change_feed.publish(RecordChangeEvent::new(collection, change_kind, snapshot));
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl ClaimableRecordRepository for InMemoryClaimableRecordRepository {
    async fn save_record(
        &self,
        collection: &str,
        record: RecordSnapshot,
    ) -> Result<(), SaveRecordError> {
        let previous = {
            let mut guard = self.state.lock().unwrap();
            guard
                .records
                .entry(collection.to_string())
                .or_default()
                .insert(record.id.clone(), record.clone())
        };

        let change_kind = if previous.is_some() {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.notify(collection, change_kind, record);

        Ok(())
    }

    async fn get_record(
        &self,
        collection: &str,
        record_id: &RecordID,
    ) -> Result<Option<RecordSnapshot>, GetRecordError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .records
            .get(collection)
            .and_then(|records| records.get(record_id))
            .cloned())
    }

    async fn try_claim(
        &self,
        collection: &str,
        record_id: &RecordID,
        claimed_at: DateTime<Utc>,
    ) -> Result<Vec<RecordID>, TryClaimError> {
        let claimed = {
            let mut guard = self.state.lock().unwrap();
            match guard
                .records
                .get_mut(collection)
                .and_then(|records| records.get_mut(record_id))
            {
                Some(record) if record.claimed_at.is_none() => {
                    record.claimed_at = Some(claimed_at);
                    Some(record.clone())
                }
                _ => None,
            }
        };

        let Some(claimed) = claimed else {
            return Ok(vec![]);
        };

        let record_id = claimed.id.clone();
        self.notify(collection, ChangeKind::Update, claimed);

        Ok(vec![record_id])
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
