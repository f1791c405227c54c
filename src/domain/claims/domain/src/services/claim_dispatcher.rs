// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{RecordChangeEvent, SubscribeError};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Consumes update notifications of a collection and performs the handler
/// side effect exactly once per record reaching the target status.
///
/// Exclusivity comes from the conditional write in the store, so any number
/// of dispatchers, in one or many processes, may consume the same feed.
#[async_trait::async_trait]
pub trait ClaimDispatcher: Send + Sync {
    /// Subscribes to the feed and starts processing notifications in the
    /// background. Calling it on a running dispatcher does nothing.
    async fn start(&self) -> Result<StartOutcome, StartError>;

    /// Drops the subscription and waits for notifications in flight
    async fn stop(&self);

    async fn is_running(&self) -> bool;

    /// Processes a single notification: filter, claim, dispatch.
    /// Never fails: all errors are logged and reported via the outcome.
    async fn handle_event(&self, event: RecordChangeEvent) -> EventOutcome;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Dropped before any store access
    Filtered(FilterReason),
    /// Another observer claimed the record first
    ClaimLost,
    /// The store failed, the record is left unclaimed
    ClaimFailed,
    /// Claimed and the handler succeeded
    Dispatched,
    /// Claimed but the handler failed. The claim stays committed.
    HandlerFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// Notification is about another collection
    CollectionMismatch,
    /// Only updates are claimed
    ChangeKindMismatch,
    StatusMismatch,
    AlreadyClaimed,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum StartError {
    #[error(transparent)]
    Subscribe(#[from] SubscribeError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
