// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::pin::Pin;

use futures::Stream;
use internal_error::InternalError;

use crate::{ChangeKind, RecordChangeEvent};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type RecordChangeStream = Pin<Box<dyn Stream<Item = RecordChangeEvent> + Send>>;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Transport delivering change notifications at least once. Notifications
/// may be duplicated, and may arrive out of order across records.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Subscribes to changes of the given kind in a collection. The
    /// subscription lasts until the returned stream is dropped.
    async fn subscribe(
        &self,
        collection: &str,
        change_kind: ChangeKind,
    ) -> Result<RecordChangeStream, SubscribeError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum SubscribeError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
