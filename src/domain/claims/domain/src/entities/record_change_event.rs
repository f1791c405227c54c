// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{ChangeKind, RecordSnapshot};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A single change notification. The same logical change may be delivered
/// more than once.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordChangeEvent {
    pub collection: String,
    pub change_kind: ChangeKind,
    pub new: RecordSnapshot,
}

impl RecordChangeEvent {
    pub fn new(collection: impl Into<String>, change_kind: ChangeKind, new: RecordSnapshot) -> Self {
        Self {
            collection: collection.into(),
            change_kind,
            new,
        }
    }

    pub fn update(collection: impl Into<String>, new: RecordSnapshot) -> Self {
        Self::new(collection, ChangeKind::Update, new)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
