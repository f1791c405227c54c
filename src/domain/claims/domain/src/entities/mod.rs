// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod change_kind;
mod claimed_record;
mod record_change_event;
mod record_id;
mod record_schema;
mod record_snapshot;

pub use change_kind::*;
pub use claimed_record::*;
pub use record_change_event::*;
pub use record_id::*;
pub use record_schema::*;
pub use record_snapshot::*;
