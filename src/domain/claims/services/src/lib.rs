// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod claim_dispatcher_impl;
mod claim_dispatcher_metrics;
mod claim_processor;
mod logging_claimed_record_handler;

pub use claim_dispatcher_impl::*;
pub use claim_dispatcher_metrics::*;
pub use claim_processor::*;
pub use logging_claimed_record_handler::*;
