// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod postgres_change_feed;
mod postgres_change_notification;
mod postgres_claimable_record_repository;
mod postgres_claims_config;

pub use postgres_change_feed::*;
pub use postgres_change_notification::*;
pub use postgres_claimable_record_repository::*;
pub use postgres_claims_config::*;
