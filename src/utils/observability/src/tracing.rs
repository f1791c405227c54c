// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Creates an `INFO`-level span that is detached from the current one.
///
/// Use it for units of work that outlive the caller, like handling of a
/// single notification in a spawned task, so they appear as separate traces.
#[doc(hidden)]
#[macro_export]
macro_rules! __root_span {
    ($name:expr) => {
        ::tracing::info_span!(parent: None, $name)
    };
    ($name:expr, $($field:tt)+) => {
        ::tracing::info_span!(parent: None, $name, $($field)+)
    };
}

pub use crate::__root_span as root_span;
