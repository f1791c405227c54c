// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use dill::{component, interface, scope, Singleton};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Abstraction of the wall clock, so that components stamping records with
/// the current time can be tested deterministically
pub trait SystemTimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct SystemTimeSourceDefault {}

#[component(pub)]
#[interface(dyn SystemTimeSource)]
#[scope(Singleton)]
impl SystemTimeSourceDefault {
    pub fn new() -> Self {
        Self {}
    }
}

impl SystemTimeSource for SystemTimeSourceDefault {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct SystemTimeSourceStub {
    t: Arc<Mutex<DateTime<Utc>>>,
}

impl SystemTimeSourceStub {
    pub fn new_set(t: DateTime<Utc>) -> Self {
        Self {
            t: Arc::new(Mutex::new(t)),
        }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        *self.t.lock().unwrap() = t;
    }

    pub fn advance(&self, d: Duration) {
        let mut t = self.t.lock().unwrap();
        *t += d;
    }
}

impl SystemTimeSource for SystemTimeSourceStub {
    fn now(&self) -> DateTime<Utc> {
        *self.t.lock().unwrap()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
