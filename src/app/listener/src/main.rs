// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use clap::Parser as _;

#[tokio::main]
async fn main() {
    let args = claims_listener::Cli::parse();

    if let Err(e) = claims_listener::run(args).await {
        tracing::error!(error = ?e, error_msg = %e, "Listener failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
