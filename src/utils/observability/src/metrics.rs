// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Implemented by components that own prometheus collectors
pub trait MetricsProvider: Send + Sync {
    fn register(&self, reg: &prometheus::Registry) -> prometheus::Result<()>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Collects all [`MetricsProvider`]s from the catalog into a fresh registry
pub fn register_all(catalog: &dill::Catalog) -> prometheus::Result<prometheus::Registry> {
    let registry = prometheus::Registry::new();

    let providers = catalog
        .get::<dill::AllOf<dyn MetricsProvider>>()
        .map_err(|e| prometheus::Error::Msg(e.to_string()))?;

    for provider in providers {
        provider.register(&registry)?;
    }

    Ok(registry)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Renders the registry in prometheus text exposition format
pub async fn metrics_handler(State(registry): State<prometheus::Registry>) -> impl IntoResponse {
    match prometheus::TextEncoder::new().encode_to_string(&registry.gather()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        ),
        Err(e) => {
            ::tracing::error!(error = ?e, error_msg = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
                String::new(),
            )
        }
    }
}
