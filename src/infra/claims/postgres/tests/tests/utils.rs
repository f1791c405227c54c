// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use claims_postgres::PostgresClaimsConfig;
use sqlx::PgPool;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Creates the tables used by the store test suite, with change
/// notifications attached
pub(crate) async fn create_test_tables(pool: &PgPool) {
    sqlx::raw_sql(
        r#"
        CREATE TABLE orders (
            id TEXT PRIMARY KEY,
            status TEXT,
            claimed_at TIMESTAMPTZ,
            customer TEXT,
            total BIGINT
        );

        CREATE TABLE invoices (LIKE orders INCLUDING ALL);

        CREATE TRIGGER orders_notify_record_change
            AFTER INSERT OR UPDATE OR DELETE ON orders
            FOR EACH ROW EXECUTE FUNCTION claims_notify_record_change('record_changes');

        CREATE TRIGGER invoices_notify_record_change
            AFTER INSERT OR UPDATE OR DELETE ON invoices
            FOR EACH ROW EXECUTE FUNCTION claims_notify_record_change('record_changes');
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
}

pub(crate) fn test_config() -> PostgresClaimsConfig {
    PostgresClaimsConfig::default()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
