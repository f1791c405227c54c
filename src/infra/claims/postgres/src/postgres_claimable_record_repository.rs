// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use claims::*;
use dill::*;
use internal_error::{ErrorIntoInternal, ResultIntoInternal};
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::{PostgresClaimsConfig, quote_ident};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Stores records as rows of the table named after the collection. Record
/// fields map to columns of the same name.
pub struct PostgresClaimableRecordRepository {
    pool: Arc<PgPool>,
    config: Arc<PostgresClaimsConfig>,
}

#[component(pub)]
#[interface(dyn ClaimableRecordRepository)]
impl PostgresClaimableRecordRepository {
    pub fn new(pool: Arc<PgPool>, config: Arc<PostgresClaimsConfig>) -> Self {
        Self { pool, config }
    }

    fn id_column(&self) -> String {
        quote_ident(&self.config.record_schema.id_field)
    }

    fn claim_column(&self) -> String {
        quote_ident(&self.config.record_schema.claim_field)
    }

    fn id_param(&self, index: usize) -> String {
        format!("CAST(${index} AS {})", self.config.id_sql_type.as_sql())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl ClaimableRecordRepository for PostgresClaimableRecordRepository {
    #[tracing::instrument(level = "debug", skip_all, fields(%collection, record_id = %record.id))]
    async fn save_record(
        &self,
        collection: &str,
        record: RecordSnapshot,
    ) -> Result<(), SaveRecordError> {
        let schema = &self.config.record_schema;
        let table = self.config.table_ref(collection);
        let id_column = self.id_column();

        let columns: Vec<String> = [
            &schema.id_field,
            &schema.status_field,
            &schema.claim_field,
        ]
        .into_iter()
        .chain(record.fields.keys())
        .map(|name| quote_ident(name))
        .collect();
        let column_list = columns.join(", ");
        let assignments = columns
            .iter()
            .filter(|column| **column != id_column)
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"
            INSERT INTO {table} ({column_list})
                SELECT {column_list} FROM jsonb_populate_record(NULL::{table}, $1)
                ON CONFLICT ({id_column}) DO UPDATE SET {assignments}
            "#
        );

        sqlx::query(&sql)
            .bind(record.to_json(schema))
            .execute(&*self.pool)
            .await
            .int_err()?;

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(%collection, %record_id))]
    async fn get_record(
        &self,
        collection: &str,
        record_id: &RecordID,
    ) -> Result<Option<RecordSnapshot>, GetRecordError> {
        let sql = format!(
            r#"
            SELECT to_jsonb(t) AS record FROM {table} AS t
                WHERE t.{id_column} = {id_param}
            "#,
            table = self.config.table_ref(collection),
            id_column = self.id_column(),
            id_param = self.id_param(1),
        );

        let maybe_row = sqlx::query(&sql)
            .bind(record_id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .int_err()?;

        let Some(row) = maybe_row else {
            return Ok(None);
        };

        let value: Value = row.try_get("record").int_err()?;
        let snapshot = RecordSnapshot::from_json(&self.config.record_schema, &value).int_err()?;

        Ok(Some(snapshot))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(%collection, %record_id))]
    async fn try_claim(
        &self,
        collection: &str,
        record_id: &RecordID,
        claimed_at: DateTime<Utc>,
    ) -> Result<Vec<RecordID>, TryClaimError> {
        // Single conditional statement: concurrent claims serialize on the row
        // lock and the losers see a non-null claim on re-check
        let sql = format!(
            r#"
            UPDATE {table} SET {claim_column} = $1
                WHERE {id_column} = {id_param} AND {claim_column} IS NULL
                RETURNING {id_column}::TEXT AS id
            "#,
            table = self.config.table_ref(collection),
            claim_column = self.claim_column(),
            id_column = self.id_column(),
            id_param = self.id_param(2),
        );

        let rows = sqlx::query(&sql)
            .bind(claimed_at)
            .bind(record_id.as_str())
            .fetch_all(&*self.pool)
            .await
            .int_err()?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("id")
                    .map(RecordID::new)
                    .map_err(|e| TryClaimError::Internal(e.int_err()))
            })
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
