// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use claims::RecordSchema;
use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_DB_SCHEMA: &str = "public";
pub const DEFAULT_NOTIFY_CHANNEL: &str = "record_changes";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Where claimable records live and how their changes are announced.
/// Collections map to tables of the same name in [`Self::db_schema`].
#[derive(Debug, Clone)]
pub struct PostgresClaimsConfig {
    pub db_schema: String,
    pub record_schema: RecordSchema,
    pub id_sql_type: RecordIdSqlType,
    /// Channel the `claims_notify_record_change` trigger publishes to
    pub notify_channel: String,
}

impl PostgresClaimsConfig {
    pub(crate) fn table_ref(&self, collection: &str) -> String {
        format!("{}.{}", quote_ident(&self.db_schema), quote_ident(collection))
    }
}

impl Default for PostgresClaimsConfig {
    fn default() -> Self {
        Self {
            db_schema: DEFAULT_DB_SCHEMA.to_string(),
            record_schema: RecordSchema::default(),
            id_sql_type: RecordIdSqlType::default(),
            notify_channel: DEFAULT_NOTIFY_CHANNEL.to_string(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Column type of the record identifier. Identifiers travel as text and
/// are cast back so that lookups can use the primary key index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordIdSqlType {
    #[default]
    Text,
    Uuid,
    Integer,
    BigInt,
}

impl RecordIdSqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Uuid => "UUID",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
