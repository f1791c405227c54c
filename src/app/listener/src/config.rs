// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use claims::{
    ClaimDispatcherConfig,
    DEFAULT_CLAIM_FIELD,
    DEFAULT_ID_FIELD,
    DEFAULT_STATUS_FIELD,
    RecordSchema,
};
use claims_adapter_webhook::{DEFAULT_WEBHOOK_TIMEOUT, WebhookHandlerConfig};
use claims_postgres::{
    DEFAULT_DB_SCHEMA,
    DEFAULT_NOTIFY_CHANNEL,
    PostgresClaimsConfig,
    RecordIdSqlType,
};
use duration_string::DurationString;
use observability::init::{DEFAULT_LOGGING_FILTER, LogFormat, LoggingConfig};
use serde::{Deserialize, Deserializer};

use crate::ConfigError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListenerConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub handler: HandlerConfig,

    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ListenerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatcher.collection.is_empty() {
            return Err(ConfigError::invalid("dispatcher.collection must not be empty"));
        }
        if self.dispatcher.target_status.is_empty() {
            return Err(ConfigError::invalid("dispatcher.targetStatus must not be empty"));
        }

        let schema = self.dispatcher.record_schema();
        if schema.id_field == schema.status_field
            || schema.id_field == schema.claim_field
            || schema.status_field == schema.claim_field
        {
            return Err(ConfigError::invalid(
                "dispatcher id, status and claim fields must be distinct",
            ));
        }

        Ok(())
    }

    pub fn claim_dispatcher_config(&self) -> ClaimDispatcherConfig {
        ClaimDispatcherConfig {
            collection: self.dispatcher.collection.clone(),
            target_status: self.dispatcher.target_status.clone(),
            schema: self.dispatcher.record_schema(),
            payload_fields: self.dispatcher.payload_fields.clone(),
            max_concurrent_events: self.dispatcher.max_concurrent_events,
        }
    }

    pub fn postgres_claims_config(&self) -> PostgresClaimsConfig {
        PostgresClaimsConfig {
            db_schema: self.notifications.db_schema.clone(),
            record_schema: self.dispatcher.record_schema(),
            id_sql_type: self.dispatcher.id_type,
            notify_channel: self.notifications.channel.clone(),
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            default_filter: self.logging.level.clone(),
            format: self.logging.format,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Database
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Overridden by the `--database-url` flag
    pub url: Option<String>,

    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,

    #[serde(
        default = "DatabaseConfig::default_acquire_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    fn default_max_connections() -> u32 {
        10
    }

    fn default_acquire_timeout() -> Duration {
        Duration::from_secs(30)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: Self::default_max_connections(),
            acquire_timeout: Self::default_acquire_timeout(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Notifications
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Channel the change trigger publishes to
    #[serde(default = "NotificationsConfig::default_channel")]
    pub channel: String,

    /// Database schema of the watched table
    #[serde(default = "NotificationsConfig::default_db_schema")]
    pub db_schema: String,
}

impl NotificationsConfig {
    fn default_channel() -> String {
        DEFAULT_NOTIFY_CHANNEL.to_string()
    }

    fn default_db_schema() -> String {
        DEFAULT_DB_SCHEMA.to_string()
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel: Self::default_channel(),
            db_schema: Self::default_db_schema(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Dispatcher
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Watched table
    pub collection: String,

    pub target_status: String,

    #[serde(default = "DispatcherConfig::default_id_field")]
    pub id_field: String,

    #[serde(default)]
    pub id_type: RecordIdSqlType,

    #[serde(default = "DispatcherConfig::default_status_field")]
    pub status_field: String,

    /// Nullable timestamp column used as the claim
    #[serde(default = "DispatcherConfig::default_claim_field")]
    pub claim_field: String,

    /// Columns passed to the handler, all columns when empty
    #[serde(default)]
    pub payload_fields: Vec<String>,

    pub max_concurrent_events: Option<NonZeroUsize>,
}

impl DispatcherConfig {
    fn default_id_field() -> String {
        DEFAULT_ID_FIELD.to_string()
    }

    fn default_status_field() -> String {
        DEFAULT_STATUS_FIELD.to_string()
    }

    fn default_claim_field() -> String {
        DEFAULT_CLAIM_FIELD.to_string()
    }

    pub fn record_schema(&self) -> RecordSchema {
        RecordSchema::new(&self.id_field, &self.status_field, &self.claim_field)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Handler
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", deny_unknown_fields)]
pub enum HandlerConfig {
    /// Only logs claimed records
    #[default]
    Log,

    /// POSTs claimed records as JSON
    #[serde(rename_all = "camelCase")]
    Webhook {
        url: url::Url,

        #[serde(
            default = "HandlerConfig::default_webhook_timeout",
            deserialize_with = "deserialize_duration"
        )]
        timeout: Duration,

        bearer_token: Option<String>,
    },
}

impl HandlerConfig {
    fn default_webhook_timeout() -> Duration {
        DEFAULT_WEBHOOK_TIMEOUT
    }

    pub fn webhook_handler_config(&self) -> Option<WebhookHandlerConfig> {
        match self {
            Self::Log => None,
            Self::Webhook {
                url,
                timeout,
                bearer_token,
            } => Some(WebhookHandlerConfig {
                target_url: url.clone(),
                timeout: *timeout,
                bearer_token: bearer_token.clone(),
            }),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Logging
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directives used when `RUST_LOG` is not set
    #[serde(default = "LoggingSection::default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingSection {
    fn default_level() -> String {
        DEFAULT_LOGGING_FILTER.to_string()
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: LogFormat::default(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Metrics
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "MetricsConfig::default_address")]
    pub address: SocketAddr,
}

impl MetricsConfig {
    fn default_address() -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], 9090))
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: Self::default_address(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

// Accepts human-readable durations like "500ms" or "30s"
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let duration = s
        .parse::<DurationString>()
        .map_err(serde::de::Error::custom)?;
    Ok(duration.into())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
