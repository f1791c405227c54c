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
use std::path::PathBuf;
use std::time::Duration;

use claims::RecordSchema;
use claims_listener::*;
use claims_postgres::RecordIdSqlType;
use indoc::indoc;
use observability::init::LogFormat;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const MINIMAL_CONFIG: &str = indoc!(
    r#"
    dispatcher:
      collection: orders
      targetStatus: Placed
    "#
);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_minimal_config_uses_defaults() {
    let config = ListenerConfig::from_yaml(MINIMAL_CONFIG).unwrap();

    assert_eq!(config.database.url, None);
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.database.acquire_timeout, Duration::from_secs(30));
    assert_eq!(config.notifications.channel, "record_changes");
    assert_eq!(config.notifications.db_schema, "public");
    assert_eq!(config.handler, HandlerConfig::Log);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Text);
    assert!(!config.metrics.enabled);

    let dispatcher_config = config.claim_dispatcher_config();
    assert_eq!(dispatcher_config.collection, "orders");
    assert_eq!(dispatcher_config.target_status, "Placed");
    assert_eq!(dispatcher_config.schema, RecordSchema::default());
    assert!(dispatcher_config.payload_fields.is_empty());
    assert_eq!(dispatcher_config.max_concurrent_events, None);

    let pg_config = config.postgres_claims_config();
    assert_eq!(pg_config.id_sql_type, RecordIdSqlType::Text);
    assert_eq!(pg_config.notify_channel, "record_changes");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_full_config() {
    let config = ListenerConfig::from_yaml(indoc!(
        r#"
        database:
          url: postgres://claims@localhost/shop
          maxConnections: 3
          acquireTimeout: 5s
        notifications:
          channel: shop_changes
          dbSchema: sales
        dispatcher:
          collection: orders
          targetStatus: Placed
          idField: order_id
          idType: uuid
          statusField: order_status
          claimField: wa_message_created_ts
          payloadFields: [order_id, customer, total]
          maxConcurrentEvents: 8
        handler:
          kind: webhook
          url: https://hooks.example.com/orders
          timeout: 500ms
          bearerToken: secret
        logging:
          level: debug,sqlx=warn
          format: json
        metrics:
          enabled: true
          address: 127.0.0.1:9100
        "#
    ))
    .unwrap();

    assert_eq!(
        config.database.url.as_deref(),
        Some("postgres://claims@localhost/shop")
    );
    assert_eq!(config.database.max_connections, 3);
    assert_eq!(config.database.acquire_timeout, Duration::from_secs(5));

    let dispatcher_config = config.claim_dispatcher_config();
    assert_eq!(
        dispatcher_config.schema,
        RecordSchema::new("order_id", "order_status", "wa_message_created_ts")
    );
    assert_eq!(
        dispatcher_config.payload_fields,
        vec!["order_id", "customer", "total"]
    );
    assert_eq!(
        dispatcher_config.max_concurrent_events,
        NonZeroUsize::new(8)
    );

    let pg_config = config.postgres_claims_config();
    assert_eq!(pg_config.db_schema, "sales");
    assert_eq!(pg_config.notify_channel, "shop_changes");
    assert_eq!(pg_config.id_sql_type, RecordIdSqlType::Uuid);
    assert_eq!(pg_config.record_schema, dispatcher_config.schema);

    let webhook_config = config.handler.webhook_handler_config().unwrap();
    assert_eq!(
        webhook_config.target_url.as_str(),
        "https://hooks.example.com/orders"
    );
    assert_eq!(webhook_config.timeout, Duration::from_millis(500));
    assert_eq!(webhook_config.bearer_token.as_deref(), Some("secret"));

    let logging_config = config.logging_config();
    assert_eq!(logging_config.default_filter, "debug,sqlx=warn");
    assert_eq!(logging_config.format, LogFormat::Json);

    assert!(config.metrics.enabled);
    assert_eq!(
        config.metrics.address,
        "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_webhook_handler_defaults() {
    let config = ListenerConfig::from_yaml(indoc!(
        r#"
        dispatcher:
          collection: orders
          targetStatus: Placed
        handler:
          kind: webhook
          url: http://localhost:8080/hook
        "#
    ))
    .unwrap();

    let webhook_config = config.handler.webhook_handler_config().unwrap();
    assert_eq!(webhook_config.timeout, Duration::from_secs(30));
    assert_eq!(webhook_config.bearer_token, None);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_missing_dispatcher_section_is_rejected() {
    let res = ListenerConfig::from_yaml("database:\n  maxConnections: 2\n");
    assert!(matches!(res, Err(ConfigError::Parse(_))), "{res:?}");
}

#[test]
fn test_unknown_key_is_rejected() {
    let res = ListenerConfig::from_yaml(indoc!(
        r#"
        dispatcher:
          collection: orders
          targetStatus: Placed
          targetStatuses: [Placed]
        "#
    ));
    assert!(matches!(res, Err(ConfigError::Parse(_))), "{res:?}");
}

#[test]
fn test_bad_duration_is_rejected() {
    let res = ListenerConfig::from_yaml(indoc!(
        r#"
        database:
          acquireTimeout: soon
        dispatcher:
          collection: orders
          targetStatus: Placed
        "#
    ));
    assert!(matches!(res, Err(ConfigError::Parse(_))), "{res:?}");
}

#[test]
fn test_zero_concurrency_is_rejected() {
    let res = ListenerConfig::from_yaml(indoc!(
        r#"
        dispatcher:
          collection: orders
          targetStatus: Placed
          maxConcurrentEvents: 0
        "#
    ));
    assert!(matches!(res, Err(ConfigError::Parse(_))), "{res:?}");
}

#[test]
fn test_overlapping_fields_are_rejected() {
    let res = ListenerConfig::from_yaml(indoc!(
        r#"
        dispatcher:
          collection: orders
          targetStatus: Placed
          claimField: status
        "#
    ));
    assert!(matches!(res, Err(ConfigError::Invalid { .. })), "{res:?}");
}

#[test]
fn test_empty_target_status_is_rejected() {
    let res = ListenerConfig::from_yaml(indoc!(
        r#"
        dispatcher:
          collection: orders
          targetStatus: ""
        "#
    ));
    assert!(matches!(res, Err(ConfigError::Invalid { .. })), "{res:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claims-listener.yaml");
    std::fs::write(&path, MINIMAL_CONFIG).unwrap();

    let config = ListenerConfig::load(&path).unwrap();
    assert_eq!(config.dispatcher.collection, "orders");

    let res = ListenerConfig::load(&dir.path().join("missing.yaml"));
    assert!(matches!(res, Err(ConfigError::Read { .. })), "{res:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_database_url_precedence() {
    let mut config = ListenerConfig::from_yaml(MINIMAL_CONFIG).unwrap();
    let mut args = Cli {
        config: PathBuf::from(DEFAULT_CONFIG_PATH),
        database_url: None,
        migrate: false,
        dry_run: false,
    };

    assert_eq!(resolve_database_url(&args, &config), None);

    config.database.url = Some("postgres://from-config/db".to_string());
    assert_eq!(
        resolve_database_url(&args, &config).as_deref(),
        Some("postgres://from-config/db")
    );

    args.database_url = Some("postgres://from-cli/db".to_string());
    assert_eq!(
        resolve_database_url(&args, &config).as_deref(),
        Some("postgres://from-cli/db")
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
