// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use claims::*;
use claims_inmem::{InMemoryChangeFeed, InMemoryClaimableRecordRepository};
use futures::StreamExt;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ORDERS: &str = "orders";

async fn next_event(stream: &mut RecordChangeStream) -> RecordChangeEvent {
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("Timed out waiting for event")
        .expect("Stream ended")
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_subscription_filters_collection_and_kind() {
    let feed = InMemoryChangeFeed::new();
    let mut stream = feed.subscribe(ORDERS, ChangeKind::Update).await.unwrap();

    feed.publish(RecordChangeEvent::new(
        ORDERS,
        ChangeKind::Insert,
        RecordSnapshot::new("1", "Placed"),
    ));
    feed.publish(RecordChangeEvent::update(
        "invoices",
        RecordSnapshot::new("2", "Placed"),
    ));
    feed.publish(RecordChangeEvent::update(
        ORDERS,
        RecordSnapshot::new("3", "Placed"),
    ));

    let event = next_event(&mut stream).await;
    assert_eq!(event.collection, ORDERS);
    assert_eq!(event.change_kind, ChangeKind::Update);
    assert_eq!(event.new.id, RecordID::new("3"));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_every_subscriber_sees_every_event() {
    let feed = InMemoryChangeFeed::new();
    let mut first = feed.subscribe(ORDERS, ChangeKind::Update).await.unwrap();
    let mut second = feed.subscribe(ORDERS, ChangeKind::Update).await.unwrap();
    assert_eq!(feed.subscriber_count(), 2);

    let delivered = feed.publish(RecordChangeEvent::update(
        ORDERS,
        RecordSnapshot::new("1", "Placed"),
    ));
    assert_eq!(delivered, 2);

    assert_eq!(next_event(&mut first).await.new.id, RecordID::new("1"));
    assert_eq!(next_event(&mut second).await.new.id, RecordID::new("1"));

    drop(first);
    drop(second);
    assert_eq!(feed.subscriber_count(), 0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_publish_without_subscribers() {
    let feed = InMemoryChangeFeed::new();

    let delivered = feed.publish(RecordChangeEvent::update(
        ORDERS,
        RecordSnapshot::new("1", "Placed"),
    ));
    assert_eq!(delivered, 0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_lagging_subscriber_skips_oldest_events() {
    let feed = InMemoryChangeFeed::with_capacity(2);
    let mut stream = feed.subscribe(ORDERS, ChangeKind::Update).await.unwrap();

    for id in ["1", "2", "3", "4"] {
        feed.publish(RecordChangeEvent::update(
            ORDERS,
            RecordSnapshot::new(id, "Placed"),
        ));
    }

    assert_eq!(next_event(&mut stream).await.new.id, RecordID::new("3"));
    assert_eq!(next_event(&mut stream).await.new.id, RecordID::new("4"));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_repository_writes_are_published() {
    let feed = Arc::new(InMemoryChangeFeed::new());
    let repo = InMemoryClaimableRecordRepository::new().with_change_feed(feed.clone());

    let mut inserts = feed.subscribe(ORDERS, ChangeKind::Insert).await.unwrap();
    let mut updates = feed.subscribe(ORDERS, ChangeKind::Update).await.unwrap();

    repo.save_record(ORDERS, RecordSnapshot::new("1", "Pending"))
        .await
        .unwrap();
    repo.save_record(ORDERS, RecordSnapshot::new("1", "Placed"))
        .await
        .unwrap();

    let claimed_at = chrono::Utc::now();
    let claimed = repo
        .try_claim(ORDERS, &RecordID::new("1"), claimed_at)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);

    // Lost claim changes nothing and publishes nothing
    let claimed = repo
        .try_claim(ORDERS, &RecordID::new("1"), claimed_at)
        .await
        .unwrap();
    assert!(claimed.is_empty());

    let insert = next_event(&mut inserts).await;
    assert_eq!(insert.new.status.as_deref(), Some("Pending"));

    let update = next_event(&mut updates).await;
    assert_eq!(update.new.status.as_deref(), Some("Placed"));
    assert!(!update.new.is_claimed());

    let claim = next_event(&mut updates).await;
    assert_eq!(claim.new.claimed_at, Some(claimed_at));

    assert!(
        tokio::time::timeout(Duration::from_millis(50), updates.next())
            .await
            .is_err()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
