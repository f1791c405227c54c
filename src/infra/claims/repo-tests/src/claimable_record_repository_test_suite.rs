// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use claims::*;
use dill::Catalog;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ORDERS: &str = "orders";
const INVOICES: &str = "invoices";

fn claim_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2050, 1, 1, 12, 0, 0).unwrap()
}

fn placed_order(id: &str) -> RecordSnapshot {
    RecordSnapshot::new(id, "Placed")
        .with_field("total", serde_json::json!(42))
        .with_field("customer", serde_json::json!("alice"))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_missing_record_not_found(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    let record = repo
        .get_record(ORDERS, &RecordID::new("missing"))
        .await
        .unwrap();
    assert!(record.is_none());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_save_and_get_record(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    let order = placed_order("1");
    repo.save_record(ORDERS, order.clone()).await.unwrap();

    let record = repo.get_record(ORDERS, &RecordID::new("1")).await.unwrap();
    assert_eq!(record, Some(order));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_save_replaces_existing_record(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    repo.save_record(ORDERS, RecordSnapshot::new("1", "Pending"))
        .await
        .unwrap();
    repo.save_record(ORDERS, placed_order("1")).await.unwrap();

    let record = repo
        .get_record(ORDERS, &RecordID::new("1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status.as_deref(), Some("Placed"));
    assert_eq!(record.fields.get("total"), Some(&serde_json::json!(42)));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_claim_unclaimed_record(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    repo.save_record(ORDERS, placed_order("1")).await.unwrap();

    let claimed = repo
        .try_claim(ORDERS, &RecordID::new("1"), claim_time())
        .await
        .unwrap();
    assert_eq!(claimed, vec![RecordID::new("1")]);

    let record = repo
        .get_record(ORDERS, &RecordID::new("1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.claimed_at, Some(claim_time()));
    assert_eq!(record.status.as_deref(), Some("Placed"));
    assert_eq!(record.fields, placed_order("1").fields);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_claim_is_irreversible(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    repo.save_record(ORDERS, placed_order("1")).await.unwrap();

    let first = repo
        .try_claim(ORDERS, &RecordID::new("1"), claim_time())
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let second = repo
        .try_claim(
            ORDERS,
            &RecordID::new("1"),
            claim_time() + Duration::minutes(5),
        )
        .await
        .unwrap();
    assert!(second.is_empty());

    // First claim timestamp is kept
    let record = repo
        .get_record(ORDERS, &RecordID::new("1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.claimed_at, Some(claim_time()));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_claim_pre_claimed_record(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    let pre_claimed = placed_order("1").with_claimed_at(claim_time() - Duration::hours(1));
    repo.save_record(ORDERS, pre_claimed).await.unwrap();

    let claimed = repo
        .try_claim(ORDERS, &RecordID::new("1"), claim_time())
        .await
        .unwrap();
    assert!(claimed.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_claim_missing_record(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    let claimed = repo
        .try_claim(ORDERS, &RecordID::new("missing"), claim_time())
        .await
        .unwrap();
    assert!(claimed.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_concurrent_claims_single_winner(catalog: &Catalog) {
    const NUM_ATTEMPTS: usize = 16;

    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    repo.save_record(ORDERS, placed_order("1")).await.unwrap();

    let attempts = (0..NUM_ATTEMPTS).map(|i| {
        let repo = Arc::clone(&repo);
        async move {
            repo.try_claim(
                ORDERS,
                &RecordID::new("1"),
                claim_time() + Duration::seconds(i64::try_from(i).unwrap()),
            )
            .await
            .unwrap()
        }
    });
    let results = futures::future::join_all(attempts).await;

    let winners: Vec<_> = results.iter().filter(|ids| !ids.is_empty()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0], &vec![RecordID::new("1")]);

    let losers = results.iter().filter(|ids| ids.is_empty()).count();
    assert_eq!(losers, NUM_ATTEMPTS - 1);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_claims_scoped_by_collection(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn ClaimableRecordRepository>().unwrap();

    repo.save_record(ORDERS, placed_order("1")).await.unwrap();
    repo.save_record(INVOICES, placed_order("1")).await.unwrap();

    let claimed = repo
        .try_claim(ORDERS, &RecordID::new("1"), claim_time())
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);

    let invoice = repo
        .get_record(INVOICES, &RecordID::new("1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!invoice.is_claimed());

    let claimed = repo
        .try_claim(INVOICES, &RecordID::new("1"), claim_time())
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
