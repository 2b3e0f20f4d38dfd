mod common;

use mortgage_engine::application::engine::{ApplicationFilter, ReviewDecision};
use mortgage_engine::domain::application::ApplicationStatus;
use mortgage_engine::domain::money::{AnnualRate, Money};
use mortgage_engine::domain::property::UserId;
use mortgage_engine::error::MortgageError;
use mortgage_engine::infrastructure::in_memory::InMemoryApplicationStore;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_submit_with_unknown_bank_persists_nothing() {
    let store = InMemoryApplicationStore::new();
    let engine = common::engine_with(store.clone()).await;

    let err = engine
        .submit(UserId(1), common::request(99, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, MortgageError::NotFound { entity: "bank", .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_submit_rate_from_other_bank_is_not_found() {
    let store = InMemoryApplicationStore::new();
    let engine = common::engine_with(store.clone()).await;

    let err = engine
        .submit(UserId(1), common::request(1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, MortgageError::NotFound { entity: "rate", .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_snapshot_is_frozen_against_catalog_changes() {
    let catalog = common::two_bank_catalog().await;
    let engine = mortgage_engine::application::engine::MortgageEngine::new(
        Default::default(),
        Box::new(catalog.clone()),
        Box::new(InMemoryApplicationStore::new()),
    )
    .with_clock(Box::new(mortgage_engine::infrastructure::clock::FixedClock(
        common::now(),
    )));

    let app = engine.submit(UserId(1), common::request(1, 1)).await.unwrap();
    assert_eq!(app.interest_rate, AnnualRate::from_percent(dec!(2.5)));
    assert_eq!(app.monthly_payment, Money::new(dec!(15897.09)));

    catalog
        .add_rate(common::fixed_rate(1, 1, dec!(4.0)))
        .await;

    let stored = engine.get_application(UserId(1), app.id).await.unwrap();
    assert_eq!(stored.interest_rate, AnnualRate::from_percent(dec!(2.5)));
    assert_eq!(stored.monthly_payment, app.monthly_payment);
    assert_eq!(stored.total_payment, Money::new(dec!(3815301.60)));
}

#[tokio::test]
async fn test_terminal_states_reject_every_transition() {
    let engine = common::engine_with(InMemoryApplicationStore::new()).await;

    let rejected = engine.submit(UserId(1), common::request(1, 1)).await.unwrap();
    engine
        .review_application(
            rejected.id,
            ReviewDecision::Reject {
                reason: "insufficient income".to_string(),
            },
        )
        .await
        .unwrap();

    let withdrawn = engine.submit(UserId(1), common::request(1, 1)).await.unwrap();
    engine.withdraw_application(UserId(1), withdrawn.id).await.unwrap();

    let completed = engine.submit(UserId(1), common::request(1, 1)).await.unwrap();
    engine
        .review_application(completed.id, ReviewDecision::Approve { note: None })
        .await
        .unwrap();
    engine
        .review_application(completed.id, ReviewDecision::Complete)
        .await
        .unwrap();

    let cancelled = engine.submit(UserId(1), common::request(1, 1)).await.unwrap();
    engine
        .review_application(cancelled.id, ReviewDecision::Approve { note: None })
        .await
        .unwrap();
    engine
        .review_application(cancelled.id, ReviewDecision::Cancel)
        .await
        .unwrap();

    for id in [rejected.id, withdrawn.id, completed.id, cancelled.id] {
        let before = engine.get_application(UserId(1), id).await.unwrap();
        assert!(before.status.is_terminal());

        let decisions = [
            ReviewDecision::Approve { note: None },
            ReviewDecision::Reject {
                reason: "again".to_string(),
            },
            ReviewDecision::Complete,
            ReviewDecision::Cancel,
        ];
        for decision in decisions {
            assert!(matches!(
                engine.review_application(id, decision).await,
                Err(MortgageError::InvalidTransition { .. })
            ));
        }
        assert!(matches!(
            engine.withdraw_application(UserId(1), id).await,
            Err(MortgageError::InvalidTransition { .. })
        ));

        let after = engine.get_application(UserId(1), id).await.unwrap();
        assert_eq!(after, before);
    }
}

#[tokio::test]
async fn test_approved_application_can_still_be_withdrawn() {
    let engine = common::engine_with(InMemoryApplicationStore::new()).await;
    let app = engine.submit(UserId(1), common::request(1, 1)).await.unwrap();
    let approved = engine
        .review_application(app.id, ReviewDecision::Approve { note: None })
        .await
        .unwrap();
    assert!(!approved.can_update());
    assert!(approved.can_withdraw());

    let withdrawn = engine.withdraw_application(UserId(1), app.id).await.unwrap();
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    assert!(withdrawn.withdrawn_at.is_some());
    assert!(withdrawn.approved_at.is_some());
}

#[tokio::test]
async fn test_concurrent_submissions_get_unique_numbers() {
    let store = InMemoryApplicationStore::new();
    let engine = Arc::new(common::engine_with(store.clone()).await);

    let mut handles = Vec::new();
    for user in 0..20u64 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .submit(UserId(user % 3), common::request(1, 1))
                .await
                .unwrap()
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let app = handle.await.unwrap();
        assert!(numbers.insert(app.number));
    }
    assert_eq!(numbers.len(), 20);
    assert_eq!(store.len().await, 20);
}

#[tokio::test]
async fn test_concurrent_transitions_have_one_winner() {
    let engine = Arc::new(common::engine_with(InMemoryApplicationStore::new()).await);
    let app = engine.submit(UserId(1), common::request(1, 1)).await.unwrap();

    let approve = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .review_application(app.id, ReviewDecision::Approve { note: None })
                .await
        })
    };
    let reject = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .review_application(
                    app.id,
                    ReviewDecision::Reject {
                        reason: "duplicate".to_string(),
                    },
                )
                .await
        })
    };

    let results = [approve.await.unwrap(), reject.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(MortgageError::InvalidTransition { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(losers, 1);

    let stored = engine.get_application(UserId(1), app.id).await.unwrap();
    assert!(matches!(
        stored.status,
        ApplicationStatus::Approved | ApplicationStatus::Rejected
    ));
}

#[tokio::test]
async fn test_listing_is_scoped_to_owner() {
    let engine = common::engine_with(InMemoryApplicationStore::new()).await;
    engine.submit(UserId(1), common::request(1, 1)).await.unwrap();
    engine.submit(UserId(1), common::request(2, 2)).await.unwrap();
    engine.submit(UserId(2), common::request(1, 1)).await.unwrap();

    let mine = engine
        .list_applications(UserId(1), &ApplicationFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 2);
    assert!(mine.items.iter().all(|a| a.user_id == UserId(1)));
}
