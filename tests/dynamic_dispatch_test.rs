mod common;

use async_trait::async_trait;
use mortgage_engine::application::engine::MortgageEngine;
use mortgage_engine::application::lifecycle::ApplicationLifecycle;
use mortgage_engine::config::EngineConfig;
use mortgage_engine::domain::application::{
    ApplicationId, ApplicationNumber, ApplicationStatus, MortgageApplication,
};
use mortgage_engine::domain::ports::{ApplicationStore, ApplicationStoreBox};
use mortgage_engine::domain::property::{PropertyId, PropertySummary, UserId};
use mortgage_engine::error::{MortgageError, Result};
use mortgage_engine::infrastructure::clock::FixedClock;
use mortgage_engine::infrastructure::in_memory::{
    InMemoryApplicationStore, InMemoryPropertyCatalog,
};
use std::sync::Arc;

/// A store whose backend is always down.
struct UnavailableStore;

#[async_trait]
impl ApplicationStore for UnavailableStore {
    async fn insert(&self, _application: MortgageApplication) -> Result<()> {
        Err(MortgageError::Storage("backend unavailable".to_string()))
    }

    async fn get(&self, _id: ApplicationId) -> Result<Option<MortgageApplication>> {
        Err(MortgageError::Storage("backend unavailable".to_string()))
    }

    async fn get_by_number(
        &self,
        _number: &ApplicationNumber,
    ) -> Result<Option<MortgageApplication>> {
        Err(MortgageError::Storage("backend unavailable".to_string()))
    }

    async fn list_for_user(&self, _user_id: UserId) -> Result<Vec<MortgageApplication>> {
        Err(MortgageError::Storage("backend unavailable".to_string()))
    }

    async fn update_if_status(
        &self,
        _application: MortgageApplication,
        _expected: ApplicationStatus,
    ) -> Result<bool> {
        Err(MortgageError::Storage("backend unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_boxed_store_is_shareable_across_tasks() {
    let store: Arc<ApplicationStoreBox> = Arc::new(Box::new(InMemoryApplicationStore::new()));
    let engine = common::engine_with(InMemoryApplicationStore::new()).await;
    let app = engine.submit(UserId(3), common::request(1, 1)).await.unwrap();

    let writer = {
        let store = store.clone();
        let app = app.clone();
        tokio::spawn(async move { store.insert(app).await })
    };
    writer.await.unwrap().unwrap();

    let reader = {
        let store = store.clone();
        let number = app.number.clone();
        tokio::spawn(async move { store.get_by_number(&number).await })
    };
    let found = reader.await.unwrap().unwrap().unwrap();
    assert_eq!(found.id, app.id);
}

#[tokio::test]
async fn test_storage_failure_surfaces_from_submit() {
    let engine = MortgageEngine::new(
        EngineConfig::default(),
        Box::new(common::two_bank_catalog().await),
        Box::new(UnavailableStore),
    )
    .with_clock(Box::new(FixedClock(common::now())));

    let err = engine
        .submit(UserId(1), common::request(1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, MortgageError::Storage(_)));
}

#[tokio::test]
async fn test_property_summary_comes_from_injected_catalog() {
    let properties = InMemoryPropertyCatalog::new();
    properties
        .add(PropertySummary {
            id: PropertyId(55),
            title: "Harbour View Tower 12B".to_string(),
            district: Some("Central".to_string()),
        })
        .await;

    let config = EngineConfig::default();
    let lifecycle = ApplicationLifecycle::new(Box::new(InMemoryApplicationStore::new()), &config)
        .with_properties(Box::new(properties));
    let engine = MortgageEngine::with_lifecycle(
        config,
        Box::new(common::two_bank_catalog().await),
        lifecycle,
    )
    .with_clock(Box::new(FixedClock(common::now())));

    let mut request = common::request(1, 1);
    request.property_id = Some(PropertyId(55));
    let app = engine.submit(UserId(1), request).await.unwrap();
    assert_eq!(
        app.property_summary.as_deref(),
        Some("Harbour View Tower 12B (Central)")
    );
}
