use super::backend::ObjectStoreBackend;
use super::config::StorageConfig;
use super::error::StorageError;
use super::routes::RoutedContentStore;
use super::traits::{ContentStorage, DocumentStore};
use serde_json::json;
use shared_types::ContentKey;
use std::sync::Arc;
use tempfile::TempDir;

fn memory_backend() -> Arc<ObjectStoreBackend> {
    Arc::new(ObjectStoreBackend::from_config(StorageConfig::Memory).unwrap())
}

fn create_test_store() -> (RoutedContentStore, Arc<ObjectStoreBackend>) {
    let backend = memory_backend();
    let store = RoutedContentStore::new(backend.clone());
    (store, backend)
}

#[tokio::test]
async fn test_unwritten_keys_have_empty_values() {
    let (store, _) = create_test_store();

    assert_eq!(store.read(ContentKey::ServicesData).await.unwrap(), json!([]));
    assert_eq!(
        store.read(ContentKey::HeroSubtitle).await.unwrap(),
        serde_json::Value::Null
    );
    assert_eq!(
        store.read(ContentKey::LeadershipTeam).await.unwrap(),
        serde_json::Value::Null
    );
    assert_eq!(
        store.read(ContentKey::HeroBackground).await.unwrap(),
        serde_json::Value::Null
    );
}

#[tokio::test]
async fn test_write_then_read_every_key() {
    let (store, _) = create_test_store();

    for key in ContentKey::ALL {
        let value = if key.is_collection() {
            json!([{"id": format!("{key}-1"), "title": key.as_str()}])
        } else {
            json!(format!("value of {key}"))
        };
        store.write(key, &value).await.unwrap();
        assert_eq!(store.read(key).await.unwrap(), value, "{key}");
    }
}

#[tokio::test]
async fn test_collection_write_replaces_contents() {
    let (store, _) = create_test_store();

    let first = json!([
        {"id": "service-1", "title": "Groundworks"},
        {"id": "service-2", "title": "Steel frame"},
    ]);
    store.write(ContentKey::ServicesData, &first).await.unwrap();

    let second = json!([{"id": "service-3", "title": "Fit-out"}]);
    store.write(ContentKey::ServicesData, &second).await.unwrap();

    assert_eq!(store.read(ContentKey::ServicesData).await.unwrap(), second);
}

#[tokio::test]
async fn test_collection_write_is_idempotent() {
    let (store, _) = create_test_store();

    let records = json!([{"id": "news-1", "title": "Topping out ceremony"}]);
    store.write(ContentKey::NewsData, &records).await.unwrap();
    store.write(ContentKey::NewsData, &records).await.unwrap();

    assert_eq!(store.read(ContentKey::NewsData).await.unwrap(), records);
}

#[tokio::test]
async fn test_empty_collection_clears_records() {
    let (store, _) = create_test_store();

    store
        .write(ContentKey::MarketsData, &json!([{"id": "m-1"}]))
        .await
        .unwrap();
    store.write(ContentKey::MarketsData, &json!([])).await.unwrap();

    assert_eq!(store.read(ContentKey::MarketsData).await.unwrap(), json!([]));
}

#[tokio::test]
async fn test_collection_rejects_non_array() {
    let (store, _) = create_test_store();

    let err = store
        .write(ContentKey::PortfolioData, &json!({"id": "p-1"}))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::InvalidShape {
            key: ContentKey::PortfolioData,
            ..
        })
    ));
}

#[tokio::test]
async fn test_settings_keys_share_one_document() {
    let (store, backend) = create_test_store();

    store
        .write(ContentKey::HeroSubtitle, &json!("BUILDING TOMORROW"))
        .await
        .unwrap();
    store
        .write(ContentKey::StatsData, &json!([{"label": "Projects", "value": 250}]))
        .await
        .unwrap();

    let settings = backend.load("settings/site.json").await.unwrap().unwrap();
    assert_eq!(settings["heroSubtitle"], json!("BUILDING TOMORROW"));
    assert_eq!(settings["stats"][0]["value"], json!(250));

    // Updating one field leaves its neighbours alone
    store
        .write(ContentKey::HeroSubtitle, &json!("NEW TAGLINE"))
        .await
        .unwrap();
    assert_eq!(
        store.read(ContentKey::StatsData).await.unwrap()[0]["label"],
        json!("Projects")
    );
}

#[tokio::test]
async fn test_team_keys_share_team_document() {
    let (store, backend) = create_test_store();

    let leaders = json!([{"id": "leader-1", "name": "A. Mason"}]);
    let members = json!([{"id": "member-1", "name": "B. Joiner"}]);
    store.write(ContentKey::LeadershipTeam, &leaders).await.unwrap();
    store.write(ContentKey::TeamMembers, &members).await.unwrap();

    let team = backend.load("team/team.json").await.unwrap().unwrap();
    assert_eq!(team["leadership"], leaders);
    assert_eq!(team["members"], members);
    assert!(backend.load("settings/site.json").await.unwrap().is_none());
}

#[tokio::test]
async fn test_images_stay_out_of_settings() {
    let (store, backend) = create_test_store();

    let image = json!("data:image/png;base64,iVBORw0KGgo=");
    store.write(ContentKey::HeroBackground, &image).await.unwrap();

    let document = backend
        .load("images/hero-background.json")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document, json!({"key": "hero-background", "image": image}));
    assert!(backend.load("settings/site.json").await.unwrap().is_none());
    assert_eq!(store.read(ContentKey::HeroBackground).await.unwrap(), image);
}

#[tokio::test]
async fn test_concurrent_settings_writes_keep_both_fields() {
    let (store, _) = create_test_store();
    let store = Arc::new(store);

    let a = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .write(ContentKey::HeroSubtitle, &json!("subtitle"))
                .await
        })
    };
    let b = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .write(ContentKey::HeroDescription, &json!("description"))
                .await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(
        store.read(ContentKey::HeroSubtitle).await.unwrap(),
        json!("subtitle")
    );
    assert_eq!(
        store.read(ContentKey::HeroDescription).await.unwrap(),
        json!("description")
    );
}

#[tokio::test]
async fn test_corrupt_settings_document_is_an_error() {
    let (store, backend) = create_test_store();
    backend
        .save("settings/site.json", &json!(["not", "an", "object"]))
        .await
        .unwrap();

    assert!(store.read(ContentKey::HeroSubtitle).await.is_err());
    assert!(
        store
            .write(ContentKey::HeroSubtitle, &json!("x"))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_submissions_are_saved_by_form() {
    let (store, backend) = create_test_store();

    let submission = json!({"name": "Sam", "email": "sam@example.com"});
    store
        .save_submission("contact", "abc-123", &submission)
        .await
        .unwrap();

    assert_eq!(
        backend
            .load("submissions/contact/abc-123.json")
            .await
            .unwrap(),
        Some(submission)
    );
}

#[tokio::test]
async fn test_local_backend_persists_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig::local(temp_dir.path());

    let records = json!([{"id": "t-1", "quote": "On time and on budget"}]);
    {
        let backend = Arc::new(ObjectStoreBackend::from_config(config.clone()).unwrap());
        let store = RoutedContentStore::new(backend);
        store
            .write(ContentKey::TestimonialsData, &records)
            .await
            .unwrap();
    }

    let backend = Arc::new(ObjectStoreBackend::from_config(config).unwrap());
    let store = RoutedContentStore::new(backend);
    assert_eq!(
        store.read(ContentKey::TestimonialsData).await.unwrap(),
        records
    );
}
