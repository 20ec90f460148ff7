//! Catalog repository behaviour against SQLite.

mod test_utils;

use org_registry::error::RepositoryError;
use org_registry::models::PartitionState;
use org_registry::registry::{CatalogFilter, CatalogStore, NewOrganizationRecord, RecordPatch};
use org_registry::repositories::OrganizationRepository;
use std::sync::Arc;
use test_utils::setup_test_db;
use uuid::Uuid;

fn record(name: &str, email: &str) -> NewOrganizationRecord {
    NewOrganizationRecord {
        organization_name: name.to_string(),
        name_key: name.to_ascii_lowercase(),
        email: email.to_string(),
        admin_password_hash: "$argon2id$stub".to_string(),
        partition_name: format!("org_{name}"),
        admin_id: format!("admin_{name}"),
    }
}

async fn repository() -> OrganizationRepository {
    OrganizationRepository::new(Arc::new(setup_test_db().await.unwrap()))
}

#[tokio::test]
async fn insert_starts_pending() {
    let repo = repository().await;

    let id = repo
        .insert_one(record("TechCorp", "admin@techcorp.com"))
        .await
        .unwrap();

    let stored = repo
        .find_one(CatalogFilter::OrganizationName("TechCorp"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.partition_state, PartitionState::Pending);
    assert_eq!(stored.partition_name, "org_TechCorp");
}

#[tokio::test]
async fn unique_indexes_map_to_conflict() {
    let repo = repository().await;
    repo.insert_one(record("TechCorp", "a@techcorp.com"))
        .await
        .unwrap();

    let same_name = repo.insert_one(record("TechCorp", "b@techcorp.com")).await;
    assert!(matches!(same_name, Err(RepositoryError::Conflict(_))));

    let same_key = repo.insert_one(record("TECHCORP", "c@techcorp.com")).await;
    assert!(matches!(same_key, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
async fn lookups_by_each_filter() {
    let repo = repository().await;
    repo.insert_one(record("TechCorp", "admin@techcorp.com"))
        .await
        .unwrap();

    assert!(
        repo.find_one(CatalogFilter::NameKey("techcorp"))
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        repo.find_one(CatalogFilter::Email("admin@techcorp.com"))
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        repo.find_one(CatalogFilter::OrganizationName("techcorp"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn update_and_delete_missing_ids() {
    let repo = repository().await;
    let ghost = Uuid::new_v4();

    assert!(matches!(
        repo.update_one(ghost, RecordPatch::partition_state(PartitionState::Ready))
            .await,
        Err(RepositoryError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete_one(ghost).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn unprovisioned_excludes_ready_records() {
    let repo = repository().await;
    let ready = repo.insert_one(record("Ready", "r@example.com")).await.unwrap();
    let failed = repo.insert_one(record("Failed", "f@example.com")).await.unwrap();
    repo.insert_one(record("Pending", "p@example.com"))
        .await
        .unwrap();

    repo.update_one(ready, RecordPatch::partition_state(PartitionState::Ready))
        .await
        .unwrap();
    repo.update_one(failed, RecordPatch::partition_state(PartitionState::Failed))
        .await
        .unwrap();

    let names: Vec<_> = repo
        .find_unprovisioned()
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.organization_name, r.partition_state))
        .collect();

    assert_eq!(
        names,
        vec![
            ("Failed".to_string(), PartitionState::Failed),
            ("Pending".to_string(), PartitionState::Pending),
        ]
    );
}
