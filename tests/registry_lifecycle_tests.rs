//! End-to-end registry behaviour through the public crate API.

mod test_utils;

use org_registry::registry::{
    CatalogFilter, CatalogStore, NewOrganization, OrganizationPatch, PartitionStore,
    RegistryError,
};
use org_registry::repositories::OrganizationRepository;
use std::sync::Arc;
use test_utils::{registry_over, setup_test_db};

fn org(name: &str, email: &str) -> NewOrganization {
    NewOrganization {
        organization_name: name.to_string(),
        email: email.to_string(),
        password: "SecurePass123".to_string(),
    }
}

#[tokio::test]
async fn catalog_and_partitions_can_share_one_database() {
    let db = setup_test_db().await.unwrap();
    let (registry, partitions) = registry_over(&db, &db);

    registry
        .create_organization(org("TechCorp", "admin@techcorp.com"))
        .await
        .unwrap();

    assert!(partitions.exists("org_TechCorp").await.unwrap());
    assert_eq!(partitions.count_documents("org_TechCorp").await.unwrap(), 1);

    let report = registry.delete_organization("TechCorp").await.unwrap();
    assert!(report.partition_dropped());
    assert!(!partitions.exists("org_TechCorp").await.unwrap());

    // The catalog table is untouched by partition drops.
    assert!(partitions.exists("organizations").await.unwrap());
}

#[tokio::test]
async fn organizations_are_isolated_from_each_other() {
    let catalog = setup_test_db().await.unwrap();
    let tenants = test_utils::memory_db().await.unwrap();
    let (registry, partitions) = registry_over(&catalog, &tenants);

    registry
        .create_organization(org("Alpha", "admin@alpha.io"))
        .await
        .unwrap();
    registry
        .create_organization(org("Beta", "admin@beta.io"))
        .await
        .unwrap();

    registry.delete_organization("Alpha").await.unwrap();

    assert!(!partitions.exists("org_Alpha").await.unwrap());
    assert!(partitions.exists("org_Beta").await.unwrap());
    assert_eq!(
        registry.get_organization("Beta").await.unwrap().admin_id,
        "admin_Beta"
    );
}

#[tokio::test]
async fn update_touches_only_given_fields() {
    let catalog = setup_test_db().await.unwrap();
    let tenants = test_utils::memory_db().await.unwrap();
    let (registry, _) = registry_over(&catalog, &tenants);
    let repository = OrganizationRepository::new(Arc::new(catalog.clone()));

    registry
        .create_organization(org("TechCorp", "admin@techcorp.com"))
        .await
        .unwrap();
    let before = repository
        .find_one(CatalogFilter::OrganizationName("TechCorp"))
        .await
        .unwrap()
        .unwrap();

    registry
        .update_organization(
            "TechCorp",
            OrganizationPatch {
                email: Some("ops@techcorp.com".to_string()),
                password: None,
            },
        )
        .await
        .unwrap();

    let after = repository
        .find_one(CatalogFilter::OrganizationName("TechCorp"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(after.email, "ops@techcorp.com");
    assert_eq!(after.admin_password_hash, before.admin_password_hash);
    assert_eq!(after.partition_name, before.partition_name);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);
}

#[tokio::test]
async fn overlong_name_is_rejected_before_any_write() {
    let catalog = setup_test_db().await.unwrap();
    let tenants = test_utils::memory_db().await.unwrap();
    let (registry, _) = registry_over(&catalog, &tenants);

    let result = registry
        .create_organization(org(&"x".repeat(60), "admin@example.com"))
        .await;

    assert!(matches!(
        result,
        Err(RegistryError::Validation { ref field, .. }) if field == "organization_name"
    ));
    assert!(registry.list_unprovisioned().await.unwrap().is_empty());
}
