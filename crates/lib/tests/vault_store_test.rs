//! # Vault Store Tests
//!
//! Exercises the SQLite repositories end to end: vault creation with its
//! initial owner, content CRUD, cascading deletes and site statistics.
//! Each test runs against its own in-memory database.

mod common;

use crate::common::{provider, setup_tracing, user};
use core_access::{add_member, authorize, AccessError, Action, Identity, MembershipStore, Role};
use syncscript::{NewFileUpload, StoreError, UploadPolicy, VaultUpdate};

fn pdf(name: &str) -> NewFileUpload {
    NewFileUpload {
        file_name: name.to_string(),
        file_url: format!("https://cdn.example.com/{name}"),
        public_id: Some(format!("papers/{name}")),
        content_type: "application/pdf".to_string(),
        size_bytes: 2048,
    }
}

#[tokio::test]
async fn test_create_vault_makes_creator_owner() {
    setup_tracing();
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;

    let vault = provider
        .create_vault(&alice, "  Thesis  ", Some("Chapter 2 reading"))
        .await
        .unwrap();
    assert_eq!(vault.title, "Thesis");
    assert_eq!(vault.description.as_deref(), Some("Chapter 2 reading"));

    let grant = authorize(
        provider.memberships(),
        &Identity::User(alice.clone()),
        &vault.id,
        &Action::DeleteVault,
    )
    .await
    .unwrap();
    assert_eq!(grant.role, Role::Owner);

    let listed = provider.list_vaults_for_user(&alice).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].role, Role::Owner);
    assert_eq!(listed[0].member_count, 1);
}

#[tokio::test]
async fn test_create_vault_requires_title() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;

    let err = provider.create_vault(&alice, "   ", None).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(provider.list_vaults_for_user(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_vault_listing_is_per_member() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let bob = user(&provider, "bob@example.com").await;

    let shared = provider.create_vault(&alice, "Shared", None).await.unwrap();
    provider.create_vault(&alice, "Private", None).await.unwrap();
    add_member(provider.memberships(), &shared.id, &bob, Role::Viewer)
        .await
        .unwrap();

    let bobs = provider.list_vaults_for_user(&bob).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].vault.id, shared.id);
    assert_eq!(bobs[0].role, Role::Viewer);
    assert_eq!(bobs[0].member_count, 2);
    assert_eq!(provider.list_vaults_for_user(&alice).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_vault_detail_collects_contents() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let bob = user(&provider, "bob@example.com").await;
    let vault = provider.create_vault(&alice, "Reading", None).await.unwrap();
    add_member(provider.memberships(), &vault.id, &bob, Role::Contributor)
        .await
        .unwrap();

    let source = provider
        .create_source(&vault.id, "Deep Work", "https://example.com/deep-work", None)
        .await
        .unwrap();
    provider
        .create_annotation(&source.id, &bob, "Key argument on p.3", Some(3))
        .await
        .unwrap();
    provider
        .record_upload(&vault.id, &bob, pdf("deep-work.pdf"), &UploadPolicy::default())
        .await
        .unwrap();

    let detail = provider.get_vault_detail(&vault.id).await.unwrap().unwrap();
    assert_eq!(detail.members.len(), 2);
    assert_eq!(detail.members[0].role, Role::Owner);
    assert_eq!(detail.members[0].email, "alice@example.com");
    assert_eq!(detail.sources.len(), 1);
    assert_eq!(detail.sources[0].annotations.len(), 1);
    assert_eq!(detail.sources[0].annotations[0].vault_id, vault.id);
    assert_eq!(detail.file_uploads.len(), 1);

    let summary = &provider.list_vaults_for_user(&bob).await.unwrap()[0];
    assert_eq!(summary.source_count, 1);
    assert_eq!(summary.file_count, 1);

    assert!(provider.get_vault_detail("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_vault() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let vault = provider
        .create_vault(&alice, "Draft", Some("old"))
        .await
        .unwrap();

    let updated = provider
        .update_vault(
            &vault.id,
            &VaultUpdate {
                title: Some("Final".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description.as_deref(), Some("old"));

    let cleared = provider
        .update_vault(
            &vault.id,
            &VaultUpdate {
                title: None,
                description: Some(String::new()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.description, None);

    let err = provider
        .update_vault("missing", &VaultUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_annotation_validation() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let vault = provider.create_vault(&alice, "V", None).await.unwrap();
    let source = provider
        .create_source(&vault.id, "S", "https://example.com", None)
        .await
        .unwrap();

    let err = provider
        .create_annotation(&source.id, &alice, "note", Some(0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = provider
        .create_annotation(&source.id, &alice, "  ", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = provider
        .create_annotation("missing", &alice, "note", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let annotation = provider
        .create_annotation(&source.id, &alice, "note", None)
        .await
        .unwrap();
    let fetched = provider.get_annotation(&annotation.id).await.unwrap().unwrap();
    assert_eq!(fetched, annotation);
}

#[tokio::test]
async fn test_delete_source_cascades_annotations() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let vault = provider.create_vault(&alice, "V", None).await.unwrap();
    let source = provider
        .create_source(&vault.id, "S", "https://example.com", None)
        .await
        .unwrap();
    let annotation = provider
        .create_annotation(&source.id, &alice, "note", None)
        .await
        .unwrap();

    provider.delete_source(&source.id).await.unwrap();
    assert!(provider.get_source(&source.id).await.unwrap().is_none());
    assert!(provider.get_annotation(&annotation.id).await.unwrap().is_none());

    let err = provider.delete_source(&source.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_vault_cascades_everything() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let vault = provider.create_vault(&alice, "Doomed", None).await.unwrap();
    let keep = provider.create_vault(&alice, "Kept", None).await.unwrap();

    let source = provider
        .create_source(&vault.id, "S", "https://example.com", None)
        .await
        .unwrap();
    provider
        .create_annotation(&source.id, &alice, "note", None)
        .await
        .unwrap();
    let upload = provider
        .record_upload(&vault.id, &alice, pdf("a.pdf"), &UploadPolicy::default())
        .await
        .unwrap();

    provider.delete_vault(&vault.id).await.unwrap();

    assert!(provider.get_vault(&vault.id).await.unwrap().is_none());
    assert!(provider.get_source(&source.id).await.unwrap().is_none());
    assert!(provider.get_upload(&upload.id).await.unwrap().is_none());
    assert!(provider
        .memberships()
        .list_memberships(&vault.id)
        .await
        .unwrap()
        .is_empty());
    assert!(provider.get_vault(&keep.id).await.unwrap().is_some());

    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.total_vaults, 1);
    assert_eq!(stats.total_annotations, 0);
    assert_eq!(stats.total_papers, 0);

    let err = provider.delete_vault(&vault.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_writes_into_deleted_vault_leave_no_orphans() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let bob = user(&provider, "bob@example.com").await;
    let vault = provider.create_vault(&alice, "Gone", None).await.unwrap();
    let source = provider
        .create_source(&vault.id, "S", "https://example.com", None)
        .await
        .unwrap();
    provider.delete_vault(&vault.id).await.unwrap();

    let err = provider
        .create_source(&vault.id, "Late", "https://example.com/late", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    let err = provider
        .create_annotation(&source.id, &alice, "late note", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    let err = provider
        .record_upload(&vault.id, &alice, pdf("late.pdf"), &UploadPolicy::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    let err = add_member(provider.memberships(), &vault.id, &bob, Role::Viewer)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::VaultNotFound));

    assert!(provider.list_sources(&vault.id).await.unwrap().is_empty());
    assert!(provider.list_uploads(&vault.id).await.unwrap().is_empty());
    assert!(provider
        .memberships()
        .list_memberships(&vault.id)
        .await
        .unwrap()
        .is_empty());
    let stats = provider.stats().await.unwrap();
    assert_eq!(stats.total_annotations, 0);
    assert_eq!(stats.total_papers, 0);
}

#[tokio::test]
async fn test_source_racing_vault_deletion_is_never_orphaned() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let vault = provider.create_vault(&alice, "Contested", None).await.unwrap();

    let (deleted, created) = tokio::join!(
        provider.delete_vault(&vault.id),
        provider.create_source(&vault.id, "Racer", "https://example.com/r", None),
    );

    let vault_left = provider.get_vault(&vault.id).await.unwrap().is_some();
    let sources = provider.list_sources(&vault.id).await.unwrap();
    assert!(vault_left || sources.is_empty());
    if deleted.is_ok() {
        assert!(!vault_left);
        assert!(created.is_ok() || matches!(created, Err(StoreError::NotFound(_))));
    }
}

#[tokio::test]
async fn test_record_upload_enforces_policy() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let vault = provider.create_vault(&alice, "V", None).await.unwrap();

    let mut too_big = pdf("big.pdf");
    too_big.size_bytes = 11 * 1024 * 1024;
    let err = provider
        .record_upload(&vault.id, &alice, too_big, &UploadPolicy::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let mut image = pdf("cat.png");
    image.content_type = "image/png".to_string();
    assert!(provider
        .record_upload(&vault.id, &alice, image, &UploadPolicy::default())
        .await
        .is_err());

    assert!(provider.list_uploads(&vault.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_source_citation() {
    let provider = provider().await;
    let alice = user(&provider, "alice@example.com").await;
    let vault = provider.create_vault(&alice, "V", None).await.unwrap();
    let source = provider
        .create_source(&vault.id, "S", "https://example.com", None)
        .await
        .unwrap();

    let updated = provider
        .set_source_citation(&source.id, "Doe, J. (2020). S. [PDF Document].")
        .await
        .unwrap();
    assert_eq!(
        updated.citation.as_deref(),
        Some("Doe, J. (2020). S. [PDF Document].")
    );
}
