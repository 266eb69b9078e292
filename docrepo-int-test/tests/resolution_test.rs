use docrepo::errors::ErrorKind;
use docrepo::filter::field;
use docrepo::index::IndexDefinition;
use docrepo::repository::{EntityRepository, Repository, RepositoryOptions};
use docrepo::store::Database;
use docrepo_int_test::models::Role;
use docrepo_int_test::test_util::{run_test, FlakyDatabase};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[tokio::test]
async fn test_failed_resolution_is_retried() {
    run_test(|ctx| async move {
        let flaky = FlakyDatabase::new(ctx.db(), 1);
        let lookups = flaky.lookups();
        let repo: EntityRepository<Role> =
            Repository::for_entity(Database::new(flaky), RepositoryOptions::new());

        let err = repo.insert(Role::new("First Try")).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreError);
        assert!(!repo.is_resolved());

        let inserted = repo.insert(Role::new("Second Try")).await?;
        assert!(repo.is_resolved());
        assert_eq!(repo.count().await?, 1);
        assert_eq!(repo.find(&inserted.id).await?, Some(inserted));

        // resolved once, then served from the cached handle
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_resolution_is_lazy() {
    run_test(|ctx| async move {
        let flaky = FlakyDatabase::new(ctx.db(), 0);
        let lookups = flaky.lookups();
        let repo: EntityRepository<Role> =
            Repository::for_entity(Database::new(flaky), RepositoryOptions::new());

        let query = repo.find_all(field("name").eq("Nobody"));
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
        assert!(!repo.is_resolved());

        assert!(query.fetch().await?.is_empty());
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_naming_policy_derives_collection_name() {
    run_test(|ctx| async move {
        let repo: EntityRepository<Role> = Repository::for_entity(
            ctx.db(),
            RepositoryOptions::new().naming_policy(|entity| format!("tenant_a_{}", entity)),
        );
        assert_eq!(repo.collection_name(), "tenant_a_roles");

        repo.insert(Role::new("Scoped")).await?;
        let collection = repo.collection().await?;
        assert_eq!(collection.name(), "tenant_a_roles");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_empty_collection_name_is_rejected() {
    run_test(|ctx| async move {
        let repo: EntityRepository<Role> =
            Repository::for_entity(ctx.db(), RepositoryOptions::new().collection_name(""));

        let err = repo.insert(Role::new("Nowhere")).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(!repo.is_resolved());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_index_hook_runs_once() {
    run_test(|ctx| async move {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook_calls = calls.clone();
        let repo: EntityRepository<Role> = Repository::for_entity(
            ctx.db(),
            RepositoryOptions::new()
                .index(IndexDefinition::unique(vec!["name"]))
                .index_hook(move |collection| {
                    let hook_calls = hook_calls.clone();
                    async move {
                        hook_calls.fetch_add(1, Ordering::SeqCst);
                        collection
                            .create_index(&IndexDefinition::non_unique(vec!["created"]))
                            .await
                    }
                }),
        );

        repo.insert(Role::new("Unique")).await?;
        repo.insert(Role::new("Other")).await?;
        assert_eq!(repo.count().await?, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // the option index stands next to the declared one
        let err = repo.insert(Role::new("Unique")).await.unwrap_err();
        assert!(err.is_duplicate_key());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_failing_index_hook_fails_the_operation() {
    run_test(|ctx| async move {
        let attempts = Arc::new(AtomicUsize::new(0));
        let hook_attempts = attempts.clone();
        let repo: EntityRepository<Role> = Repository::for_entity(
            ctx.db(),
            RepositoryOptions::new().index_hook(move |_| {
                let first = hook_attempts.fetch_add(1, Ordering::SeqCst) == 0;
                async move {
                    if first {
                        Err(docrepo::errors::RepoError::new(
                            "index setup refused",
                            ErrorKind::IndexingError,
                        ))
                    } else {
                        Ok(())
                    }
                }
            }),
        );

        let err = repo.count().await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IndexingError);
        assert_eq!(repo.count().await?, 0);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        Ok(())
    })
    .await
}
