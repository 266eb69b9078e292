use docrepo::cancel::{run_cancellable, Cancellable, CancellationToken};
use docrepo::errors::ErrorKind;
use docrepo::filter::all;
use docrepo::repository::{EntityRepository, Repository, RepositoryOptions};
use docrepo::store::memory::InMemoryDatabase;
use docrepo::store::Database;
use docrepo_int_test::models::Role;
use docrepo_int_test::test_util::run_test;
use std::time::Duration;

#[ctor::ctor]
fn init() {
    colog::init();
}

fn slow_roles(latency: Duration) -> EntityRepository<Role> {
    let database = InMemoryDatabase::builder()
        .name("slow")
        .latency(latency)
        .build();
    Repository::for_entity(Database::new(database), RepositoryOptions::new())
}

#[tokio::test]
async fn test_cancelled_token_stops_before_store_call() {
    run_test(|ctx| async move {
        let repo: EntityRepository<Role> = Repository::for_entity(ctx.db(), RepositoryOptions::new());
        let token = CancellationToken::new();
        token.cancel();

        let err = repo
            .insert(Role::new("Never"))
            .with_cancellation(&token)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.kind(), &ErrorKind::Cancelled);

        // nothing was written and the repository stays usable
        assert_eq!(repo.count().await?, 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_cancel_while_waiting_on_store() {
    let repo = slow_roles(Duration::from_millis(500));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = repo.list(all()).with_cancellation(&token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_uncancelled_operation_completes() {
    let repo = slow_roles(Duration::from_millis(5));
    let token = CancellationToken::new();

    let inserted = repo
        .insert(Role::new("Patient"))
        .with_cancellation(&token)
        .await
        .unwrap();
    let found = run_cancellable(&token, repo.find(&inserted.id)).await.unwrap();
    assert_eq!(found, Some(inserted));
}

#[tokio::test]
async fn test_child_token_cancels_with_parent() {
    let repo = slow_roles(Duration::from_millis(500));
    let parent = CancellationToken::new();
    let child = parent.child_token();

    let pending = tokio::spawn({
        let repo = repo.clone();
        async move { repo.count().with_cancellation(&child).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    parent.cancel();

    let result = pending.await.unwrap();
    assert!(result.unwrap_err().is_cancelled());
}
