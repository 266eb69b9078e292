use docrepo::filter::{all, field};
use docrepo::repository::{EntityRepository, Repository, RepositoryOptions};
use docrepo::store::SortOrder;
use docrepo::timestamp;
use docrepo_int_test::models::Role;
use docrepo_int_test::test_util::{run_test, tick};
use futures::TryStreamExt;

#[ctor::ctor]
fn init() {
    colog::init();
}

fn roles(db: docrepo::store::Database) -> EntityRepository<Role> {
    Repository::for_entity(db, RepositoryOptions::new())
}

// =============================================================================
// ROUND TRIP AND AUDIT TIMESTAMPS
// =============================================================================

#[tokio::test]
async fn test_insert_then_find_round_trip() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let inserted = repo.insert(Role::new("Admin")).await?;
        assert!(!inserted.id.is_empty());
        assert!(!timestamp::is_zero(&inserted.created));
        assert_eq!(inserted.created, inserted.updated);

        let found = repo.find(&inserted.id).await?;
        assert_eq!(found, Some(inserted));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_insert_keeps_caller_id() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let mut role = Role::new("Auditor");
        role.id = "role-auditor".to_string();
        let inserted = repo.insert(role).await?;
        assert_eq!(inserted.id, "role-auditor");

        let found = repo.find(&"role-auditor".to_string()).await?;
        assert_eq!(found.map(|r| r.name), Some("Auditor".to_string()));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_preserves_created() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let inserted = repo.insert(Role::new("Editor")).await?;
        let t0 = inserted.created;
        tick().await;

        let mut renamed = inserted.clone();
        renamed.name = "Chief Editor".to_string();
        let updated = repo.update(renamed).await?;
        assert_eq!(updated.created, t0);
        assert!(updated.updated > t0);

        let stored = repo.find(&inserted.id).await?.expect("role should exist");
        assert_eq!(stored.name, "Chief Editor");
        assert_eq!(stored.created, t0);
        assert_eq!(stored.updated, updated.updated);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_upsert_inserts_missing_record() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let mut role = Role::new("Guest");
        role.id = "role-guest".to_string();
        let upserted = repo.upsert(role).await?;
        assert!(!timestamp::is_zero(&upserted.created));
        assert_eq!(upserted.created, upserted.updated);

        assert_eq!(repo.count().await?, 1);
        let stored = repo.find(&"role-guest".to_string()).await?;
        assert_eq!(stored, Some(upserted));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_upsert_replaces_existing_record() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let inserted = repo.insert(Role::new("Viewer")).await?;
        tick().await;

        let mut changed = inserted.clone();
        changed.name = "Read Only".to_string();
        let upserted = repo.upsert(changed).await?;
        assert_eq!(upserted.created, inserted.created);
        assert!(upserted.updated > inserted.updated);

        assert_eq!(repo.count().await?, 1);
        let stored = repo.find(&inserted.id).await?.expect("role should exist");
        assert_eq!(stored.name, "Read Only");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_of_missing_record_writes_nothing() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let mut ghost = Role::new("Ghost");
        ghost.id = "role-ghost".to_string();
        repo.update(ghost).await?;

        assert_eq!(repo.count().await?, 0);
        assert!(repo.find(&"role-ghost".to_string()).await?.is_none());
        Ok(())
    })
    .await
}

// =============================================================================
// KEYS AND DELETION
// =============================================================================

#[tokio::test]
async fn test_delete_is_idempotent() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let inserted = repo.insert(Role::new("Temp")).await?;
        assert_eq!(repo.delete(&inserted.id).await?, 1);
        assert_eq!(repo.delete(&inserted.id).await?, 0);
        assert_eq!(repo.delete(&"never-existed".to_string()).await?, 0);
        assert!(repo.find(&inserted.id).await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_delete_entity_uses_its_key() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let keep = repo.insert(Role::new("Keep")).await?;
        let drop = repo.insert(Role::new("Drop")).await?;
        assert_eq!(repo.delete_entity(&drop).await?, 1);

        let remaining = repo.list(all()).await?;
        assert_eq!(remaining, vec![keep]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_key_filter_matches_only_its_entity() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let mut inserted = Vec::new();
        for name in ["Alpha", "Beta", "Gamma"] {
            inserted.push(repo.insert(Role::new(name)).await?);
        }

        for role in &inserted {
            let filter = repo.key_filter(&repo.key_of(role));
            let matches = repo.list(filter).await?;
            assert_eq!(matches, vec![role.clone()]);
        }
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_unset_key_is_rejected() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let err = repo.find(&String::new()).await.unwrap_err();
        assert!(err.is_invalid_argument());

        let err = repo.delete(&String::new()).await.unwrap_err();
        assert!(err.is_invalid_argument());

        let err = repo.update(Role::new("No Id")).await.unwrap_err();
        assert!(err.is_invalid_argument());

        let err = repo.upsert(Role::new("No Id")).await.unwrap_err();
        assert!(err.is_invalid_argument());

        assert_eq!(repo.count().await?, 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let first = repo.insert(Role::new("Owner")).await?;
        let mut clash = Role::new("Impostor");
        clash.id = first.id.clone();

        let err = repo.insert(clash).await.unwrap_err();
        assert!(err.is_duplicate_key());

        let stored = repo.find(&first.id).await?.expect("role should exist");
        assert_eq!(stored.name, "Owner");
        Ok(())
    })
    .await
}

// =============================================================================
// PREDICATE QUERIES
// =============================================================================

#[tokio::test]
async fn test_find_all_agrees_with_count() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        for i in 0..10 {
            let prefix = if i % 3 == 0 { "ops" } else { "dev" };
            repo.insert(Role::new(&format!("{}-{}", prefix, i))).await?;
        }

        let predicate = field("normalized_name").starts_with("ops");
        let matching = repo.list(predicate.clone()).await?;
        assert_eq!(matching.len(), 4);
        assert!(matching.iter().all(|r| r.normalized_name.starts_with("ops")));
        assert_eq!(repo.count_matching(predicate).await?, 4);
        assert_eq!(repo.count().await?, 10);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_one_returns_none_without_match() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        repo.insert(Role::new("Present")).await?;
        let missing = repo.find_one(field("name").eq("Absent")).await?;
        assert!(missing.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_query_is_lazy_and_composable() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        // built before any record exists, evaluated at fetch time
        let query = repo
            .find_all(field("normalized_name").ne("x"))
            .filter(field("name").regex("^[a-e]$"))
            .sort_by("name", SortOrder::Descending)
            .skip(1)
            .limit(2);

        for name in ["a", "b", "c", "d", "e", "f"] {
            repo.insert(Role::new(name)).await?;
        }

        let names: Vec<String> = query.fetch().await?.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["d", "c"]);
        assert_eq!(query.count().await?, 2);

        let first = query.first().await?.map(|r| r.name);
        assert_eq!(first, Some("d".to_string()));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_query_stream_yields_entities() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        for name in ["one", "two", "three"] {
            repo.insert(Role::new(name)).await?;
        }

        let streamed: Vec<Role> = repo
            .all()
            .sort_by("name", SortOrder::Ascending)
            .stream()
            .await?
            .try_collect()
            .await?;
        let names: Vec<&str> = streamed.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["one", "three", "two"]);
        Ok(())
    })
    .await
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[tokio::test]
async fn test_rename_scenario() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let alice = repo.insert(Role::new("Alice")).await?;
        assert!(!alice.id.is_empty());
        assert_eq!(alice.created, alice.updated);
        tick().await;

        let mut renamed = alice.clone();
        renamed.name = "Big Alice".to_string();
        repo.update(renamed).await?;

        let found = repo
            .find_one(field("name").starts_with("Big"))
            .await?
            .expect("renamed role should be found");
        assert_eq!(found.id, alice.id);
        assert_eq!(found.name, "Big Alice");
        assert_eq!(found.created, alice.created);
        assert!(found.updated > alice.updated);

        assert_eq!(repo.delete(&alice.id).await?, 1);
        assert!(repo.find(&alice.id).await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_batch_scenario() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let batch = vec![
            Role::with_normalized("Batch One", "batchrole"),
            Role::with_normalized("Batch Two", "batchrole"),
        ];
        let inserted = repo.insert_batch(batch).await?;
        assert_eq!(inserted.len(), 2);
        assert!(inserted.iter().all(|r| !r.id.is_empty()));
        assert_ne!(inserted[0].id, inserted[1].id);
        assert!(inserted.iter().all(|r| r.created == r.updated));

        let found = repo.list(field("normalized_name").eq("batchrole")).await?;
        assert_eq!(found.len(), 2);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_empty_batch_touches_nothing() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let inserted = repo.insert_batch(Vec::new()).await?;
        assert!(inserted.is_empty());
        assert!(!repo.is_resolved());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_batch_with_duplicate_keeps_prefix() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        let mut first = Role::new("First");
        first.id = "dup-1".to_string();
        let mut second = Role::new("Second");
        second.id = "dup-1".to_string();
        let mut third = Role::new("Third");
        third.id = "dup-3".to_string();

        let err = repo.insert_batch(vec![first, second, third]).await.unwrap_err();
        assert!(err.is_duplicate_key());

        let stored = repo.find(&"dup-1".to_string()).await?.expect("first should be stored");
        assert_eq!(stored.name, "First");
        assert!(repo.find(&"dup-3".to_string()).await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_bulk_delete_scenario() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());

        repo.insert(Role::with_normalized("Delete Me", "deleterole")).await?;
        repo.insert(Role::with_normalized("Keep Me", "keeprole")).await?;

        let predicate = field("normalized_name").eq("deleterole");
        let removed = repo.delete_all(predicate.clone()).await?;
        assert!(removed >= 1);
        assert!(repo.list(predicate).await?.is_empty());
        assert_eq!(repo.count().await?, 1);

        assert_eq!(repo.clear().await?, 1);
        assert_eq!(repo.count().await?, 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_collection_appears_after_first_write() {
    run_test(|ctx| async move {
        let repo = roles(ctx.db());
        assert_eq!(repo.collection_name(), "roles");

        repo.insert(Role::new("Anyone")).await?;
        let names = ctx.db().list_collection_names().await?;
        assert!(names.contains(&"roles".to_string()));
        Ok(())
    })
    .await
}
