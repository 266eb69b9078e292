use docrepo::blocking::{self, new_runtime};
use docrepo::errors::RepoResult;
use docrepo::filter::field;
use docrepo::repository::{FieldKey, Repository, RepositoryOptions};
use docrepo::store::memory::InMemoryDatabase;
use docrepo::store::{Database, SortOrder};
use docrepo_int_test::models::{Role, StockItem};
use docrepo_int_test::test_util::{cleanup, create_test_context};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_blocking_entity_repository() -> RepoResult<()> {
    let runtime = new_runtime()?;
    let ctx = runtime.block_on(create_test_context())?;

    let repo = blocking::Repository::with_runtime(
        Repository::<Role, String>::for_entity(ctx.db(), RepositoryOptions::new()),
        runtime.clone(),
    );

    let alice = repo.insert(Role::new("Alice"))?;
    assert!(!alice.id.is_empty());
    assert_eq!(alice.created, alice.updated);

    let mut renamed = alice.clone();
    renamed.name = "Big Alice".to_string();
    repo.update(renamed)?;

    let found = repo.find_one(field("name").starts_with("Big"))?;
    assert_eq!(found.map(|r| r.id), Some(alice.id.clone()));

    repo.insert_batch(vec![
        Role::with_normalized("Batch One", "batchrole"),
        Role::with_normalized("Batch Two", "batchrole"),
    ])?;
    assert_eq!(repo.list(field("normalized_name").eq("batchrole"))?.len(), 2);
    assert_eq!(repo.count_matching(field("normalized_name").eq("batchrole"))?, 2);

    assert_eq!(repo.delete(&alice.id)?, 1);
    assert_eq!(repo.delete(&alice.id)?, 0);
    assert!(repo.find(&alice.id)?.is_none());

    assert_eq!(repo.delete_all(field("normalized_name").eq("batchrole"))?, 2);
    assert_eq!(repo.count()?, 0);

    runtime.block_on(cleanup(ctx))
}

#[test]
fn test_blocking_query() -> RepoResult<()> {
    let runtime = new_runtime()?;
    let ctx = runtime.block_on(create_test_context())?;

    let repo = blocking::Repository::with_runtime(
        Repository::new(
            ctx.db(),
            FieldKey::new("_id", |item: &StockItem| item.code.clone()),
            RepositoryOptions::new(),
        ),
        runtime.clone(),
    );

    for (code, quantity) in [("A", 5), ("B", 0), ("C", 12), ("D", 3)] {
        repo.upsert(StockItem::new(code, quantity))?;
    }

    let in_stock = repo
        .find_all(field("quantity").gt(0i64))
        .sort_by("quantity", SortOrder::Ascending)
        .skip(1)
        .limit(5);
    let codes: Vec<String> = in_stock.fetch()?.into_iter().map(|item| item.code).collect();
    assert_eq!(codes, vec!["A", "C"]);
    assert_eq!(in_stock.count()?, 2);
    assert_eq!(in_stock.first()?.map(|item| item.code), Some("A".to_string()));

    assert_eq!(repo.all().count()?, 4);
    assert_eq!(repo.clear()?, 4);

    runtime.block_on(cleanup(ctx))
}

#[test]
fn test_blocking_new_owns_runtime() -> RepoResult<()> {
    let database = Database::new(InMemoryDatabase::new("blocking"));
    let repo = blocking::Repository::new(Repository::<Role, String>::for_entity(
        database,
        RepositoryOptions::new(),
    ))?;

    let inserted = repo.insert(Role::new("Solo"))?;
    assert_eq!(repo.find(&inserted.id)?, Some(inserted));
    assert_eq!(repo.count()?, 1);
    Ok(())
}
