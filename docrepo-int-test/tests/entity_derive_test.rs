use chrono::{DateTime, Utc};
use docrepo::entity::{Audited, Entity, MongoEntity};
use docrepo::filter::field;
use docrepo::index::{IndexDefinition, IndexType};
use docrepo::repository::{EntityRepository, Repository, RepositoryOptions};
use docrepo::timestamp;
use docrepo_int_test::models::{Role, User};
use docrepo_int_test::test_util::{run_test, tick};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;

#[ctor::ctor]
fn init() {
    colog::init();
}

fn users(db: docrepo::store::Database) -> EntityRepository<User> {
    Repository::for_entity(
        db,
        RepositoryOptions::new()
            .before_insert(|user: &mut User| user.email = user.email.trim().to_lowercase())
            .before_update(|user: &mut User| user.email = user.email.trim().to_lowercase()),
    )
}

#[test]
fn test_derived_entity_metadata() {
    assert_eq!(Role::entity_name(), "roles");
    assert_eq!(
        Role::entity_indexes(),
        vec![IndexDefinition::new(vec!["normalized_name"], IndexType::NonUnique)]
    );

    assert_eq!(User::entity_name(), "users");
    let indexes = User::entity_indexes();
    assert_eq!(indexes.len(), 1);
    assert!(indexes[0].is_unique());
    assert_eq!(indexes[0].field_names(), &["email".to_string()]);
}

#[test]
fn test_derived_entity_defaults_to_type_name() {
    #[derive(serde::Serialize, serde::Deserialize, docrepo_derive::Entity)]
    struct Invoice {
        number: i64,
    }

    assert_eq!(Invoice::entity_name(), "Invoice");
    assert!(Invoice::entity_indexes().is_empty());
}

#[test]
fn test_derived_mongo_entity_accessors() {
    let mut user = User::new("ada@example.com", "Ada", 36);
    assert_eq!(user.id(), "");
    assert!(timestamp::is_zero(&user.created()));

    user.set_id("user-1".to_string());
    let now = timestamp::now();
    user.set_created(now);
    user.set_updated(now);

    assert_eq!(user.id, "user-1");
    assert_eq!(user.created_at, now);
    assert_eq!(user.updated_at, now);
}

#[test]
fn test_derived_mongo_entity_with_compound_index() {
    #[derive(serde::Serialize, serde::Deserialize, docrepo_derive::Entity, docrepo_derive::MongoEntity)]
    #[entity(
        name = "memberships",
        index(type = "unique", fields = "team, member"),
        index(type = "non-unique", fields = "member")
    )]
    struct Membership {
        #[serde(rename = "_id")]
        id: String,
        team: String,
        member: String,
        #[serde(with = "docrepo::timestamp")]
        created: DateTime<Utc>,
        #[serde(with = "docrepo::timestamp")]
        updated: DateTime<Utc>,
    }

    let indexes = Membership::entity_indexes();
    assert_eq!(indexes.len(), 2);
    assert_eq!(indexes[0].name(), "team_1_member_1");
    assert!(indexes[0].is_unique());
    assert_eq!(indexes[1].name(), "member_1");
    assert!(!indexes[1].is_unique());
}

#[tokio::test]
async fn test_custom_timestamp_fields_are_stamped() {
    run_test(|ctx| async move {
        let repo = users(ctx.db());

        let inserted = repo.insert(User::new("grace@example.com", "Grace", 45)).await?;
        assert!(!timestamp::is_zero(&inserted.created_at));
        assert_eq!(inserted.created_at, inserted.updated_at);
        tick().await;

        let mut older = inserted.clone();
        older.age = 46;
        let updated = repo.update(older).await?;
        assert_eq!(updated.created_at, inserted.created_at);
        assert!(updated.updated_at > inserted.updated_at);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_hooks_normalize_before_write() {
    run_test(|ctx| async move {
        let repo = users(ctx.db());

        let inserted = repo.insert(User::new("  Linus@Example.COM ", "Linus", 54)).await?;
        assert_eq!(inserted.email, "linus@example.com");

        let mut changed = inserted.clone();
        changed.email = "LINUS@KERNEL.ORG".to_string();
        repo.update(changed).await?;

        let stored = repo
            .find_one(field("email").eq("linus@kernel.org"))
            .await?
            .expect("user should be found by normalized email");
        assert_eq!(stored.id, inserted.id);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_unique_index_rejects_duplicates() {
    run_test(|ctx| async move {
        let repo = users(ctx.db());

        repo.insert(User::new("barbara@example.com", "Barbara", 30)).await?;
        // normalized by the hook to the taken address
        let err = repo
            .insert(User::new("Barbara@Example.com", "Other Barbara", 31))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(repo.count().await?, 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_generated_users_round_trip() {
    run_test(|ctx| async move {
        let repo = users(ctx.db());

        let mut generated = Vec::new();
        for i in 0..20 {
            let email: String = SafeEmail().fake();
            let name: String = Name().fake();
            // prefix keeps generated addresses distinct
            generated.push(User::new(&format!("{}.{}", i, email), &name, 18 + i));
        }
        let inserted = repo.insert_batch(generated).await?;
        assert_eq!(repo.count().await?, 20);

        for user in &inserted {
            let found = repo.find(&user.id).await?;
            assert_eq!(found.as_ref(), Some(user));
        }

        let adults = repo.count_matching(field("age").gte(30)).await?;
        assert_eq!(adults, 8);
        Ok(())
    })
    .await
}
