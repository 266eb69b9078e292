use async_trait::async_trait;
use docrepo::errors::{ErrorKind, RepoError, RepoResult};
use docrepo::store::{Database, DatabaseProvider, DocumentCollection};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Runs an async test against a fresh database and drops everything it
/// created afterwards, whether the test passed or not.
pub async fn run_test<T, Fut>(test: T)
where
    T: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = RepoResult<()>>,
{
    let ctx = match create_test_context().await {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = test(ctx.clone()).await;
    let after = cleanup(ctx).await;

    if let Err(e) = result {
        panic!("Test failed: {:?}", e);
    }
    if let Err(e) = after {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone, Debug)]
pub struct TestContext {
    name: String,
    database: Database,
}

impl TestContext {
    pub fn new(name: String, database: Database) -> Self {
        Self { name, database }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db(&self) -> Database {
        self.database.clone()
    }
}

pub fn random_name() -> String {
    format!("docrepo_test_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(not(feature = "mongodb"))]
pub async fn create_test_context() -> RepoResult<TestContext> {
    use docrepo::store::memory::InMemoryDatabase;

    let name = random_name();
    let database = Database::new(InMemoryDatabase::new(&name));
    Ok(TestContext::new(name, database))
}

#[cfg(feature = "mongodb")]
pub async fn create_test_context() -> RepoResult<TestContext> {
    use docrepo_mongodb_adapter::{MongoDatabase, DEFAULT_URI, URI_ENV};

    let uri = std::env::var(URI_ENV).unwrap_or_else(|_| DEFAULT_URI.to_string());
    let name = random_name();
    let database = MongoDatabase::with_config()
        .uri(&uri)
        .database(&name)
        .app_name("docrepo_int_test")
        .server_selection_timeout(Duration::from_secs(5))
        .build()
        .await?
        .into_database();
    Ok(TestContext::new(name, database))
}

/// Drops every collection of the test database.
pub async fn cleanup(ctx: TestContext) -> RepoResult<()> {
    let database = ctx.db();
    for name in database.list_collection_names().await? {
        database.drop_collection(&name).await?;
    }
    Ok(())
}

/// Waits long enough for the audit clock to move past the previous stamp.
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// A database whose first `failures` collection lookups fail with a store
/// error; later lookups go to the wrapped database.
pub struct FlakyDatabase {
    inner: Database,
    failures_left: AtomicUsize,
    lookups: Arc<AtomicUsize>,
}

impl FlakyDatabase {
    pub fn new(inner: Database, failures: usize) -> Self {
        FlakyDatabase {
            inner,
            failures_left: AtomicUsize::new(failures),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of collection lookups, failed ones included.
    pub fn lookups(&self) -> Arc<AtomicUsize> {
        self.lookups.clone()
    }
}

#[async_trait]
impl DatabaseProvider for FlakyDatabase {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn collection(&self, name: &str) -> RepoResult<DocumentCollection> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            log::warn!("Simulated failure looking up collection {}", name);
            return Err(RepoError::new(
                &format!("Simulated failure looking up collection {}", name),
                ErrorKind::StoreError,
            ));
        }
        self.inner.collection(name).await
    }

    async fn list_collection_names(&self) -> RepoResult<Vec<String>> {
        self.inner.list_collection_names().await
    }

    async fn drop_collection(&self, name: &str) -> RepoResult<()> {
        self.inner.drop_collection(name).await
    }
}
