use crate::collection::MongoCollection;
use crate::config::MongoConfig;
use crate::error::map_error;
use async_trait::async_trait;
use bson::Document;
use docrepo::errors::RepoResult;
use docrepo::store::{Database, DatabaseProvider, DocumentCollection};
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::time::Duration;

/// A MongoDB database seen through the docrepo store abstraction.
///
/// Cloning is cheap; every clone shares the driver's connection pool.
///
/// # Usage
/// ```text
/// let database = MongoDatabase::with_config()
///     .uri("mongodb://localhost:27017")
///     .database("app")
///     .app_name("billing")
///     .build()
///     .await?;
/// let roles = Repository::for_entity(Database::new(database), RepositoryOptions::new());
/// ```
#[derive(Clone)]
pub struct MongoDatabase {
    client: Client,
    database: mongodb::Database,
}

impl MongoDatabase {
    #[inline]
    pub fn with_config() -> MongoDatabaseBuilder {
        MongoDatabaseBuilder::new()
    }

    /// Connects using a prepared configuration.
    pub async fn connect(config: MongoConfig) -> RepoResult<MongoDatabase> {
        config.validate()?;

        let mut options = ClientOptions::parse(config.uri())
            .await
            .map_err(|err| map_error("connection string parsing", config.database(), err))?;
        if let Some(app_name) = config.app_name() {
            options.app_name = Some(app_name.to_string());
        }
        if let Some(timeout) = config.connect_timeout() {
            options.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = config.server_selection_timeout() {
            options.server_selection_timeout = Some(timeout);
        }

        let client = Client::with_options(options)
            .map_err(|err| map_error("client creation", config.database(), err))?;
        log::debug!("Connected MongoDB client for database {}", config.database());
        Ok(MongoDatabase::from_client(client, config.database()))
    }

    /// Wraps an existing driver client.
    pub fn from_client(client: Client, database: &str) -> MongoDatabase {
        let database = client.database(database);
        MongoDatabase { client, database }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Wraps this database in the docrepo [`Database`] handle.
    pub fn into_database(self) -> Database {
        Database::new(self)
    }
}

#[async_trait]
impl DatabaseProvider for MongoDatabase {
    fn name(&self) -> String {
        self.database.name().to_string()
    }

    async fn collection(&self, name: &str) -> RepoResult<DocumentCollection> {
        let collection = self.database.collection::<Document>(name);
        Ok(DocumentCollection::new(MongoCollection::new(collection)))
    }

    async fn list_collection_names(&self) -> RepoResult<Vec<String>> {
        let mut names = self
            .database
            .list_collection_names()
            .await
            .map_err(|err| map_error("list_collection_names", self.database.name(), err))?;
        names.sort();
        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> RepoResult<()> {
        self.database
            .collection::<Document>(name)
            .drop()
            .await
            .map_err(|err| map_error("drop", name, err))
    }
}

/// Builder for [`MongoDatabase`].
pub struct MongoDatabaseBuilder {
    config: MongoConfig,
}

impl MongoDatabaseBuilder {
    #[inline]
    pub fn new() -> MongoDatabaseBuilder {
        MongoDatabaseBuilder {
            config: MongoConfig::default(),
        }
    }

    /// Starts from the `MONGODB_URI` / `MONGODB_DATABASE` environment.
    pub fn from_env() -> RepoResult<MongoDatabaseBuilder> {
        Ok(MongoDatabaseBuilder {
            config: MongoConfig::from_env()?,
        })
    }

    #[inline]
    pub fn uri(mut self, uri: &str) -> Self {
        self.config.set_uri(uri);
        self
    }

    #[inline]
    pub fn database(mut self, database: &str) -> Self {
        self.config.set_database(database);
        self
    }

    #[inline]
    pub fn app_name(mut self, app_name: &str) -> Self {
        self.config.set_app_name(app_name);
        self
    }

    #[inline]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.set_connect_timeout(timeout);
        self
    }

    #[inline]
    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.config.set_server_selection_timeout(timeout);
        self
    }

    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    pub async fn build(self) -> RepoResult<MongoDatabase> {
        MongoDatabase::connect(self.config).await
    }
}

impl Default for MongoDatabaseBuilder {
    fn default() -> Self {
        MongoDatabaseBuilder::new()
    }
}
