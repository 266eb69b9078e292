use docrepo::errors::{ErrorKind, RepoError, RepoResult};
use std::time::Duration;

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const URI_ENV: &str = "MONGODB_URI";
pub const DATABASE_ENV: &str = "MONGODB_DATABASE";

/// Connection settings of a [`MongoDatabase`](crate::MongoDatabase).
///
/// Only the settings a repository layer cares about live here; pooling,
/// retries and TLS come from the connection string and are handled by the
/// driver.
#[derive(Debug, Clone, PartialEq)]
pub struct MongoConfig {
    uri: String,
    database: String,
    app_name: Option<String>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
}

impl MongoConfig {
    pub fn new(uri: &str, database: &str) -> MongoConfig {
        MongoConfig {
            uri: uri.to_string(),
            database: database.to_string(),
            app_name: None,
            connect_timeout: None,
            server_selection_timeout: None,
        }
    }

    /// Reads `MONGODB_URI` (default `mongodb://localhost:27017`) and
    /// `MONGODB_DATABASE` from the environment.
    ///
    /// # Errors
    /// * `InvalidArgument` if `MONGODB_DATABASE` is missing or empty
    pub fn from_env() -> RepoResult<MongoConfig> {
        let uri = std::env::var(URI_ENV).unwrap_or_else(|_| DEFAULT_URI.to_string());
        let database = std::env::var(DATABASE_ENV).unwrap_or_default();
        let config = MongoConfig::new(&uri, &database);
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline]
    pub fn database(&self) -> &str {
        &self.database
    }

    #[inline]
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    #[inline]
    pub fn server_selection_timeout(&self) -> Option<Duration> {
        self.server_selection_timeout
    }

    pub(crate) fn set_uri(&mut self, uri: &str) {
        self.uri = uri.to_string();
    }

    pub(crate) fn set_database(&mut self, database: &str) {
        self.database = database.to_string();
    }

    pub(crate) fn set_app_name(&mut self, app_name: &str) {
        self.app_name = Some(app_name.to_string());
    }

    pub(crate) fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = Some(timeout);
    }

    pub(crate) fn set_server_selection_timeout(&mut self, timeout: Duration) {
        self.server_selection_timeout = Some(timeout);
    }

    pub(crate) fn validate(&self) -> RepoResult<()> {
        if self.uri.is_empty() {
            log::error!("MongoDB connection string is empty");
            return Err(RepoError::new(
                "MongoDB connection string cannot be empty",
                ErrorKind::InvalidArgument,
            ));
        }
        if self.database.is_empty() {
            log::error!("MongoDB database name is empty");
            return Err(RepoError::new(
                &format!("MongoDB database name cannot be empty, set it or {}", DATABASE_ENV),
                ErrorKind::InvalidArgument,
            ));
        }
        Ok(())
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig::new(DEFAULT_URI, "")
    }
}
