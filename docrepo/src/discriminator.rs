//! Typed registration of several database connections.
//!
//! An application talking to more than one database registers each
//! [`Database`] wrapped in a [`Discriminator`] whose marker type names the
//! connection. Consumers then ask for `Discriminator<Reporting>` rather than
//! for an anonymous database handle, and the compiler keeps the connections
//! apart.
//!
//! ```rust,ignore
//! struct Primary;
//! impl ConnectionMarker for Primary {
//!     const NAME: &'static str = "primary";
//! }
//!
//! let primary = Discriminator::<Primary>::new(database);
//! let roles = primary.repository::<Role>();
//! ```

use crate::entity::MongoEntity;
use crate::repository::{
    EntityQueryRepository, EntityRepository, QueryRepository, Repository, RepositoryOptions,
};
use crate::store::Database;
use std::marker::PhantomData;
use std::ops::Deref;

/// Zero-sized type naming one database connection.
pub trait ConnectionMarker: Send + Sync + 'static {
    /// Readable connection name, used in logs.
    const NAME: &'static str;
}

/// A database handle tagged with the connection it belongs to.
///
/// Immutable once built and cheap to clone. Dereferences to the wrapped
/// [`Database`].
pub struct Discriminator<M> {
    database: Database,
    _marker: PhantomData<fn() -> M>,
}

impl<M: ConnectionMarker> Discriminator<M> {
    pub fn new(database: Database) -> Self {
        log::debug!(
            "Registered connection {} for database {}",
            M::NAME,
            database.name()
        );
        Discriminator {
            database,
            _marker: PhantomData,
        }
    }

    /// Name of the connection marker.
    pub fn connection_name(&self) -> &'static str {
        M::NAME
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Creates an entity repository bound to this connection.
    pub fn repository<E: MongoEntity>(&self) -> EntityRepository<E> {
        self.repository_with(RepositoryOptions::new())
    }

    /// Creates an entity repository bound to this connection with custom options.
    pub fn repository_with<E: MongoEntity>(&self, options: RepositoryOptions<E>) -> EntityRepository<E> {
        Repository::for_entity(self.database.clone(), options)
    }

    /// Creates a read-only entity repository bound to this connection.
    pub fn query_repository<E: MongoEntity>(&self) -> EntityQueryRepository<E> {
        QueryRepository::for_entity(self.database.clone(), RepositoryOptions::new())
    }
}

impl<M> Clone for Discriminator<M> {
    fn clone(&self) -> Self {
        Discriminator {
            database: self.database.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M> Deref for Discriminator<M> {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.database
    }
}

impl<M: ConnectionMarker> std::fmt::Debug for Discriminator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discriminator")
            .field("connection", &M::NAME)
            .field("database", &self.database.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryDatabase;

    struct Primary;

    impl ConnectionMarker for Primary {
        const NAME: &'static str = "primary";
    }

    struct Archive;

    impl ConnectionMarker for Archive {
        const NAME: &'static str = "archive";
    }

    fn assert_send_sync<T: Send + Sync + Clone>() {}

    #[test]
    fn discriminators_keep_their_database() {
        let primary = Discriminator::<Primary>::new(Database::new(InMemoryDatabase::new("main")));
        let archive = Discriminator::<Archive>::new(Database::new(InMemoryDatabase::new("old")));

        assert_eq!(primary.connection_name(), "primary");
        assert_eq!(primary.database().name(), "main");
        assert_eq!(archive.connection_name(), "archive");
        assert_eq!(archive.name(), "old");
        assert_send_sync::<Discriminator<Primary>>();
    }
}
