use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use url::Url;

use crate::prelude::*;

/// Helper for executing SurrealQL queries with bound parameters.
pub mod query;

/// Typed record ids.
pub mod record;

/// Macros for defining table methods.
pub mod macros;

pub use query::{Bindings, DatabaseQueryError};
pub use record::Record;

/// Number of connection attempts made at startup before giving up.
const CONNECT_ATTEMPTS: usize = 5;

/// A model that is stored in its own table.
pub trait Table {
    /// Returns the name of the table associated with the model.
    fn table() -> &'static str;
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseConnectionError {
    #[snafu(display("cannot connect to the database `{url}`: {source}"))]
    Connect {
        url: Url,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot sign in to the database `{url}` as `{username}`: {source}"))]
    SignIn {
        url: Url,
        username: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot select namespace `{namespace}` and database `{database}`: {source}"))]
    SelectDatabase {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Where and how to reach the database.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SurrealConfig {
    pub url: Url,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<Credentials>,
}

impl SurrealConfig {
    /// A fresh in-memory database. Every connection made from this config gets its own datastore.
    pub fn in_memory() -> SurrealConfig {
        SurrealConfig {
            url: Url::parse("mem://").expect("static url is valid"),
            namespace: "test".to_owned(),
            database: "test".to_owned(),
            credentials: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Represents a database wrapper.
///
/// The connection is constructed once at startup and handed to whatever needs it, cloning is cheap.
#[derive(Debug, Clone, new)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    /// Connects to the database, retrying with an exponential backoff.
    pub async fn connect(config: &SurrealConfig) -> Result<Self, DatabaseConnectionError> {
        let strategy = ExponentialBackoff::from_millis(100)
            .map(jitter)
            .take(CONNECT_ATTEMPTS - 1);

        Retry::spawn(strategy, || async {
            let result = Self::try_connect(config).await;
            if let Err(error) = &result {
                tracing::warn!(%error, url = %config.url, "could not connect to the database");
            }
            result
        })
        .await
    }

    async fn try_connect(config: &SurrealConfig) -> Result<Self, DatabaseConnectionError> {
        let url = &config.url;

        let database = surrealdb::engine::any::connect(url.as_str())
            .await
            .context(ConnectSnafu { url: url.clone() })?;

        if let Some(credentials) = &config.credentials {
            database
                .signin(Root {
                    username: &credentials.username,
                    password: &credentials.password,
                })
                .await
                .context(SignInSnafu {
                    url: url.clone(),
                    username: credentials.username.clone(),
                })?;
        }

        database
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .context(SelectDatabaseSnafu {
                namespace: config.namespace.clone(),
                database: config.database.clone(),
            })?;

        tracing::info!(%url, namespace = %config.namespace, database = %config.database, "connected to the database");

        Ok(Database { database })
    }

    /// Ends the session. Queries made through remaining clones will fail afterwards.
    pub async fn close(self) {
        if let Err(error) = self.database.invalidate().await {
            tracing::warn!(%error, "could not invalidate the database session");
        }

        tracing::info!("database connection closed");
    }

    /// Create a builder to execute arbitrary SurrealQL on the database.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let videos: Vec<Video> = db
    ///     .sql("SELECT * FROM videos WHERE title = $title")
    ///     .bind(("title", "Big Buck Bunny"))
    ///     .fetch_first()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: &str) -> Bindings<'_> {
        Bindings::new(self.database.query(query))
    }
}
