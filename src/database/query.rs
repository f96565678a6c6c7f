use serde::de::DeserializeOwned;
use surrealdb::engine::any::Any;
use surrealdb::opt::QueryResult;

use crate::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseQueryError {
    #[snafu(display("failed to execute the query: {source}"))]
    MalformedQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read statement {statement} of the response: {source}"))]
    Statement {
        statement: usize,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("expected a result but the query returned none"))]
    NoResults {
        #[snafu(implicit)]
        location: Location,
    },
}

/// A pending query. Parameters can be bound using [Bindings::bind] which takes any serializable data structure.
///
/// # Example
/// ```ignore
/// let progress: Option<Progress> = database.sql("SELECT * FROM $record")
///     .bind(("record", record))
///     .fetch_first()
///     .await?;
/// ```
#[derive(Debug, new)]
pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, Any>,
}

impl Bindings<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the query and return a [surrealdb::Response] which is SurrealDB's way to represent a list of statements returned from the database.
    pub async fn execute(self) -> Result<surrealdb::Response, DatabaseQueryError> {
        let response = self.query.await.context(MalformedQuerySnafu)?;
        tracing::debug!(?response, "executed query");
        Ok(response)
    }

    /// Execute the query and return the first statement as a deserialized value.
    ///
    /// `T` is usually `Vec<_>` for many rows or `Option<_>` for at most one.
    pub async fn fetch_first<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError>
    where
        usize: QueryResult<T>,
    {
        let mut response = self.execute().await?;
        response.take::<T>(0).context(StatementSnafu { statement: 0usize })
    }
}
