pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logger;
pub mod model;
pub mod service;

pub use error::InitError;

pub mod prelude {
    pub use derive_new::new;
    pub use serde::{Deserialize, Serialize};
    pub use snafu::{ensure, Location, OptionExt as _, ResultExt as _, Snafu};

    pub(crate) use crate::database::query::NoResultsSnafu;
    pub use crate::database::{Database, DatabaseQueryError, Record, Table};
    pub use crate::model::{now, Timestamp};
    pub use crate::{define_relation, define_table};
}
