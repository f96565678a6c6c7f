use std::net::SocketAddr;
use std::path::PathBuf;

use snafu::{Location, Snafu};

use crate::database::DatabaseConnectionError;
use crate::service::uploads::UploadError;

/// Everything that can stop the service from starting or serving.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum InitError {
    #[snafu(display("could not read the configuration from the environment: {source}"))]
    Config {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not initialize the logger: {source}"))]
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not connect to the database: {source}"))]
    ConnectDatabase {
        source: DatabaseConnectionError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not prepare the upload directory `{}`: {source}", path.display()))]
    UploadDirectory {
        path: PathBuf,
        source: UploadError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    #[snafu(display("could not bind to {address}, check if it's already in use: {source}"))]
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not serve the application: {source}"))]
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}
