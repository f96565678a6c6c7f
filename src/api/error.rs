use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::model::ProgressError;
use crate::prelude::*;
use crate::service::{UpdateProgressError, UploadError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("{message}"))]
    InvalidInput {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Video not found"))]
    VideoNotFound {
        id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("storage is unavailable: {source}"))]
    Storage {
        source: DatabaseQueryError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not store the uploaded file: {source}"))]
    Upload {
        source: UploadError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        InvalidInputSnafu {
            message: message.into(),
        }
        .build()
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::VideoNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Storage { .. } | ApiError::Upload { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn location(&self) -> &Location {
        match self {
            ApiError::InvalidInput { location, .. }
            | ApiError::VideoNotFound { location, .. }
            | ApiError::Storage { location, .. }
            | ApiError::Upload { location, .. } => location,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, location = %self.location(), "request failed");
        } else {
            tracing::warn!(error = %message, location = %self.location(), "request rejected");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError::invalid(error.body_text())
    }
}

impl From<ProgressError> for ApiError {
    fn from(error: ProgressError) -> Self {
        ApiError::invalid(error.to_string())
    }
}

impl From<UpdateProgressError> for ApiError {
    fn from(error: UpdateProgressError) -> Self {
        match error {
            UpdateProgressError::InvalidUpdate { source, .. } => source.into(),
            UpdateProgressError::LoadProgress { source, location, .. }
            | UpdateProgressError::SaveProgress { source, location, .. } => {
                ApiError::Storage { source, location }
            }
        }
    }
}
