use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{application::repos::RepoError, config::LoadError, infra::error::InfraError};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Failures surfaced by the llms.txt routes.
#[derive(Debug, Error)]
pub enum LlmsError {
    #[error("resource not found")]
    NotFound,
    #[error("llms.txt generator is disabled")]
    FeatureDisabled,
    #[error("indexing is not allowed")]
    IndexingForbidden,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl LlmsError {
    fn status_code(&self) -> StatusCode {
        match self {
            LlmsError::NotFound | LlmsError::FeatureDisabled => StatusCode::NOT_FOUND,
            LlmsError::IndexingForbidden => StatusCode::FORBIDDEN,
            LlmsError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            LlmsError::NotFound => "Not found",
            LlmsError::FeatureDisabled => "llms.txt generator is disabled",
            LlmsError::IndexingForbidden => "Indexing is not allowed",
            LlmsError::Repo(_) => "Internal server error",
        }
    }
}

impl From<LlmsError> for HttpError {
    fn from(error: LlmsError) -> Self {
        HttpError::from_error(
            "infra::http::llms_error_to_http_error",
            error.status_code(),
            error.presentation_message(),
            &error,
        )
    }
}

impl IntoResponse for LlmsError {
    fn into_response(self) -> Response {
        HttpError::from(self).into_response()
    }
}

/// Process-level failures: startup, configuration and offline rendering.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Llms(#[from] LlmsError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> Self {
        Self::Llms(LlmsError::Repo(error))
    }
}
