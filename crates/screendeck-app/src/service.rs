// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Credentials, ResultSet, ScreenDescriptor};
use thiserror::Error;

pub const LOGIN_SUCCESS_STATUS: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Rejected(String),

    #[error("cannot reach screen service: {0}")]
    Connectivity(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("run failed: {0}")]
    RunFailed(String),
}

/// Decoded body of a login exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReply {
    pub status: String,
    pub message: Option<String>,
}

impl LoginReply {
    pub fn success() -> Self {
        Self {
            status: LOGIN_SUCCESS_STATUS.to_owned(),
            message: None,
        }
    }

    pub fn rejected(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == LOGIN_SUCCESS_STATUS
    }

    /// Collapses the reply into success or [`ServiceError::Rejected`].
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_success() {
            return Ok(());
        }
        let message = self
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "no reason given".to_owned());
        Err(ServiceError::Rejected(message))
    }
}

/// Remote collaborator that owns the wire format.
///
/// Implementations block; the controller calls them from worker threads.
pub trait ScreenService: Send + Sync + 'static {
    fn login(&self, credentials: &Credentials) -> Result<LoginReply, ServiceError>;
    fn list_screens(&self) -> Result<Vec<ScreenDescriptor>, ServiceError>;
    fn run_screen(&self, url: &str) -> Result<ResultSet, ServiceError>;
}
