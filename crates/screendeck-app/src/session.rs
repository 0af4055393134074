// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppCommand, AuthState, LoginReply, ServiceError, Store};
use tracing::{debug, info, warn};

pub type RequestId = u64;

pub const LOGIN_FAILED_PREFIX: &str = "Login failed: ";
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Connection error. Check that [api].base_url points at a reachable screen service.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginResolution {
    Authenticated,
    Rejected,
    Unreachable,
    Stale,
}

/// Gates the rest of the app behind one successful login exchange.
///
/// Owns only the in-flight login id; the observable auth state lives in the
/// [`Store`].
#[derive(Debug, Default)]
pub struct SessionManager {
    in_flight: Option<RequestId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Moves `Unauthenticated -> Authenticating`. Returns false, touching
    /// nothing, when a login is already in flight or the session is open.
    pub fn begin(&mut self, store: &mut Store, request_id: RequestId) -> bool {
        let auth = store.state().auth;
        if auth != AuthState::Unauthenticated {
            debug!(state = auth.as_str(), "login ignored");
            return false;
        }

        self.in_flight = Some(request_id);
        store.dispatch(AppCommand::SetLoading(true));
        store.dispatch(AppCommand::SetAuth(AuthState::Authenticating));
        true
    }

    pub fn finish(
        &mut self,
        store: &mut Store,
        request_id: RequestId,
        result: Result<LoginReply, ServiceError>,
    ) -> LoginResolution {
        if self.in_flight != Some(request_id) {
            debug!(request_id, "dropping stale login completion");
            return LoginResolution::Stale;
        }
        self.in_flight = None;

        match result.and_then(LoginReply::into_result) {
            Ok(()) => {
                info!("login accepted");
                store.dispatch(AppCommand::SetAuth(AuthState::Authenticated));
                LoginResolution::Authenticated
            }
            Err(ServiceError::Rejected(message)) => {
                warn!(reason = %message, "login rejected");
                store.dispatch(AppCommand::SetAuth(AuthState::Unauthenticated));
                store.dispatch(AppCommand::ShowNotice(format!(
                    "{LOGIN_FAILED_PREFIX}{message}"
                )));
                LoginResolution::Rejected
            }
            Err(error) => {
                warn!(%error, "login exchange failed");
                store.dispatch(AppCommand::SetAuth(AuthState::Unauthenticated));
                store.dispatch(AppCommand::ShowNotice(CONNECTION_ERROR_MESSAGE.to_owned()));
                LoginResolution::Unreachable
            }
        }
    }
}
