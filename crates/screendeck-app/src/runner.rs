// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppCommand, RequestId, ResultSet, ScreenDescriptor, ServiceError, Store};
use tracing::{debug, warn};

pub const RUN_FAILED_MESSAGE: &str = "Failed to fetch data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResolution {
    Applied(usize),
    Failed,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResolution {
    Applied(usize),
    Failed,
    Stale,
}

/// Lists saved screens and runs one at a time.
///
/// Each fetch and run carries a request id; only the most recently issued id
/// of each kind may apply its completion. Older completions are dropped so a
/// slow response can never land under a newer selection.
#[derive(Debug, Default)]
pub struct ScreenRunner {
    fetch_in_flight: Option<RequestId>,
    run_in_flight: Option<RequestId>,
}

impl ScreenRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.run_in_flight.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_in_flight.is_some()
    }

    pub fn begin_fetch(&mut self, request_id: RequestId) {
        if let Some(previous) = self.fetch_in_flight.replace(request_id) {
            debug!(previous, request_id, "screen list fetch superseded");
        }
    }

    pub fn finish_fetch(
        &mut self,
        store: &mut Store,
        request_id: RequestId,
        result: Result<Vec<ScreenDescriptor>, ServiceError>,
    ) -> FetchResolution {
        if self.fetch_in_flight != Some(request_id) {
            debug!(request_id, "dropping stale screen list");
            return FetchResolution::Stale;
        }
        self.fetch_in_flight = None;

        match result {
            Ok(screens) => {
                let count = screens.len();
                debug!(count, "screen list replaced");
                store.dispatch(AppCommand::ReplaceScreens(screens));
                FetchResolution::Applied(count)
            }
            Err(error) => {
                // list refresh failures stay out of the user's way
                warn!(%error, "screen list fetch failed");
                FetchResolution::Failed
            }
        }
    }

    /// Selects `name` and clears the previous rows before any I/O happens.
    pub fn begin_run(&mut self, store: &mut Store, request_id: RequestId, name: &str) {
        if let Some(previous) = self.run_in_flight.replace(request_id) {
            debug!(previous, request_id, "run superseded");
        }
        store.dispatch(AppCommand::SetLoading(true));
        store.dispatch(AppCommand::SelectScreen(name.to_owned()));
        store.dispatch(AppCommand::ClearResults);
    }

    pub fn finish_run(
        &mut self,
        store: &mut Store,
        request_id: RequestId,
        result: Result<ResultSet, ServiceError>,
    ) -> RunResolution {
        if self.run_in_flight != Some(request_id) {
            debug!(request_id, "dropping stale run result");
            return RunResolution::Stale;
        }
        self.run_in_flight = None;

        match result {
            Ok(rows) => {
                let count = rows.len();
                store.dispatch(AppCommand::ReplaceResults(rows));
                RunResolution::Applied(count)
            }
            Err(error) => {
                warn!(%error, screen = %store.state().active_screen, "run failed");
                store.dispatch(AppCommand::ShowNotice(RUN_FAILED_MESSAGE.to_owned()));
                RunResolution::Failed
            }
        }
    }
}
