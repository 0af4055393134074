// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AuthState, ResultSet, ScreenDescriptor};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub auth: AuthState,
    pub loading: bool,
    pub screens: Vec<ScreenDescriptor>,
    pub active_screen: String,
    pub results: ResultSet,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SetAuth(AuthState),
    SetLoading(bool),
    ReplaceScreens(Vec<ScreenDescriptor>),
    SelectScreen(String),
    ClearResults,
    ReplaceResults(ResultSet),
    ShowNotice(String),
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    AuthChanged(AuthState),
    LoadingChanged(bool),
    ScreensReplaced(usize),
    ActiveScreenChanged(String),
    ResultsCleared,
    ResultsReplaced(usize),
    NoticeShown(String),
    NoticeDismissed,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SetAuth(auth) => {
                if self.auth == auth {
                    return Vec::new();
                }
                self.auth = auth;
                vec![AppEvent::AuthChanged(auth)]
            }
            AppCommand::SetLoading(loading) => {
                if self.loading == loading {
                    return Vec::new();
                }
                self.loading = loading;
                vec![AppEvent::LoadingChanged(loading)]
            }
            AppCommand::ReplaceScreens(screens) => {
                self.screens = screens;
                vec![AppEvent::ScreensReplaced(self.screens.len())]
            }
            AppCommand::SelectScreen(name) => {
                self.active_screen = name.clone();
                vec![AppEvent::ActiveScreenChanged(name)]
            }
            AppCommand::ClearResults => {
                self.results.clear();
                vec![AppEvent::ResultsCleared]
            }
            AppCommand::ReplaceResults(results) => {
                self.results = results;
                vec![AppEvent::ResultsReplaced(self.results.len())]
            }
            AppCommand::ShowNotice(message) => {
                self.notice = Some(message.clone());
                vec![AppEvent::NoticeShown(message)]
            }
            AppCommand::DismissNotice => {
                if self.notice.take().is_none() {
                    return Vec::new();
                }
                vec![AppEvent::NoticeDismissed]
            }
        }
    }

    pub fn has_active_screen(&self) -> bool {
        !self.active_screen.is_empty()
    }
}

/// Observable wrapper around [`AppState`].
///
/// Every mutation goes through [`Store::dispatch`]; the resulting events are
/// fanned out to all live subscribers in order.
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
    subscribers: Vec<Sender<AppEvent>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn subscribe(&mut self) -> Receiver<AppEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        let events = self.state.dispatch(command);
        self.notify(&events);
        events
    }

    fn notify(&mut self, events: &[AppEvent]) {
        if events.is_empty() {
            return;
        }
        // dropped receivers fall out here
        self.subscribers.retain(|subscriber| {
            events
                .iter()
                .all(|event| subscriber.send(event.clone()).is_ok())
        });
    }
}
