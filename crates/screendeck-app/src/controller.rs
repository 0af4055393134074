// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AppCommand, AppEvent, AppState, Credentials, LoginReply, LoginResolution, RequestId,
    ResultSet, ScreenDescriptor, ScreenRunner, ScreenService, ServiceError, SessionManager, Store,
};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of one network call, tagged with the id it was issued under.
#[derive(Debug)]
pub enum Completion {
    Login {
        request_id: RequestId,
        result: Result<LoginReply, ServiceError>,
    },
    Screens {
        request_id: RequestId,
        result: Result<Vec<ScreenDescriptor>, ServiceError>,
    },
    Run {
        request_id: RequestId,
        result: Result<ResultSet, ServiceError>,
    },
}

impl Completion {
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Login { request_id, .. }
            | Self::Screens { request_id, .. }
            | Self::Run { request_id, .. } => *request_id,
        }
    }
}

pub type AuthenticatedHook<S> = Box<dyn FnMut(&mut Controller<S>)>;

/// Owns the store and drives the session manager and screen runner.
///
/// Network calls run on worker threads; their completions come back over a
/// channel and are applied only on the thread that owns the controller, via
/// [`Controller::process_completions`] or the blocking wait helpers.
pub struct Controller<S: ScreenService> {
    service: Arc<S>,
    store: Store,
    session: SessionManager,
    runner: ScreenRunner,
    authenticated_hooks: Vec<AuthenticatedHook<S>>,
    next_request_id: RequestId,
    outstanding: usize,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl<S: ScreenService> Controller<S> {
    pub fn new(service: S) -> Self {
        Self::with_shared_service(Arc::new(service))
    }

    pub fn with_shared_service(service: Arc<S>) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut controller = Self {
            service,
            store: Store::new(),
            session: SessionManager::new(),
            runner: ScreenRunner::new(),
            authenticated_hooks: Vec::new(),
            next_request_id: 0,
            outstanding: 0,
            tx,
            rx,
        };
        controller.on_authenticated(Self::fetch_screens);
        controller
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn subscribe(&mut self) -> Receiver<AppEvent> {
        self.store.subscribe()
    }

    /// Registers a hook fired once per successful login, after the auth state
    /// flips. The list fetch is always the first hook.
    pub fn on_authenticated<F>(&mut self, hook: F)
    where
        F: FnMut(&mut Self) + 'static,
    {
        self.authenticated_hooks.push(Box::new(hook));
    }

    /// Starts a login. Returns false when the attempt was ignored because one
    /// is already in flight or the session is already open.
    pub fn login(&mut self, credentials: Credentials) -> bool {
        let request_id = self.issue_request_id();
        if !self.session.begin(&mut self.store, request_id) {
            return false;
        }
        debug!(request_id, "login started");
        self.spawn(move |service| Completion::Login {
            request_id,
            result: service.login(&credentials),
        });
        true
    }

    pub fn fetch_screens(&mut self) {
        let request_id = self.issue_request_id();
        self.runner.begin_fetch(request_id);
        debug!(request_id, "screen list fetch started");
        self.spawn(move |service| Completion::Screens {
            request_id,
            result: service.list_screens(),
        });
    }

    pub fn run(&mut self, url: &str, name: &str) {
        let request_id = self.issue_request_id();
        self.runner.begin_run(&mut self.store, request_id, name);
        debug!(request_id, screen = name, "run started");
        let url = url.to_owned();
        self.spawn(move |service| Completion::Run {
            request_id,
            result: service.run_screen(&url),
        });
    }

    pub fn run_screen(&mut self, screen: &ScreenDescriptor) {
        self.run(&screen.url, &screen.name);
    }

    pub fn dismiss_notice(&mut self) {
        self.store.dispatch(AppCommand::DismissNotice);
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding == 0
    }

    /// Applies every completion that has already arrived without blocking.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Blocks for at most `timeout` waiting for a single completion.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply(completion);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Drains completions until nothing is in flight, including follow-up
    /// requests issued by hooks. Returns false on timeout.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.wait_for_completion(remaining) {
                return false;
            }
        }
        true
    }

    fn issue_request_id(&mut self) -> RequestId {
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.next_request_id
    }

    fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce(&S) -> Completion + Send + 'static,
    {
        self.outstanding += 1;
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let completion = job(&service);
            let _ = tx.send(completion);
        });
    }

    fn apply(&mut self, completion: Completion) {
        self.outstanding = self.outstanding.saturating_sub(1);
        match completion {
            Completion::Login { request_id, result } => {
                let resolution = self.session.finish(&mut self.store, request_id, result);
                self.sync_loading();
                if resolution == LoginResolution::Authenticated {
                    self.fire_authenticated();
                }
            }
            Completion::Screens { request_id, result } => {
                self.runner.finish_fetch(&mut self.store, request_id, result);
            }
            Completion::Run { request_id, result } => {
                self.runner.finish_run(&mut self.store, request_id, result);
                self.sync_loading();
            }
        }
    }

    // The busy flag stays up while any login or run is still outstanding.
    fn sync_loading(&mut self) {
        let busy = self.session.is_pending() || self.runner.is_running();
        self.store.dispatch(AppCommand::SetLoading(busy));
    }

    fn fire_authenticated(&mut self) {
        let mut hooks = std::mem::take(&mut self.authenticated_hooks);
        for hook in &mut hooks {
            hook(self);
        }
        hooks.append(&mut self.authenticated_hooks);
        self.authenticated_hooks = hooks;
    }
}
