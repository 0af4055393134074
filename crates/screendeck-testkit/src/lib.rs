// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use screendeck_app::{
    CellValue, Credentials, LoginReply, ResultRow, ResultSet, ScreenDescriptor, ScreenService,
    ServiceError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

const SCREEN_NAMES: [&str; 12] = [
    "Low PE",
    "Magic Formula",
    "Coffee Can",
    "Debt Free Growth",
    "High Dividend Yield",
    "Piotroski Scan",
    "Bluest of the Blue Chips",
    "Net Cash Smallcaps",
    "Quarterly Turnaround",
    "Capacity Expansion",
    "Consistent Compounders",
    "Golden Crossover",
];

const COMPANIES: [&str; 16] = [
    "Infosys",
    "Tata Consultancy",
    "HDFC Bank",
    "ITC",
    "Asian Paints",
    "Nestle India",
    "Bajaj Auto",
    "Coal India",
    "Hero MotoCorp",
    "Pidilite Inds.",
    "Titan Company",
    "Marico",
    "Dabur India",
    "Britannia Inds.",
    "Havells India",
    "Page Industries",
];

const COLUMNS: [&str; 16] = [
    "S.No.",
    "Name",
    "CMP Rs.",
    "P/E",
    "Mar Cap Rs.Cr.",
    "Div Yld %",
    "NP Qtr Rs.Cr.",
    "Qtr Profit Var %",
    "Sales Qtr Rs.Cr.",
    "Qtr Sales Var %",
    "ROCE %",
    "ROE %",
    "Debt / Eq",
    "Piotski Scr",
    "EPS 12M Rs.",
    "Pledged %",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for screen lists and result rows.
#[derive(Debug, Clone)]
pub struct ScreenFaker {
    rng: DeterministicRng,
}

impl ScreenFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn screen(&mut self) -> ScreenDescriptor {
        let name = SCREEN_NAMES[self.rng.int_n(SCREEN_NAMES.len())];
        let id = 100_000 + self.rng.int_n(900_000);
        ScreenDescriptor::new(name, screen_url(id, name))
    }

    /// Distinct screens in a stable order, capped at the name pool size.
    pub fn screens(&mut self, count: usize) -> Vec<ScreenDescriptor> {
        let start = self.rng.int_n(SCREEN_NAMES.len());
        (0..count.min(SCREEN_NAMES.len()))
            .map(|offset| {
                let name = SCREEN_NAMES[(start + offset) % SCREEN_NAMES.len()];
                let id = 100_000 + self.rng.int_n(900_000);
                ScreenDescriptor::new(name, screen_url(id, name))
            })
            .collect()
    }

    /// Rows shaped like a screener results table. `columns` is capped at the
    /// known column pool.
    pub fn rows(&mut self, count: usize, columns: usize) -> ResultSet {
        let columns = &COLUMNS[..columns.min(COLUMNS.len())];
        (0..count)
            .map(|index| {
                columns
                    .iter()
                    .map(|column| (*column, self.cell_for(column, index)))
                    .collect::<ResultRow>()
            })
            .collect()
    }

    fn cell_for(&mut self, column: &str, index: usize) -> CellValue {
        match column {
            "S.No." => CellValue::Integer(index as i64 + 1),
            "Name" => CellValue::text(COMPANIES[self.rng.int_n(COMPANIES.len())]),
            _ => {
                let hundredths = self.rng.int_n(500_000) as f64;
                CellValue::Float(hundredths / 100.0)
            }
        }
    }
}

pub fn column_pool() -> &'static [&'static str] {
    &COLUMNS
}

pub fn screen_names() -> &'static [&'static str] {
    &SCREEN_NAMES
}

fn screen_url(id: usize, name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("https://www.screener.in/screens/{id}/{slug}/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { username: String, password: String },
    ListScreens,
    Run { url: String },
}

/// Handle that lets a held call proceed. Dropping it also releases the call.
#[derive(Debug)]
pub struct Gate {
    tx: Sender<()>,
}

impl Gate {
    pub fn release(self) {
        let _ = self.tx.send(());
    }
}

const LOGIN_GATE: &str = "login";
const SCREENS_GATE: &str = "screens";

/// Scripted [`ScreenService`] that records every call.
///
/// Unscripted logins succeed, unscripted screen lists are empty, and runs of
/// an unscripted url fail with [`ServiceError::RunFailed`].
#[derive(Debug, Default)]
pub struct MockService {
    login_replies: Mutex<VecDeque<Result<LoginReply, ServiceError>>>,
    screen_replies: Mutex<VecDeque<Result<Vec<ScreenDescriptor>, ServiceError>>>,
    run_replies: Mutex<HashMap<String, Result<ResultSet, ServiceError>>>,
    gates: Mutex<HashMap<String, Receiver<()>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_login(&self, reply: Result<LoginReply, ServiceError>) {
        lock(&self.login_replies).push_back(reply);
    }

    pub fn push_screens(&self, reply: Result<Vec<ScreenDescriptor>, ServiceError>) {
        lock(&self.screen_replies).push_back(reply);
    }

    pub fn set_rows(&self, url: &str, reply: Result<ResultSet, ServiceError>) {
        lock(&self.run_replies).insert(url.to_owned(), reply);
    }

    /// Blocks the next login until the returned gate is released.
    pub fn hold_login(&self) -> Gate {
        self.hold(LOGIN_GATE)
    }

    pub fn hold_screens(&self) -> Gate {
        self.hold(SCREENS_GATE)
    }

    pub fn hold_run(&self, url: &str) -> Gate {
        self.hold(&run_gate(url))
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn list_calls(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, Call::ListScreens))
            .count()
    }

    pub fn run_calls(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                Call::Run { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    fn hold(&self, key: &str) -> Gate {
        let (tx, rx) = mpsc::channel();
        lock(&self.gates).insert(key.to_owned(), rx);
        Gate { tx }
    }

    fn wait_at(&self, key: &str) {
        let gate = lock(&self.gates).remove(key);
        if let Some(rx) = gate {
            let _ = rx.recv();
        }
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

impl ScreenService for MockService {
    fn login(&self, credentials: &Credentials) -> Result<LoginReply, ServiceError> {
        self.record(Call::Login {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        });
        self.wait_at(LOGIN_GATE);
        lock(&self.login_replies)
            .pop_front()
            .unwrap_or_else(|| Ok(LoginReply::success()))
    }

    fn list_screens(&self) -> Result<Vec<ScreenDescriptor>, ServiceError> {
        self.record(Call::ListScreens);
        self.wait_at(SCREENS_GATE);
        lock(&self.screen_replies)
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn run_screen(&self, url: &str) -> Result<ResultSet, ServiceError> {
        self.record(Call::Run {
            url: url.to_owned(),
        });
        self.wait_at(&run_gate(url));
        lock(&self.run_replies)
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ServiceError::RunFailed(format!("no rows scripted for {url}"))))
    }
}

fn run_gate(url: &str) -> String {
    format!("run:{url}")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Call, MockService, ScreenFaker, column_pool};
    use screendeck_app::{CellValue, Credentials, ScreenService, ServiceError};
    use std::collections::BTreeSet;
    use std::thread;

    #[test]
    fn new_deterministic_seed() {
        let mut left = ScreenFaker::new(42);
        let mut right = ScreenFaker::new(42);
        assert_eq!(left.screens(4), right.screens(4));
        assert_eq!(left.rows(3, 12), right.rows(3, 12));
    }

    #[test]
    fn screens_are_distinct_and_well_formed() {
        let mut faker = ScreenFaker::new(7);
        let screens = faker.screens(6);
        assert_eq!(screens.len(), 6);

        let names: BTreeSet<_> = screens.iter().map(|screen| screen.name.as_str()).collect();
        assert_eq!(names.len(), 6);
        for screen in &screens {
            assert!(screen.url.starts_with("https://www.screener.in/screens/"));
            assert!(screen.url.ends_with('/'));
        }
    }

    #[test]
    fn rows_follow_column_pool_order() {
        let mut faker = ScreenFaker::new(3);
        let rows = faker.rows(2, 15);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            column_pool()[..15].to_vec()
        );
        assert_eq!(rows[1].get("S.No."), Some(&CellValue::Integer(2)));
    }

    #[test]
    fn mock_defaults_and_call_log() {
        let service = MockService::new();
        assert!(service.login(&Credentials::new("a", "b")).is_ok());
        assert_eq!(service.list_screens(), Ok(Vec::new()));
        assert!(matches!(
            service.run_screen("u1"),
            Err(ServiceError::RunFailed(_))
        ));

        assert_eq!(
            service.calls(),
            vec![
                Call::Login {
                    username: "a".to_owned(),
                    password: "b".to_owned(),
                },
                Call::ListScreens,
                Call::Run {
                    url: "u1".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn held_call_waits_for_release() {
        let service = std::sync::Arc::new(MockService::new());
        service.set_rows("u1", Ok(Vec::new()));
        let gate = service.hold_run("u1");

        let worker = {
            let service = std::sync::Arc::clone(&service);
            thread::spawn(move || service.run_screen("u1"))
        };
        gate.release();
        let result = worker.join().expect("worker should join");
        assert_eq!(result, Ok(Vec::new()));
    }
}
