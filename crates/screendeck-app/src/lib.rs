// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod controller;
pub mod model;
pub mod runner;
pub mod service;
pub mod session;
pub mod state;

pub use controller::*;
pub use model::*;
pub use runner::*;
pub use service::*;
pub use session::*;
pub use state::*;
