// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use screendeck_app::{AuthState, Controller, Credentials, ScreenDescriptor, ScreenService};
use screendeck_tui::{TableProjection, render_table_text};
use std::env;
use std::time::Duration;
use tracing::info;

pub const USERNAME_ENV: &str = "SCREENDECK_USERNAME";
pub const PASSWORD_ENV: &str = "SCREENDECK_PASSWORD";

pub fn credentials_from_env() -> Credentials {
    Credentials::new(
        env::var(USERNAME_ENV).unwrap_or_default(),
        env::var(PASSWORD_ENV).unwrap_or_default(),
    )
}

/// Logs in and waits for the screen list that follows.
pub fn open_session<S: ScreenService>(
    controller: &mut Controller<S>,
    credentials: Credentials,
    wait: Duration,
) -> Result<()> {
    controller.login(credentials);
    settle(controller, wait)?;
    if controller.state().auth != AuthState::Authenticated {
        bail!("login did not complete");
    }
    info!(screens = controller.state().screens.len(), "session open");
    Ok(())
}

pub fn list_text<S: ScreenService>(controller: &Controller<S>) -> String {
    controller
        .state()
        .screens
        .iter()
        .map(|screen| format!("{}\t{}\n", screen.name, screen.url))
        .collect()
}

pub fn run_text<S: ScreenService>(
    controller: &mut Controller<S>,
    name: &str,
    wait: Duration,
) -> Result<String> {
    let screen = find_screen(&controller.state().screens, name)?.clone();
    controller.run_screen(&screen);
    settle(controller, wait)?;
    Ok(render_table_text(&TableProjection::from_results(
        &controller.state().results,
    )))
}

fn find_screen<'a>(screens: &'a [ScreenDescriptor], name: &str) -> Result<&'a ScreenDescriptor> {
    screens
        .iter()
        .find(|screen| screen.name == name)
        .or_else(|| {
            screens
                .iter()
                .find(|screen| screen.name.eq_ignore_ascii_case(name))
        })
        .ok_or_else(|| {
            anyhow!("no screen named {name:?}; run `screendeck --list` to see available screens")
        })
}

/// Waits for in-flight work, then turns any user-facing notice into an error.
fn settle<S: ScreenService>(controller: &mut Controller<S>, wait: Duration) -> Result<()> {
    if !controller.wait_until_idle(wait) {
        bail!("screen service did not answer within {}s", wait.as_secs());
    }
    if let Some(notice) = controller.state().notice.clone() {
        controller.dismiss_notice();
        bail!("{notice}");
    }
    Ok(())
}
