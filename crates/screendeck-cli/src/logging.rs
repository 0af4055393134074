// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "SCREENDECK_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    /// Headless commands write next to their own output.
    Stderr,
    /// The TUI owns the terminal, so events go to a file.
    File(&'a Path),
}

pub fn init(config_level: &str, target: LogTarget<'_>) -> Result<()> {
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref(), config_level)?;

    match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .try_init()
            .context("install stderr log subscriber")?,
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .with(filter)
                .try_init()
                .context("install file log subscriber")?
        }
    }
    Ok(())
}

fn build_filter(env_directives: Option<&str>, config_level: &str) -> Result<EnvFilter> {
    let directives = env_directives
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(config_level);
    EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log filter {directives:?}; try warn, info, or debug"))
}

#[cfg(test)]
mod tests {
    use super::build_filter;
    use anyhow::Result;

    #[test]
    fn env_directives_take_precedence() -> Result<()> {
        let filter = build_filter(Some("screendeck_app=debug"), "warn")?;
        assert_eq!(filter.to_string(), "screendeck_app=debug");
        Ok(())
    }

    #[test]
    fn blank_env_falls_back_to_config_level() -> Result<()> {
        let filter = build_filter(Some("  "), "info")?;
        assert_eq!(filter.to_string(), "info");
        Ok(())
    }

    #[test]
    fn invalid_directive_is_reported() {
        let error = build_filter(None, "screendeck=verbose").expect_err("bad filter should fail");
        assert!(error.to_string().contains("invalid log filter"));
    }
}
