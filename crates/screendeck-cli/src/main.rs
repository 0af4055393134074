// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod headless;
mod logging;

use anyhow::{Context, Result};
use config::Config;
use logging::LogTarget;
use screendeck_api::Client;
use screendeck_app::Controller;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `screendeck --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let interactive = options.command == Command::Interactive;
    let log_file = if interactive {
        Some(config.log_file()?)
    } else {
        None
    };
    let target = match &log_file {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Stderr,
    };
    logging::init(config.log_level(), target)?;

    let timeout = config.api_timeout()?;
    let base_url = config.api_base_url();
    let client = Client::new(base_url.as_deref(), timeout).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    if let Some(problem) = client.endpoint_problem() {
        warn!(%problem, "screen service endpoint is unusable");
    }

    // login, list and run may each take a full client timeout
    let headless_wait = timeout.saturating_mul(3);

    match options.command {
        Command::Check => {
            client
                .ping()
                .context("probe screen service; check [api].base_url")?;
            println!(
                "ok: {}",
                client.base_url().unwrap_or("screen service reachable")
            );
            Ok(())
        }
        Command::List => {
            let mut controller = Controller::new(client);
            headless::open_session(
                &mut controller,
                headless::credentials_from_env(),
                headless_wait,
            )?;
            print!("{}", headless::list_text(&controller));
            Ok(())
        }
        Command::Run(name) => {
            let mut controller = Controller::new(client);
            headless::open_session(
                &mut controller,
                headless::credentials_from_env(),
                headless_wait,
            )?;
            print!("{}", headless::run_text(&mut controller, &name, headless_wait)?);
            Ok(())
        }
        Command::Interactive => {
            info!(base_url = ?client.base_url(), "starting terminal UI");
            let mut controller = Controller::new(client);
            screendeck_tui::run_app(&mut controller)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Interactive,
    Check,
    List,
    Run(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    show_help: bool,
    command: Command,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        show_help: false,
        command: Command::Interactive,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let next_command = match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
                None
            }
            "--print-config-path" => {
                options.print_config_path = true;
                None
            }
            "--print-example-config" => {
                options.print_example = true;
                None
            }
            "--check" => Some(Command::Check),
            "--list" => Some(Command::List),
            "--run" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--run requires a screen name"))?;
                Some(Command::Run(value.as_ref().to_owned()))
            }
            "--help" | "-h" => {
                options.show_help = true;
                None
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        };

        if let Some(command) = next_command {
            if options.command != Command::Interactive {
                return Err(anyhow::anyhow!(
                    "--check, --list and --run cannot be combined"
                ));
            }
            options.command = command;
        }
    }

    Ok(options)
}

fn print_help() {
    println!("screendeck");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and probe the screen service");
    println!("  --list                   Log in and print saved screens");
    println!("  --run <name>             Log in, run a screen, print its table");
    println!("  --help                   Show this help");
    println!();
    println!("Headless commands read SCREENDECK_USERNAME and SCREENDECK_PASSWORD.");
}
