// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;
mod session;

use anyhow::{Context, Result, bail};
use cms_app::{AppState, ComplaintFilter, SessionStore};
use config::Config;
use runtime::ApiRuntime;
use session::FileSessionStore;
use std::env;
use std::fs;
use std::path::PathBuf;
use time::OffsetDateTime;

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
            "load config {}; run `cms --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let mut client = cms_api::Client::new(config.api_base_url(), config.api_timeout()?)
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;

    let session_path = config::session_path()?;
    let mut sessions = FileSessionStore::open(&session_path).with_context(|| {
        format!(
            "open session {} -- if this path is wrong, set CMS_SESSION_PATH",
            session_path.display()
        )
    })?;

    if options.logout {
        sessions.clear()?;
        println!("signed out");
        return Ok(());
    }
    if options.check_only {
        return Ok(());
    }

    logging::init(&config)?;

    if let Some(path) = &options.export_csv {
        let Some(token) = sessions.token() else {
            bail!("no stored session -- run `cms` and sign in, then retry the export");
        };
        client.set_token(Some(token.to_owned()));
        let complaints = match client.track_complaints() {
            Ok(complaints) => complaints,
            Err(error) if cms_api::is_unauthorized(&error) => {
                sessions.clear()?;
                bail!("session expired -- run `cms` and sign in again, then retry the export");
            }
            Err(error) => return Err(error),
        };
        let rows = options.filter.apply(&complaints, OffsetDateTime::now_utc());
        fs::write(path, cms_app::export_csv(rows.iter().copied()))
            .with_context(|| format!("write export {}", path.display()))?;
        tracing::info!(rows = rows.len(), path = %path.display(), "exported complaints");
        println!("{}", path.display());
        return Ok(());
    }

    let mut state = AppState::resume(sessions.role());
    let mut runtime = ApiRuntime::new(
        client,
        sessions,
        config.poll_interval()?,
        config.chat_delays()?,
        config::export_dir()?,
    );
    tracing::info!(base_url = config.api_base_url(), "starting");
    cms_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    logout: bool,
    export_csv: Option<PathBuf>,
    filter: ComplaintFilter,
    show_help: bool,
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
        check_only: false,
        logout: false,
        export_csv: None,
        filter: ComplaintFilter::All,
        show_help: false,
    };
    let mut filter_given = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--logout" => {
                options.logout = true;
            }
            "--export-csv" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--export-csv requires a file path"))?;
                options.export_csv = Some(PathBuf::from(value.as_ref()));
            }
            "--filter" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--filter requires a value"))?;
                options.filter = ComplaintFilter::parse(value.as_ref()).ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown filter {:?}; use one of: all, month, resolved, unresolved",
                        value.as_ref()
                    )
                })?;
                filter_given = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if filter_given && options.export_csv.is_none() {
        bail!("--filter only applies to --export-csv; add --export-csv <path> and retry");
    }

    Ok(options)
}

fn print_help() {
    println!("cms");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config + session file and exit");
    println!("  --logout                 Forget the stored session");
    println!("  --export-csv <path>      Write tracked complaints as CSV and exit");
    println!("  --filter <name>          Export filter: all, month, resolved, unresolved");
    println!("  --help                   Show this help");
}
