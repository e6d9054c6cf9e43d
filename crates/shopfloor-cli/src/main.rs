// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod demo;
mod listing;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use demo::DemoRuntime;
use listing::{ListRequest, SortArg, render_listing, render_record_for};
use logging::LogTarget;
use runtime::{ApiRuntime, RecordLookup};
use shopfloor_api::Client;
use shopfloor_app::{AppState, ColumnFilter, PageSize, Screen, ShellBridge, WRITE_CHANNEL};
use shopfloor_tui::{AppRuntime, TuiOptions};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

const DEMO_SEED: u64 = 7;

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

    if let Some(token) = &options.save_token {
        let path = config::save_token(token)?;
        println!("saved API token to {}", path.display());
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `shopfloor --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let target = if options.list.is_some() || options.check_only {
        LogTarget::Stderr
    } else {
        LogTarget::File(config.log_file()?)
    };
    logging::init(config.log_level(), &target)?;
    info!(
        config = %options.config_path.display(),
        demo = options.demo,
        "starting shopfloor"
    );

    if options.demo {
        let mut runtime = DemoRuntime::seeded(DEMO_SEED);
        if options.check_only {
            println!(
                "demo data ready: {} instructions across {} machines",
                runtime.dataset().instructions.len(),
                runtime.dataset().machines.len()
            );
            return Ok(());
        }
        return drive(&mut runtime, &options, &config);
    }

    let token = config.api_token()?;
    if token.is_none() {
        warn!("no API token configured; requests go out without authorization");
    }
    let client = Client::new(config.api_base_url(), token.as_deref(), config.api_timeout()?)
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
    if options.check_only {
        client.ping()?;
        println!("reached {}", client.base_url());
        return Ok(());
    }

    let mut runtime = ApiRuntime::new(client);
    drive(&mut runtime, &options, &config)
}

fn drive<R: AppRuntime + RecordLookup>(
    runtime: &mut R,
    options: &CliOptions,
    config: &Config,
) -> Result<()> {
    if let Some(screen) = options.list {
        let out = match options.show {
            Some(id) => render_record_for(runtime, screen, id)?,
            None => render_listing(runtime, &options.list_request(screen, config))?,
        };
        print!("{out}");
        return Ok(());
    }

    let bridge = Arc::new(ShellBridge::new());
    log_writes(&bridge);
    let mut state = AppState::starting_on(config.start_screen());
    shopfloor_tui::run_app(
        &mut state,
        runtime,
        TuiOptions {
            page_size: config.page_size(),
            bridge,
        },
    )
}

/// Ends once the TUI drops the bridge.
fn log_writes(bridge: &ShellBridge) {
    let writes = bridge.subscribe(WRITE_CHANNEL);
    thread::spawn(move || {
        for message in writes {
            info!(%message, "write accepted");
        }
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    demo: bool,
    show_help: bool,
    save_token: Option<String>,
    list: Option<Screen>,
    show: Option<i64>,
    query: Option<String>,
    sort: Option<SortArg>,
    page: Option<usize>,
    page_size: Option<PageSize>,
    filters: Vec<ColumnFilter>,
}

impl CliOptions {
    fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            print_config_path: false,
            print_example: false,
            check_only: false,
            demo: false,
            show_help: false,
            save_token: None,
            list: None,
            show: None,
            query: None,
            sort: None,
            page: None,
            page_size: None,
            filters: Vec::new(),
        }
    }

    fn list_request(&self, screen: Screen, config: &Config) -> ListRequest {
        ListRequest {
            screen,
            query: self.query.clone().unwrap_or_default(),
            sort: self.sort.clone(),
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or_else(|| config.page_size()),
            filters: self.filters.clone(),
        }
    }

    /// The first listing-only flag given without `--list`.
    fn stray_listing_flag(&self) -> Option<&'static str> {
        if self.list.is_some() {
            return None;
        }
        [
            ("--show", self.show.is_some()),
            ("--query", self.query.is_some()),
            ("--sort", self.sort.is_some()),
            ("--page", self.page.is_some()),
            ("--page-size", self.page_size.is_some()),
            ("--filter", !self.filters.is_empty()),
        ]
        .into_iter()
        .find_map(|(flag, set)| set.then_some(flag))
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions::new(default_config_path);

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let flag = arg.as_ref();
        let mut value = |what: &str| {
            iter.next()
                .map(|value| value.as_ref().to_owned())
                .ok_or_else(|| anyhow!("{flag} requires {what}"))
        };
        match flag {
            "--config" => {
                options.config_path = PathBuf::from(value("a file path")?);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--save-token" => {
                options.save_token = Some(value("a token")?);
            }
            "--list" => {
                let raw = value("a screen name")?;
                let screen = Screen::parse(&raw).ok_or_else(|| {
                    anyhow!("unknown screen {raw:?}; expected one of: {}", list_screens())
                })?;
                if screen == Screen::Dashboard {
                    bail!("the dashboard cannot be listed; expected one of: {}", list_screens());
                }
                options.list = Some(screen);
            }
            "--show" => {
                let raw = value("a record id")?;
                let id = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| anyhow!("--show needs a positive record id, got {raw:?}"))?;
                options.show = Some(id);
            }
            "--query" => {
                options.query = Some(value("search text")?);
            }
            "--sort" => {
                options.sort = Some(SortArg::parse(&value("a column name")?)?);
            }
            "--page" => {
                let raw = value("a page number")?;
                let page = raw
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("--page needs a whole number, got {raw:?}"))?;
                options.page = Some(page);
            }
            "--page-size" => {
                let raw = value("a row count")?;
                let size = raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(PageSize::from_rows)
                    .ok_or_else(|| {
                        anyhow!("--page-size must be one of 10, 20, 50, 100, 200, got {raw:?}")
                    })?;
                options.page_size = Some(size);
            }
            "--filter" => {
                options
                    .filters
                    .push(ColumnFilter::parse(&value("field=value")?)?);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if let Some(flag) = options.stray_listing_flag() {
        bail!("{flag} only applies together with --list <screen>");
    }

    Ok(options)
}

fn list_screens() -> String {
    Screen::ALL
        .iter()
        .filter(|screen| **screen != Screen::Dashboard)
        .map(|screen| screen.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_help() {
    println!("shopfloor: manufacturing admin console");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Run against seeded in-memory data instead of the API");
    println!("  --check                  Validate config and reach the API, then exit");
    println!("  --save-token <token>     Store the API token for later runs");
    println!("  --list <screen>          Print one page of a screen and exit");
    println!("  --show <id>              With --list, print one record in full");
    println!("  --query <text>           With --list, keep rows containing text in any column");
    println!("  --filter <field=value>   With --list, keep rows whose field contains value");
    println!("  --sort <column>[:desc]   With --list, order rows by a column");
    println!("  --page <n>               With --list, page to print (default 1)");
    println!("  --page-size <n>          With --list, rows per page: 10, 20, 50, 100, 200");
    println!("  --help                   Show this help");
}
