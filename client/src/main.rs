use std::{
    io::{stderr, IsTerminal},
    path::PathBuf,
    pin::pin,
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{value_parser, Parser, Subcommand};
use common::{
    data::{FilterCriteria, LogStatus, PageResult},
    payloads::LogQuery,
};
use kdam::{term, tqdm, BarExt, Column, RichProgress, Spinner};
use scangate_client::{
    config::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE},
    render::{pagination_controls, LogTable},
    shell::{parse_command, Command, HELP},
    upload::Progress,
    dashboard::DashboardSlot,
    view, ClientConfig, ClientError, Dashboard, Gateway, HttpGateway, LogQueryManager,
    UploadController,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    select, spawn,
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the gateway API
    #[arg(short, long, global = true, env = "SCANGATE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Log entries per page
    #[arg(long, global = true, env = "SCANGATE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE,
          value_parser = value_parser!(u32).range(1..))]
    page_size: u32,

    /// Send the file in one piece; the progress bar is then simulated
    #[arg(long, global = true)]
    no_stream: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Upload a file and print the scan verdict
    Upload {
        file: PathBuf,

        #[arg(short, long)]
        user_id: Option<String>,
    },
    /// Print upload statistics
    Stats,
    /// Print a page of the scan log
    Logs {
        #[arg(long)]
        status: Option<LogStatus>,

        #[arg(long)]
        user: Option<String>,

        /// Only entries at or above this risk score
        #[arg(long, value_parser = value_parser!(u32).range(0..=100))]
        risk: Option<u32>,

        #[arg(long, default_value_t = 1, value_parser = value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Print the scan log entries stamped within a time range
    Range {
        /// Inclusive lower bound, e.g. 2024-05-01T00:00:00
        start: NaiveDateTime,

        /// Upper bound, e.g. 2024-05-02T00:00:00
        end: NaiveDateTime,

        #[arg(long, default_value_t = 1, value_parser = value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Print every blocked upload
    Blocked,
    /// Print the most recent scan log entries
    Recent,
    /// Check that the gateway is up
    Health,
    /// Interactive session with upload and dashboard commands
    Shell,
}

fn progress_bar() -> RichProgress {
    RichProgress::new(
        tqdm!(total = 100),
        vec![
            Column::Spinner(Spinner::new(
                &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
                80.0,
                1.0,
            )),
            Column::Text("[bold blue]Uploading".to_owned()),
            Column::Animation,
            Column::Percentage(0),
        ],
    )
}

/// Mirrors the upload indicator onto stderr until cancelled.
async fn refresh_bar(
    mut bar: Option<RichProgress>,
    token: CancellationToken,
    mut progress: watch::Receiver<Progress>,
) -> Option<RichProgress> {
    let mut timer = interval(Duration::from_millis(100));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut prev: Progress = None;
    loop {
        select! {
            _ = timer.tick() => {
                let current = *progress.borrow_and_update();
                if let Some(bar) = bar.as_mut() {
                    let _ = bar.update_to(usize::from(current.unwrap_or(0)));
                } else if current != prev {
                    if let Some(percent) = current {
                        eprintln!("Uploading... {percent}%");
                    }
                    prev = current;
                }
            }
            _ = token.cancelled() => {
                return bar;
            }
        }
    }
}

/// Runs one upload with a live progress bar and returns the rendered verdict.
async fn run_upload<G>(
    gateway: &G,
    controller: &mut UploadController,
    user_id: &str,
    tty: bool,
) -> Result<String, ClientError>
where
    G: Gateway + ?Sized,
{
    let token = CancellationToken::new();
    let bar = tty.then(progress_bar);
    let task = spawn(refresh_bar(bar, token.clone(), controller.subscribe_progress()));
    let outcome = controller.upload(gateway, user_id).await.map(view::result_panel);
    token.cancel();
    match task.await {
        Ok(Some(mut bar)) => {
            let _ = bar.clear();
        }
        Ok(None) => {}
        Err(e) => debug!("progress bar task failed: {e}"),
    }
    outcome
}

fn print_logs(logs: &LogQueryManager) {
    print!("{}", view::log_table(logs.table()));
    let controls = view::page_controls(logs.controls());
    if !controls.is_empty() {
        println!("{controls}");
    }
}

/// Prints a listing fetched straight from the gateway, with page controls
/// when there is more than one page.
fn print_listing(listing: &Result<PageResult, ClientError>) {
    let table = match listing {
        Ok(page) => LogTable::from_entries(&page.content),
        Err(_) => LogTable::Failed,
    };
    print!("{}", view::log_table(&table));
    if let Ok(page) = listing {
        let controls = view::page_controls(&pagination_controls(page, page.number.unwrap_or(0)));
        if !controls.is_empty() {
            println!("{controls}");
        }
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", view::statistics(dashboard.stats.displayed()));
    print_logs(&dashboard.logs);
}

/// Commands that only touch the dashboard; these also work while an upload runs.
async fn dashboard_command<G>(gateway: &G, dashboard: &mut Dashboard, command: Command)
where
    G: Gateway + ?Sized,
{
    let logs = &mut dashboard.logs;
    match command {
        Command::Stats => {
            let stats = dashboard.stats.load(gateway).await;
            println!("{}", view::statistics(stats));
        }
        Command::Logs(page) => {
            let page = page.unwrap_or(logs.page());
            let _ = logs.load_page(gateway, page).await;
            print_logs(logs);
        }
        Command::Next => match logs.next_page(gateway).await {
            Ok(false) => eprintln!("{}", view::notice("already on the last page")),
            _ => print_logs(logs),
        },
        Command::Prev => match logs.previous_page(gateway).await {
            Ok(false) => eprintln!("{}", view::notice("already on the first page")),
            _ => print_logs(logs),
        },
        Command::Filter(criteria) => {
            let _ = logs.apply_filters(gateway, criteria).await;
            print_logs(logs);
        }
        Command::Help => eprintln!("{HELP}"),
        Command::Select(_) | Command::Clear | Command::Upload(_) | Command::Quit => {}
    }
}

fn report_upload(controller: &UploadController, outcome: Result<String, ClientError>) {
    match outcome {
        Ok(panel) => print!("{panel}"),
        Err(e) => {
            let notice = controller.notice().map(str::to_string).unwrap_or_else(|| e.to_string());
            eprintln!("{}", view::notice(&notice));
        }
    }
}

async fn shell(gateway: &HttpGateway, config: &ClientConfig, tty: bool) -> Result<()> {
    let mut controller = UploadController::new(config.progress.clone());
    let mut dashboard = Dashboard::new(config.page_size);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let _ = dashboard.load(gateway).await;
    print_dashboard(&dashboard);
    eprintln!("type help for a list of commands");

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", view::notice(&e));
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Select(path) => {
                let selected = controller.select_path(&path).await.map(view::selected_file);
                match selected {
                    Ok(line) => eprintln!("{line}"),
                    Err(e) => {
                        let notice = controller.notice().map(str::to_string).unwrap_or_else(|| e.to_string());
                        eprintln!("{}", view::notice(&notice));
                    }
                }
            }
            Command::Clear => {
                if controller.clear().is_ok() {
                    eprintln!("selection cleared");
                }
            }
            Command::Upload(user_id) => {
                let user_id = user_id.unwrap_or_default();
                let mut quitting = false;
                let mut slot = DashboardSlot::Parked(dashboard);
                let outcome = {
                    let mut upload = pin!(run_upload(gateway, &mut controller, &user_id, tty));
                    loop {
                        select! {
                            outcome = &mut upload => break outcome,
                            Some(board) = slot.running(), if slot.is_running() => {
                                slot = DashboardSlot::Parked(board);
                            }
                            // One dashboard command at a time; further input waits for it.
                            line = lines.next_line(), if !quitting && !slot.is_running() => {
                                let Some(line) = line? else {
                                    quitting = true;
                                    continue;
                                };
                                match parse_command(&line) {
                                    Ok(Some(Command::Quit)) => {
                                        eprintln!("waiting for the upload to finish");
                                        quitting = true;
                                    }
                                    Ok(Some(Command::Select(_) | Command::Clear | Command::Upload(_))) => {
                                        eprintln!("{}", view::notice(&ClientError::UploadInProgress.to_string()));
                                    }
                                    Ok(Some(command)) => {
                                        slot = slot.start(|mut board| async move {
                                            dashboard_command(gateway, &mut board, command).await;
                                            board
                                        });
                                    }
                                    Ok(None) => {}
                                    Err(e) => eprintln!("{}", view::notice(&e)),
                                }
                            }
                        }
                    }
                };
                report_upload(&controller, outcome);
                dashboard = slot.settle().await;
                if quitting {
                    break;
                }
            }
            command => dashboard_command(gateway, &mut dashboard, command).await,
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let is_tty = stderr().is_terminal();
    term::init(is_tty);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scangate=info,scangate_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ClientConfig {
        base_url: args.base_url,
        page_size: args.page_size,
        streamed_upload: !args.no_stream,
        ..ClientConfig::default()
    };
    let gateway = HttpGateway::new(&config).context("cannot use the configured base URL")?;
    info!(base_url = %gateway.base_url(), "using gateway");

    match args.command {
        Cmd::Upload { file, user_id } => {
            let mut controller = UploadController::new(config.progress.clone());
            controller
                .select_path(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            if let Some(selected) = controller.selected() {
                eprintln!("{}", view::selected_file(selected));
            }
            let outcome = run_upload(&gateway, &mut controller, user_id.as_deref().unwrap_or(""), is_tty).await;
            let failed = outcome.is_err();
            report_upload(&controller, outcome);
            if failed {
                anyhow::bail!("upload failed");
            }
        }
        Cmd::Stats => {
            let mut dashboard = Dashboard::new(config.page_size);
            let stats = dashboard.stats.load(&gateway).await;
            println!("{}", view::statistics(stats));
            if stats.is_none() {
                anyhow::bail!("could not load statistics");
            }
        }
        Cmd::Logs { status, user, risk, page } => {
            let mut logs = LogQueryManager::new(config.page_size)
                .with_filter(FilterCriteria::new(status, user, risk));
            let result = logs.load_page(&gateway, page - 1).await;
            print_logs(&logs);
            result?;
        }
        Cmd::Range { start, end, page } => {
            if end < start {
                anyhow::bail!("the range ends before it starts");
            }
            let query = LogQuery::DateRange {
                start,
                end,
                page: page - 1,
                size: config.page_size,
            };
            let listing = gateway.logs(&query).await;
            print_listing(&listing);
            listing?;
        }
        Cmd::Blocked => {
            let listing = gateway.logs(&LogQuery::Blocked).await;
            print_listing(&listing);
            listing?;
        }
        Cmd::Recent => {
            let listing = gateway.logs(&LogQuery::Recent).await;
            print_listing(&listing);
            listing?;
        }
        Cmd::Health => {
            let status = gateway.health().await?;
            println!("{}", status.trim());
        }
        Cmd::Shell => shell(&gateway, &config, is_tty).await?,
    }
    Ok(())
}
