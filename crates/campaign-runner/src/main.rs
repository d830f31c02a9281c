//! Leads mass email campaign executable
//!
//! Sends one batch of campaign emails from the lead sheet and reports the
//! number sent to the activity API. `--report-only` skips sending and just
//! logs an activity count.

mod logging;

use anyhow::Context;
use campaign_core::{
    clients::{
        ActivityEntry, ActivityReporter, EnvFileTokenStore, HttpTransport, SessionManager,
        SmtpMailer,
    },
    config::load_sender_accounts,
    paths, BatchRunner, CampaignConfig, EmailTemplate, SentLog,
};
use clap::{Arg, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("campaign-runner")
        .version("1.0.0")
        .about("Leads mass email campaign with activity reporting")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding .env and the lead sheet")
                .default_value("."),
        )
        .arg(
            Arg::new("logs-dir")
                .long("logs-dir")
                .value_name("DIR")
                .help("Directory for the sent log and the activity log")
                .default_value("logs"),
        )
        .arg(
            Arg::new("env-file")
                .long("env-file")
                .value_name("FILE")
                .help("Env file to load settings from and to store refreshed tokens in")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("leads")
                .long("leads")
                .value_name("FILE")
                .help("Lead sheet CSV (default: leads_emails.csv in the data directory)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("sent-log")
                .long("sent-log")
                .value_name("FILE")
                .help("CSV log of delivered emails (default: sent_emails.csv in the logs directory)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("FILE")
                .help("Application log file (default: activity_logger.log in the logs directory)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("report-only")
                .long("report-only")
                .value_name("COUNT")
                .help("Skip sending and only log COUNT activities")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("notes")
                .long("notes")
                .value_name("TEXT")
                .help("Notes for --report-only")
                .requires("report-only"),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    // Roots first, every default path below derives from them
    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        if let Err(e) = paths::init_data_root(data_dir.clone()) {
            eprintln!("Data root initialization warning: {}", e);
        }
    }
    if let Some(logs_dir) = matches.get_one::<String>("logs-dir") {
        if let Err(e) = paths::init_logs_root(logs_dir.clone()) {
            eprintln!("Logs root initialization warning: {}", e);
        }
    }

    let path_arg = |name: &str, default: fn() -> PathBuf| {
        matches.get_one::<PathBuf>(name).cloned().unwrap_or_else(default)
    };
    let env_file = path_arg("env-file", paths::env_file);
    let leads = path_arg("leads", paths::leads_file);
    let sent_log = path_arg("sent-log", paths::sent_log_file);
    let log_file = path_arg("log-file", paths::activity_log_file);

    logging::init(&log_file);

    match run(&matches, env_file, leads, sent_log).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    matches: &clap::ArgMatches,
    env_file: PathBuf,
    leads: PathBuf,
    sent_log: PathBuf,
) -> anyhow::Result<ExitCode> {
    match dotenvy::from_path(&env_file) {
        Ok(()) => log::info!("Loaded settings from {}", env_file.display()),
        Err(e) if e.not_found() => {
            log::warn!("{} not found, using process environment only", env_file.display())
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", env_file.display())),
    }

    let config = CampaignConfig::from_env()?;
    config.api.validate()?;

    let report_only = matches.get_one::<u32>("report-only").copied();
    if report_only.is_none() {
        config.validate()?;
    }

    let transport = Arc::new(HttpTransport::new(config.api.timeout_seconds)?);
    let token_store = Arc::new(EnvFileTokenStore::new(&env_file));
    let session = SessionManager::connect(&config.api, transport, token_store).await;
    let reporter = Arc::new(ActivityReporter::new(Arc::new(session), &config.api));

    if let Some(count) = report_only {
        let notes = matches
            .get_one::<String>("notes")
            .cloned()
            .unwrap_or_default();
        let logged = reporter.log_activity(ActivityEntry::new(count, notes)).await;
        return Ok(if logged {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let accounts_file = config
        .smtp
        .accounts_file
        .as_ref()
        .context("EMAIL_ACCOUNTS_FILE is required")?;
    let accounts = load_sender_accounts(accounts_file)?;
    log::info!("Loaded {} sender accounts", accounts.len());

    let template = match &config.email.template_file {
        Some(path) => EmailTemplate::from_file(path)?,
        None => EmailTemplate::default(),
    };

    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    let mut runner = BatchRunner::new(&config, accounts, template, mailer, reporter)?;

    let summary = runner.run(&leads, &SentLog::new(sent_log)).await?;
    println!("\n{}", summary);

    // Activity logging failures are a warning, the batch itself completed
    Ok(ExitCode::SUCCESS)
}
