use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use loginguard_core::intro::IntroGate;
use loginguard_core::nav::{config_url_for_page, render_dropdown};
use loginguard_core::password::{requirement_class, Requirements, StrengthMeter};
use loginguard_core::presenter::format_countdown;
use loginguard_core::{
    AuthOutcome, Credentials, LockState, LoginForm, LoginThrottle, SubmitEvent, SubmitOutcome,
    TimerId,
};
use loginguard_runtime::{
    play_intro, run_countdown, Config, NavClient, SqliteStore, TokioScheduler, LOCAL_NAMESPACE,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::{TerminalNotifier, TerminalPresenter, TerminalStage};

#[derive(Parser)]
#[command(name = "loginguard", version, about = "Login throttle, password strength and navigation tools")]
struct Cli {
    /// TOML config file (default: $LOGINGUARD_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the attempt counter and lock state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Submit the login form, then apply the result of the external auth check
    Submit {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, value_enum)]
        outcome: Outcome,
    },
    /// Record one failed login
    Fail,
    /// Record a successful login and reset the throttle
    Success,
    /// Wait out an active lockout, printing the countdown
    Watch,
    /// Check a password against the rules and rate its strength
    Strength { password: String },
    /// Resolve the current site and list sibling services
    Nav {
        /// Local site config (YAML with login.project)
        #[arg(long, conflicts_with = "page")]
        site_config: Option<PathBuf>,
        /// Page path, e.g. /admin/data/templates/index.html
        #[arg(long, requires = "origin")]
        page: Option<String>,
        /// Origin serving the page, e.g. https://admin.example.com
        #[arg(long)]
        origin: Option<String>,
        /// Print dropdown HTML instead of a plain list
        #[arg(long)]
        html: bool,
    },
    /// Play the intro once per session
    Intro,
}

#[derive(Clone, Copy, ValueEnum)]
enum Outcome {
    Accept,
    Reject,
}

impl From<Outcome> for AuthOutcome {
    fn from(o: Outcome) -> Self {
        match o {
            Outcome::Accept => AuthOutcome::Accepted,
            Outcome::Reject => AuthOutcome::Rejected,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var_os("LOGINGUARD_CONFIG").map(PathBuf::from));
    let cfg = Config::load(config_path.as_deref()).context("failed to load configuration")?;
    tracing::debug!(db = %cfg.db_path.display(), policy = ?cfg.policy, "configuration loaded");

    match cli.command {
        Command::Status { json } => {
            let (form, _ticks) = open_page(&cfg, true)?;
            print_status(form.throttle(), json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Submit {
            user,
            password,
            outcome,
        } => {
            let (mut form, _ticks) = open_page(&cfg, true)?;
            let mut event = SubmitEvent::new();
            let credentials = Credentials {
                userid: user.as_deref(),
                password: password.as_deref(),
            };
            match form.on_submit(&mut event, credentials) {
                SubmitOutcome::Allowed => {
                    form.on_auth_result(outcome.into());
                    print_status(form.throttle(), false)?;
                    Ok(ExitCode::SUCCESS)
                }
                blocked => {
                    tracing::info!(?blocked, "submission not sent");
                    Ok(ExitCode::from(2))
                }
            }
        }
        Command::Fail => {
            let (mut form, _ticks) = open_page(&cfg, true)?;
            form.on_auth_result(AuthOutcome::Rejected);
            print_status(form.throttle(), false)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Success => {
            let (mut form, _ticks) = open_page(&cfg, true)?;
            form.on_auth_result(AuthOutcome::Accepted);
            print_status(form.throttle(), false)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch => {
            let (mut form, mut ticks) = open_page(&cfg, false)?;
            if !form.throttle().is_locked() {
                println!("not locked");
                return Ok(ExitCode::SUCCESS);
            }
            let state = run_countdown(form.throttle_mut(), &mut ticks).await;
            tracing::info!(?state, "countdown finished");
            Ok(ExitCode::SUCCESS)
        }
        Command::Strength { password } => Ok(print_strength(&password)),
        Command::Nav {
            site_config,
            page,
            origin,
            html,
        } => {
            let client = NavClient::new(&cfg.services_url, &cfg.fallback_site, cfg.http_timeout());
            let site = match (site_config, page, origin) {
                (Some(path), _, _) => client.site_from_file(&path)?,
                (None, Some(page), Some(origin)) => {
                    let url = format!("{}{}", origin.trim_end_matches('/'), config_url_for_page(&page));
                    client.site_from_url(&url)
                }
                _ => cfg.fallback_site.clone(),
            };
            println!("site: {site}");

            let services = client.services_or_empty(&site);
            if html {
                println!("{}", render_dropdown(&services));
            } else {
                for s in &services {
                    println!("  {}  {}", s.site_name, s.site_url);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Intro => {
            let session = SqliteStore::open(&cfg.db_path, &cfg.session_namespace())
                .with_context(|| format!("failed to open storage at {}", cfg.db_path.display()))?;
            let mut gate = IntroGate::new(session);
            if !play_intro(&mut gate, &mut TerminalStage).await {
                println!("intro already shown in session '{}'", cfg.session_id);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One page load: open durable storage, build the throttle and hand it to
/// the form controller, which restores persisted state.
fn open_page(cfg: &Config, quiet: bool) -> Result<(LoginForm, UnboundedReceiver<TimerId>)> {
    let store = SqliteStore::open(&cfg.db_path, LOCAL_NAMESPACE)
        .with_context(|| format!("failed to open storage at {}", cfg.db_path.display()))?;
    let (scheduler, ticks) = TokioScheduler::new();
    let throttle = LoginThrottle::new(store, scheduler)
        .with_presenter(TerminalPresenter::new(quiet))
        .with_notifier(TerminalNotifier)
        .with_policy(cfg.policy.build())
        .with_tick_period(cfg.tick_interval());
    Ok((LoginForm::load(throttle), ticks))
}

fn print_status(throttle: &LoginThrottle, json: bool) -> Result<()> {
    let remaining_secs = throttle.remaining().map(|r| r.as_secs());
    if json {
        let locked_until = match throttle.state() {
            LockState::Locked { deadline_ms } => {
                chrono::DateTime::from_timestamp_millis(deadline_ms).map(|d| d.to_rfc3339())
            }
            LockState::Unlocked => None,
        };
        let out = serde_json::json!({
            "attempts": throttle.attempts(),
            "locked": throttle.is_locked(),
            "remaining_secs": remaining_secs,
            "lockout_deadline_ms": throttle.deadline_ms(),
            "locked_until": locked_until,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match remaining_secs {
            Some(secs) => println!(
                "attempts: {}  locked: yes ({} left)",
                throttle.attempts(),
                format_countdown(secs)
            ),
            None => println!("attempts: {}  locked: no", throttle.attempts()),
        }
    }
    Ok(())
}

fn print_strength(password: &str) -> ExitCode {
    let requirements = Requirements::check(password);
    for (name, met) in requirements.items() {
        println!("  {:<8} {}", name, requirement_class(met));
    }
    let meter = StrengthMeter::measure(password);
    println!("  {} ({}%)", meter.css_class(), meter.width_percent);
    if requirements.all_met() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
