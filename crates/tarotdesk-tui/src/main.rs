//! Tarotdesk - A terminal admin panel for a tarot-reading practice.
//!
//! This application provides a fast, keyboard-driven back office over the
//! practice's hosted backend: members, bookings, course content, meditations,
//! resources, announcements, digital readings, weekly messages and products.

mod app;
mod forms;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tarotdesk_core::auth::{CredentialStore, Session};
use tarotdesk_core::cache::CacheManager;
use tarotdesk_core::contact::BookingCalendar;
use tarotdesk_core::media::embed_url;
use tarotdesk_core::models::{CardNumber, ReadingCategory};
use tarotdesk_core::services::reading::LookupResult;
use tarotdesk_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "tarotdesk.log";

/// Days shown by `--slots` when no count is given
const DEFAULT_SLOT_DAYS: usize = 14;

const USAGE: &str = "\
Usage: tarotdesk [--demo] [COMMAND]

Commands:
  (none)                        Start the admin panel
  --dump <table>                Print every row of a table as JSON
  --lookup <category> <number>  Look up the reading for a card (category: love | general)
  --slots [days]                List open reading slots (GMT) for the coming days
  --login                       Store admin credentials in the OS keychain
  --logout                      Forget the saved session and stored credentials
  --help                        Show this message

Options:
  --demo                        Use an in-memory backend seeded with sample content";

/// Default filter when RUST_LOG is unset
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a daily rolling file so output does not corrupt the terminal.
fn init_file_tracing(log_dir: PathBuf) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    guard
}

/// Command-line commands log to stderr
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let demo_mode = take_flag(&mut args, "--demo");

    if let Some(command) = args.first().cloned() {
        init_stderr_tracing();
        return match command.as_str() {
            "--help" | "-h" => {
                println!("{}", USAGE);
                Ok(())
            }
            "--dump" => {
                let table = args.get(1).context("--dump needs a table name")?;
                dump_table(table, demo_mode).await
            }
            "--lookup" => {
                let (Some(category), Some(number)) = (args.get(1), args.get(2)) else {
                    bail!("--lookup needs a category and a card number");
                };
                lookup_reading(category, number, demo_mode).await
            }
            "--slots" => {
                let days = match args.get(1) {
                    Some(d) => d.parse::<usize>().with_context(|| format!("'{}' is not a number of days", d))?,
                    None => DEFAULT_SLOT_DAYS,
                };
                print_slots(days);
                Ok(())
            }
            "--login" => login(),
            "--logout" => logout(),
            other => bail!("Unknown argument '{}'\n\n{}", other, USAGE),
        };
    }

    // Initialize logging
    let log_dir = Config::load()
        .and_then(|c| c.cache_dir())
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_file_tracing(log_dir);
    info!(demo_mode, "Tarotdesk starting");

    // Create app before touching the terminal so setup errors print normally
    let mut app = App::new(demo_mode).await?;

    // Show snapshots immediately, then sign in and refresh behind them
    app.load_from_cache();
    if app.authenticate().await && (app.demo_mode || app.is_cache_stale() || app.members.is_empty()) {
        app.refresh_all_background();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Tarotdesk shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Remove `flag` from `args`, returning whether it was present
fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// App with an established session, for one-shot commands
async fn connected_app(demo_mode: bool) -> Result<App> {
    let mut app = App::new(demo_mode).await?;
    if !app.authenticate().await {
        let reason = app.auth_message.clone().unwrap_or_else(|| "unknown reason".to_string());
        bail!("Authentication failed: {}", reason);
    }
    Ok(app)
}

/// Print every row of a table to stdout as JSON
async fn dump_table(table: &str, demo_mode: bool) -> Result<()> {
    let app = connected_app(demo_mode).await?;
    let rows = app.services.dump_table(table).await?;
    eprintln!("{} rows in {}", rows.len(), table);
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn lookup_reading(category: &str, number: &str, demo_mode: bool) -> Result<()> {
    let category = ReadingCategory::parse(category)
        .with_context(|| format!("Unknown category '{}'. Use love or general.", category))?;
    let number: i32 = number
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a card number", number))?;
    let card_number = CardNumber::try_from(number).map_err(anyhow::Error::msg)?;

    let app = connected_app(demo_mode).await?;
    match app.services.readings.lookup(category, card_number).await? {
        LookupResult::Found(reading) => {
            println!("{} ({}, card {})", reading.card_name, category, card_number);
            println!("Watch: {}", embed_url(&reading.video_url));
            if let Some(meaning) = reading.card_meaning {
                println!();
                println!("{}", meaning);
            }
        }
        LookupResult::ComingSoon { category, card_number } => {
            println!(
                "Coming soon: no {} reading recorded for {} yet.",
                category,
                card_number.arcana_name()
            );
        }
    }
    Ok(())
}

/// Print each upcoming weekday with its open slots
fn print_slots(days: usize) {
    let calendar = BookingCalendar::starting_now();
    for day in calendar.days(days) {
        let open: Vec<String> = calendar
            .slots_for(day.date)
            .iter()
            .filter(|s| s.available)
            .map(|s| s.label())
            .collect();
        if open.is_empty() {
            println!("{}  unavailable", day.date.format("%a %b %d"));
        } else {
            println!("{}  {}", day.date.format("%a %b %d"), open.join(", "));
        }
    }
}

/// Prompt for admin credentials and keep them in the OS keychain
fn login() -> Result<()> {
    let mut config = Config::load().unwrap_or_default();

    let default_email = config.admin_email.clone().unwrap_or_default();
    if default_email.is_empty() {
        eprint!("Admin email: ");
    } else {
        eprint!("Admin email [{}]: ", default_email);
    }
    io::stderr().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    let email = match email.trim() {
        "" => default_email,
        typed => typed.to_string(),
    };
    if email.is_empty() {
        bail!("An admin email is required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("A password is required");
    }

    CredentialStore::for_backend(config.backend_url.as_deref()).store(&email, &password)?;
    config.admin_email = Some(email.clone());
    config.save().context("Failed to save config")?;

    // Sign in afresh as this admin on the next run
    Session::new(config.project_dir()?).clear()?;
    eprintln!("Credentials stored for {}", email);
    Ok(())
}

/// Drop the saved session, snapshots and keychain entry
fn logout() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let project_dir = config.project_dir()?;

    Session::new(project_dir.clone()).clear()?;
    CacheManager::new(project_dir)?.clear()?;
    if let Some(email) = &config.admin_email {
        if let Err(e) = CredentialStore::for_backend(config.backend_url.as_deref()).delete(email) {
            eprintln!("No stored credentials removed: {}", e);
        }
    }
    eprintln!("Signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_flag_anywhere() {
        let mut args = vec!["--dump".to_string(), "members".to_string(), "--demo".to_string()];
        assert!(take_flag(&mut args, "--demo"));
        assert_eq!(args, vec!["--dump", "members"]);
        assert!(!take_flag(&mut args, "--demo"));
    }
}
