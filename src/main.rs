//! studygate - freemium usage gate for AI study features
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use studygate::cli::check::{CheckOptions, CheckTarget};
use studygate::cli::grant::GrantOptions;
use studygate::cli::spend::SpendOptions;
use studygate::cli::start::StartOptions;
use studygate::cli::status::StatusOptions;
use studygate::cli::tier::TierOptions;
use studygate::cli::users::{UsersOptions, DEFAULT_LIMIT};
use studygate::cli::{
    CheckCommand, GrantCommand, SpendCommand, StartCommand, StatusCommand, TierCommand,
    UsersCommand,
};
use studygate::config::{studygate_home, Config};
use studygate::core::{parse_date, AiFeature, Tier};
use studygate::error::exit_codes;
use studygate::storage::FileEntitlementStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// studygate - freemium usage gate for AI study features
#[derive(Parser)]
#[command(name = "studygate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session-start hook (daily reset + streak)
    Start {
        /// User ID
        #[arg(long)]
        user: String,
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long, value_parser = parse_today)]
        today: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Ask the credit gate without spending (exit 2 on denial)
    Check {
        /// Which gate to ask
        #[command(subcommand)]
        target: CheckKind,
        /// User ID
        #[arg(long, global = true)]
        user: Option<String>,
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long, global = true, value_parser = parse_today)]
        today: Option<String>,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Gate and debit one AI action (exit 2 when paywalled)
    Spend {
        /// User ID
        #[arg(long)]
        user: String,
        /// Feature being used (chat, vision_solve, quiz, ...)
        #[arg(long, default_value = "chat")]
        feature: AiFeature,
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long, value_parser = parse_today)]
        today: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the stored entitlement without running the daily reset
    Status {
        /// User ID
        #[arg(long)]
        user: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Add bonus credits to a user
    Grant {
        /// User ID
        #[arg(long)]
        user: String,
        /// Credits to add
        amount: u32,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Set a user's tier
    Tier {
        /// User ID
        #[arg(long)]
        user: String,
        /// New tier (free, pro)
        tier: Tier,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List stored profiles
    Users {
        /// Maximum number of profiles
        #[arg(long, short, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum CheckKind {
    /// Gate before an AI action
    Token,
    /// Gate before creating a course
    Course {
        /// Courses the user already has
        #[arg(long)]
        courses: u32,
    },
}

impl From<CheckKind> for CheckTarget {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Token => CheckTarget::Token,
            CheckKind::Course { courses } => CheckTarget::Course {
                current_count: courses,
            },
        }
    }
}

fn parse_today(value: &str) -> Result<String, String> {
    parse_date(value)
        .map(|_| value.to_string())
        .map_err(|e| e.to_string())
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("studygate error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.studygate/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("studygate panic: {}", info);

        if let Some(home) = studygate_home() {
            let _ = std::fs::create_dir_all(&home);
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Install the stderr subscriber using `logging.filter` (already merged with
/// `STUDYGATE_LOG`).
fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();
    init_logging(&config);

    match cli.command {
        Commands::Start {
            user,
            today,
            json,
            quiet,
        } => run_start(&user, StartOptions { json, quiet, today }, config),
        Commands::Check {
            target,
            user,
            today,
            json,
            quiet,
        } => {
            let user = user.ok_or("--user is required")?;
            run_check(&user, target.into(), CheckOptions { json, quiet, today }, config)
        }
        Commands::Spend {
            user,
            feature,
            today,
            json,
            quiet,
        } => run_spend(&user, feature, SpendOptions { json, quiet, today }, config),
        Commands::Status { user, json, quiet } => {
            run_status(&user, StatusOptions { json, quiet }, config)
        }
        Commands::Grant {
            user,
            amount,
            json,
            quiet,
        } => run_grant(&user, amount, GrantOptions { json, quiet }),
        Commands::Tier {
            user,
            tier,
            json,
            quiet,
        } => run_tier(&user, tier, TierOptions { json, quiet }),
        Commands::Users { limit, json, quiet } => {
            run_users(UsersOptions { json, quiet, limit }, config)
        }
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::ALLOW as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

/// Exit code for a gate result: errors first, then denial.
fn decision_to_exit_code(success: bool, denied: bool) -> ExitCode {
    if !success {
        ExitCode::from(exit_codes::ERROR as u8)
    } else if denied {
        ExitCode::from(exit_codes::DENY as u8)
    } else {
        ExitCode::from(exit_codes::ALLOW as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
        if !formatted.ends_with('\n') {
            println!();
        }
    }
}

fn run_start(
    user: &str,
    options: StartOptions,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileEntitlementStore::new()?;
    let cmd = StartCommand::new(store, config);

    let output = cmd.run(user, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_check(
    user: &str,
    target: CheckTarget,
    options: CheckOptions,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileEntitlementStore::new()?;
    let cmd = CheckCommand::new(store, config);

    let output = cmd.run(user, target, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(decision_to_exit_code(output.success, output.is_denied()))
}

fn run_spend(
    user: &str,
    feature: AiFeature,
    options: SpendOptions,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileEntitlementStore::new()?;
    let cmd = SpendCommand::new(store, config);

    let output = cmd.run(user, feature, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(decision_to_exit_code(output.success, output.is_denied()))
}

fn run_status(
    user: &str,
    options: StatusOptions,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileEntitlementStore::new()?;
    let cmd = StatusCommand::new(store, config);

    let output = cmd.run(user);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_grant(
    user: &str,
    amount: u32,
    options: GrantOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileEntitlementStore::new()?;
    let cmd = GrantCommand::new(store);

    let output = cmd.run(user, amount);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_tier(
    user: &str,
    tier: Tier,
    options: TierOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileEntitlementStore::new()?;
    let cmd = TierCommand::new(store);

    let output = cmd.run(user, tier);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_users(options: UsersOptions, config: Config) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileEntitlementStore::new()?;
    let cmd = UsersCommand::new(store, config);

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::ALLOW, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::DENY, 2);
        assert_eq!(exit_codes::CRASH, 3);
    }

    #[test]
    fn test_success_to_exit_code() {
        assert_eq!(
            success_to_exit_code(true),
            ExitCode::from(exit_codes::ALLOW as u8)
        );
        assert_eq!(
            success_to_exit_code(false),
            ExitCode::from(exit_codes::ERROR as u8)
        );
    }

    #[test]
    fn test_decision_to_exit_code() {
        assert_eq!(
            decision_to_exit_code(true, false),
            ExitCode::from(exit_codes::ALLOW as u8)
        );
        assert_eq!(
            decision_to_exit_code(true, true),
            ExitCode::from(exit_codes::DENY as u8)
        );
        assert_eq!(
            decision_to_exit_code(false, true),
            ExitCode::from(exit_codes::ERROR as u8)
        );
    }

    #[test]
    fn test_cli_parse_start() {
        let cli = Cli::parse_from(["studygate", "start", "--user", "alice", "--today", "2024-01-02"]);
        match cli.command {
            Commands::Start { user, today, .. } => {
                assert_eq!(user, "alice");
                assert_eq!(today.as_deref(), Some("2024-01-02"));
            }
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_today() {
        let result =
            Cli::try_parse_from(["studygate", "start", "--user", "alice", "--today", "tomorrow"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_check_course() {
        let cli = Cli::parse_from([
            "studygate",
            "check",
            "course",
            "--courses",
            "1",
            "--user",
            "alice",
            "--json",
        ]);
        match cli.command {
            Commands::Check {
                target, user, json, ..
            } => {
                assert_eq!(
                    CheckTarget::from(target),
                    CheckTarget::Course { current_count: 1 }
                );
                assert_eq!(user.as_deref(), Some("alice"));
                assert!(json);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parse_spend() {
        let cli = Cli::parse_from([
            "studygate",
            "spend",
            "--user",
            "alice",
            "--feature",
            "vision_solve",
        ]);
        match cli.command {
            Commands::Spend { feature, .. } => assert_eq!(feature, AiFeature::VisionSolve),
            _ => panic!("Expected Spend command"),
        }

        assert!(Cli::try_parse_from(["studygate", "spend", "--user", "a", "--feature", "x"]).is_err());
    }

    #[test]
    fn test_cli_parse_admin() {
        let cli = Cli::parse_from(["studygate", "grant", "--user", "alice", "3"]);
        assert!(matches!(cli.command, Commands::Grant { amount: 3, .. }));

        let cli = Cli::parse_from(["studygate", "tier", "--user", "alice", "pro"]);
        assert!(matches!(cli.command, Commands::Tier { tier: Tier::Pro, .. }));

        let cli = Cli::parse_from(["studygate", "users"]);
        assert!(matches!(
            cli.command,
            Commands::Users {
                limit: DEFAULT_LIMIT,
                ..
            }
        ));
    }
}
