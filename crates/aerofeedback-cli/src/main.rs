//! `AeroFeedback` admin console
//!
//! Command-line access to the `AeroFeedback` backend: log in, manage forms
//! and the requests around them, and export collected responses as CSV.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

mod commands;

use aerofeedback_core::{Config, Role};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

/// Command line interface for the `AeroFeedback` admin console
#[derive(Debug, Parser)]
#[command(
    name = "aerofeedback",
    version = env!("CARGO_PKG_VERSION"),
    about = "Admin console for the AeroFeedback training-feedback platform",
    long_about = "Manage feedback forms, form and deletion requests, and collected responses on an AeroFeedback backend."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

/// Available subcommands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "AEROFEEDBACK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Create an account
    Register(RegisterArgs),

    /// Show the logged-in user
    Whoami,

    /// List departments
    Departments,

    /// List trainers
    Trainers {
        /// Only trainers of this department
        #[arg(long, value_name = "ID")]
        department: Option<i64>,
    },

    /// Manage forms
    Forms {
        #[command(subcommand)]
        action: FormCommands,
    },

    /// Manage form-creation requests
    Requests {
        #[command(subcommand)]
        action: RequestCommands,
    },

    /// Manage form-deletion requests
    Deletions {
        #[command(subcommand)]
        action: DeletionCommands,
    },

    /// Collected responses
    Responses {
        #[command(subcommand)]
        action: ResponseCommands,
    },

    /// Show dashboard statistics
    Stats,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Registration details
#[derive(Debug, Args)]
struct RegisterArgs {
    /// Display name
    #[arg(long)]
    name: String,

    /// Account email
    #[arg(long)]
    email: String,

    /// Password
    #[arg(long, env = "AEROFEEDBACK_PASSWORD", hide_env_values = true)]
    password: String,

    /// Password again
    #[arg(long)]
    confirm_password: String,

    /// Account role
    #[arg(long, value_enum, default_value_t = RoleArg::Trainer)]
    role: RoleArg,

    /// Department, required for department accounts
    #[arg(long, value_name = "ID")]
    department_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Admin,
    Trainer,
    Department,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Self::Admin,
            RoleArg::Trainer => Self::Trainer,
            RoleArg::Department => Self::Department,
        }
    }
}

#[derive(Debug, Subcommand)]
enum FormCommands {
    /// List forms
    List,

    /// Show one form with its questions
    Show {
        /// Form ID
        id: i64,
    },

    /// Create a form from a JSON draft file
    Create {
        /// Draft file (camelCase editor format)
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Replace a form from a JSON draft file
    Update {
        /// Form ID
        id: i64,

        /// Draft file (camelCase editor format)
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Publish a draft form
    Publish {
        /// Form ID
        id: i64,
    },

    /// Delete a form
    Delete {
        /// Form ID
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum RequestCommands {
    /// List form requests
    List,

    /// Ask for a new form
    Create {
        /// Proposed title
        #[arg(long)]
        title: String,

        /// Why the form is needed
        #[arg(long)]
        reason: String,

        /// Target department
        #[arg(long, value_name = "ID")]
        department_id: Option<i64>,
    },

    /// Approve a form request
    Approve {
        /// Request ID
        id: i64,
    },

    /// Reject a form request
    Reject {
        /// Request ID
        id: i64,

        /// Reason shown to the requester
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DeletionCommands {
    /// List deletion requests
    List,

    /// Ask for a published form to be deleted
    Request {
        /// Form ID
        form_id: i64,

        /// Why the form should be deleted
        #[arg(long)]
        reason: String,
    },

    /// Approve a deletion request (retries slow or failing attempts)
    Approve {
        /// Request ID
        id: i64,
    },

    /// Reject a deletion request
    Reject {
        /// Request ID
        id: i64,

        /// Reason shown to the requester
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ResponseCommands {
    /// List the responses to a form
    List {
        /// Form ID
        form_id: i64,
    },

    /// Submit answers from a JSON file (`{"question_id": answer, ...}`)
    Submit {
        /// Form ID
        form_id: i64,

        /// Answers file
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Export responses as CSV
    Export {
        /// Form ID
        form_id: i64,

        /// Output file or directory; defaults to a dated name in the
        /// current directory
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration as TOML
    Show,

    /// Check the configuration and exit
    Validate,
}

/// Resolve configuration from file, environment and command-line overrides
fn load_config(cli: &Cli) -> aerofeedback_core::Result<Config> {
    let mut config = Config::load_from(cli.config.as_deref())?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url.clone_from(base_url);
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format.as_str().to_string();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = aerofeedback_core::init_logging(&config.logging) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    debug!(base_url = %config.api.base_url, "Configuration loaded");

    match commands::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Command failed");
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
