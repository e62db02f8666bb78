//! Realty Admin CLI
//!
//! Runs the admin API as a systemd service, Docker container or standalone
//! process, plus a few maintenance commands.
//!
//! ```sh
//! # Run with default config (~/.config/realty-admin/config.toml)
//! realty-admin serve
//!
//! # Custom config path and port
//! realty-admin --config /etc/realty-admin/config.toml serve --api-port 8080
//!
//! # Validate config without starting
//! realty-admin check
//!
//! # Hand a stuck customer back to the assistant
//! realty-admin reset-session +34600111222
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use realty_admin::config::{AppConfig, SessionBackend};
use realty_admin::server::{init_tracing, reset_session, ServerHandle, ServerOptions};

/// Realty Admin: portal backend for the WhatsApp sales assistant.
#[derive(Parser, Debug)]
#[command(
    name = "realty-admin",
    version,
    about = "Admin portal backend for a WhatsApp real-estate sales assistant",
    long_about = "Realty Admin: REST API for agents managing property listings \
                  and customer conversations escalated by the WhatsApp assistant.\n\n\
                  Default config: ~/.config/realty-admin/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "REALTY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the REST API (default).
    Serve {
        /// Override the REST API listen port.
        #[arg(long)]
        api_port: Option<u16>,

        /// Skip database migrations on startup.
        #[arg(long)]
        no_migrate: bool,

        /// Skip creating the default admin user.
        #[arg(long)]
        no_admin: bool,
    },
    /// Validate the configuration file and exit.
    Check,
    /// Reset a customer's conversation and session back to ACTIVE.
    ResetSession {
        /// Customer phone number, as stored by the assistant.
        phone: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve {
        api_port: None,
        no_migrate: false,
        no_admin: false,
    });

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(realty_admin::default_config_path);

    // Only the server may run on defaults
    let serving = matches!(command, Command::Serve { .. });
    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) if serving => (AppConfig::default(), Some(e)),
        Err(e) => return Err(e.into()),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    // Init tracing first so subsequent logs are formatted properly
    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    match command {
        Command::Check => {
            config.validate()?;
            let sessions = match config.session.backend {
                SessionBackend::Memory => "memory".to_string(),
                SessionBackend::Redis => format!(
                    "redis ({})",
                    config.session.redis_url.as_deref().unwrap_or_default()
                ),
            };
            println!("Configuration is valid");
            println!("   Config file   : {}", config_path.display());
            println!("   API address   : {}", config.api_address());
            println!("   Database      : {}", config.database.url);
            println!("   Session store : {}", sessions);
            println!("   Log level     : {}", config.logging.level);
            Ok(())
        }

        Command::ResetSession { phone } => {
            let session = reset_session(&config, &phone).await?;
            println!("Session for {} is now {}", session.phone, session.state().as_str());
            Ok(())
        }

        Command::Serve {
            api_port,
            no_migrate,
            no_admin,
        } => {
            if let Some(port) = api_port {
                info!("CLI override: api_port = {}", port);
                config.server.api_port = port;
            }

            let handle = ServerHandle::start(ServerOptions {
                config,
                auto_migrate: !no_migrate,
                create_default_admin: !no_admin,
            })
            .await?;

            // Install OS signal handlers (SIGTERM, SIGINT)
            handle.install_signal_handler();
            info!("Press Ctrl+C to shutdown gracefully.");

            handle.shutdown_signal().wait().await;
            handle.wait().await;
            Ok(())
        }
    }
}
