//! perfil - manage your profile on the usuarios API from the terminal.

mod app;
mod components;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pf_settings::{Settings, SettingsManager};
use tracing::debug;

use crate::app::App;
use crate::components::profile::EditArgs;

#[derive(Parser)]
#[command(name = "perfil")]
#[command(about = "Log in, view and edit your profile, or run the forwarding proxy")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use the local demo account instead of the API
    #[arg(long, global = true)]
    offline: bool,

    /// Print results as {"ok", "data", "error"} JSON
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (defaults to config.toml in the user config directory)
    #[arg(long, global = true, env = "PERFIL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and load the profile
    Login {
        #[arg(short, long)]
        username: Option<String>,

        /// Prompted for when omitted
        #[arg(short, long, env = "PERFIL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored tokens
    Logout,

    /// Show whether a session is open
    Status,

    /// Print the profile
    Show,

    /// Change profile fields
    Edit(EditArgs),

    /// Upload a new profile photo
    Photo {
        /// Image file, 5 MiB at most
        path: PathBuf,
    },

    /// Run the same-origin forwarding proxy
    Serve {
        /// Address to listen on
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Upstream API base URL
        #[arg(long)]
        upstream: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli).await?;

    let level = settings
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    debug!(?settings, "Settings resolved");

    let app = App::new(settings, cli.json);
    let outcome = match cli.command {
        Commands::Login { username, password } => app.login(username, password).await,
        Commands::Logout => app.logout().await,
        Commands::Status => app.status().await,
        Commands::Show => app.show().await,
        Commands::Edit(args) => app.edit(args.into()).await,
        Commands::Photo { path } => app.photo(&path).await,
        Commands::Serve { listen, upstream } => app.serve(listen, upstream).await,
    };

    if let Err(e) = outcome {
        app.report_error(&e);
        std::process::exit(1);
    }
    Ok(())
}

/// File settings, then environment, then flags
async fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let manager = match &cli.config {
        Some(path) => SettingsManager::at(path),
        None => SettingsManager::default_location()?,
    };

    let mut settings = manager.load().await?;
    settings.apply_env();

    if cli.offline {
        settings.offline_mode = true;
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    Ok(settings)
}
