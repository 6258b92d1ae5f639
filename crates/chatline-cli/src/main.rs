use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod app;
mod commands;
mod logging;

use app::{App, Settings};

#[derive(Parser)]
#[command(name = "chatline")]
#[command(about = "Chatline - chat with the bot and keep your sessions in sync", long_about = None)]
struct Cli {
    /// Use this directory instead of ~/.config/chatline
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Also print logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in locally without contacting the backend (development only)
    MockLogin { username: String },
    /// Create a new account
    Register {
        username: String,
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Verify the stored token and show the user
    Whoami,
    /// List chat sessions stored on the backend
    Sessions,
    /// Delete a chat session
    Delete { session_id: String },
    /// Check whether a route may be opened
    Open {
        /// Route path, e.g. "/" or "/history"
        path: String,
    },
    /// Start an interactive chat
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config_dir)?;
    let _log_guard = logging::init(&settings.paths, &settings.config, cli.verbose)?;
    let app = App::bootstrap(settings).await?;
    tracing::debug!(base_url = %app.config.base_url, "chatline starting");

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&app, &username, password).await?
        }
        Commands::MockLogin { username } => commands::auth::mock_login(&app, &username).await,
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(&app, &username, &email, password).await?,
        Commands::Logout => commands::auth::logout(&app).await,
        Commands::Whoami => commands::auth::whoami(&app).await,
        Commands::Sessions => commands::sessions::list(&app).await?,
        Commands::Delete { session_id } => commands::sessions::delete(&app, &session_id).await?,
        Commands::Open { path } => commands::sessions::open(&app, &path).await,
        Commands::Chat => commands::chat::run(&app).await?,
    }

    Ok(())
}
