//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "khetsetu")]
#[command(version)]
#[command(about = "KhetSetu farmer advisory client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Farm attribute flags shared by register and profile update.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FarmArgs {
    /// Village name
    #[arg(long)]
    pub village: Option<String>,

    /// District name
    #[arg(long)]
    pub district: Option<String>,

    /// State name
    #[arg(long)]
    pub state: Option<String>,

    /// Land size in acres
    #[arg(long, value_name = "ACRES")]
    pub land_size: Option<f64>,

    /// Soil type (e.g. alluvial, black, red)
    #[arg(long)]
    pub soil: Option<String>,

    /// Irrigation source (e.g. canal, borewell, rain-fed)
    #[arg(long)]
    pub irrigation: Option<String>,

    /// Comma-separated list of primary crops
    #[arg(long, value_name = "CROPS", value_delimiter = ',')]
    pub crops: Vec<String>,
}

impl FarmArgs {
    /// Returns true if any farm field was supplied.
    pub fn is_empty(&self) -> bool {
        self.village.is_none()
            && self.district.is_none()
            && self.state.is_none()
            && self.land_size.is_none()
            && self.soil.is_none()
            && self.irrigation.is_none()
            && self.crops.is_empty()
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        /// Account email
        #[arg(long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Password confirmation (prompted when password is prompted)
        #[arg(long)]
        confirm_password: Option<String>,

        #[command(flatten)]
        farm: FarmArgs,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage the farm profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Change the account password
    Passwd {
        /// Current password (read from stdin when omitted)
        #[arg(long)]
        current: Option<String>,

        /// New password (read from stdin when omitted)
        #[arg(long)]
        new: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Print the stored profile
    Show,
    /// Update profile fields
    Update {
        /// Full name
        #[arg(long)]
        name: Option<String>,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        #[command(flatten)]
        farm: FarmArgs,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Create a default config file
    Init,
    /// Set the backend API URL
    SetUrl {
        /// Base URL of the KhetSetu backend
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Config commands are local and synchronous.
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&url),
        },
        command => {
            let _log_guard = khetsetu_core::logging::init()?;

            let runtime =
                tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(dispatch(command))
        }
    }
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => commands::auth::login(email, password).await,
        Commands::Register {
            name,
            email,
            phone,
            password,
            confirm_password,
            farm,
        } => commands::auth::register(name, email, phone, password, confirm_password, farm).await,
        Commands::Logout => commands::auth::logout().await,
        Commands::Whoami => commands::auth::whoami().await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile::show().await,
            ProfileCommands::Update { name, phone, farm } => {
                commands::profile::update(name, phone, farm).await
            }
        },
        Commands::Passwd { current, new } => commands::auth::passwd(current, new).await,
        Commands::Config { .. } => unreachable!("handled before the runtime starts"),
    }
}
