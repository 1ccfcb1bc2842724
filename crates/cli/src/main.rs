//! Cardshop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! cardshop-cli migrate
//!
//! # Create an identity and print its recovery key
//! cardshop-cli identity new
//!
//! # Manage bans as an admin identity
//! CARDSHOP_RECOVERY_KEY=... cardshop-cli bans list
//! CARDSHOP_RECOVERY_KEY=... cardshop-cli bans add <principal>
//! CARDSHOP_RECOVERY_KEY=... cardshop-cli bans remove <principal>
//!
//! # Assign a role
//! CARDSHOP_RECOVERY_KEY=... cardshop-cli roles assign <principal> admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the `tower_sessions` schema in the storefront database
//! - `identity new` - Generate a device identity
//! - `bans` - List, add and remove banned principals
//! - `roles assign` - Assign a user role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cardshop-cli")]
#[command(author, version, about = "Cardshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Identity the backend commands act as.
#[derive(clap::Args)]
struct CallerArgs {
    /// Recovery key of an admin identity
    #[arg(long, env = "CARDSHOP_RECOVERY_KEY", hide_env_values = true)]
    recovery_key: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage device identities
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },
    /// Manage banned users
    Bans {
        #[command(flatten)]
        caller: CallerArgs,
        #[command(subcommand)]
        action: BanAction,
    },
    /// Manage user roles
    Roles {
        #[command(flatten)]
        caller: CallerArgs,
        #[command(subcommand)]
        action: RoleAction,
    },
}

#[derive(Subcommand)]
enum IdentityAction {
    /// Generate a new identity and print its principal and recovery key
    New,
}

#[derive(Subcommand)]
enum BanAction {
    /// List banned principals
    List,
    /// Ban a principal
    Add {
        /// Principal text
        principal: String,
    },
    /// Lift a ban
    Remove {
        /// Principal text
        principal: String,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Assign a role (`admin`, `user`, `guest`) to a principal
    Assign {
        /// Principal text
        principal: String,
        /// Role to assign
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Identity { action } => match action {
            IdentityAction::New => commands::identity::new_identity(),
        },
        Commands::Bans { caller, action } => {
            let admin = commands::AdminClient::connect(&caller.recovery_key).await?;
            match action {
                BanAction::List => commands::bans::list(&admin).await?,
                BanAction::Add { principal } => commands::bans::add(&admin, &principal).await?,
                BanAction::Remove { principal } => {
                    commands::bans::remove(&admin, &principal).await?;
                }
            }
        }
        Commands::Roles { caller, action } => {
            let admin = commands::AdminClient::connect(&caller.recovery_key).await?;
            match action {
                RoleAction::Assign { principal, role } => {
                    commands::roles::assign(&admin, &principal, &role).await?;
                }
            }
        }
    }
    Ok(())
}
