use anyhow::bail;
use clap::{Parser, Subcommand};
use kw_shared::action::Action;
use kw_shared::api::AddServiceRequest;

use crate::server::KeepwarmClient;
use crate::util::format;
use crate::util::logging::init_logging;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8787";

#[derive(Parser, Debug)]
#[command(name = "kw")]
#[command(version, about = "kw - operate services behind a keepwarm control plane", long_about = None)]
pub struct Cli {
    /// Base URL of the keepwarm server
    #[arg(long, global = true, env = "KW_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Shared secret for mutating commands
    #[arg(long, global = true, env = "KW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Increase log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured accounts and services
    Services,

    /// Show the current status of every service
    Status,

    /// Restart a service
    Restart { name: String },

    /// Stop (suspend) a service
    Stop { name: String },

    /// Start (resume) a service
    Start { name: String },

    /// Redeploy a service
    Redeploy { name: String },

    /// Edit the persisted service configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Add a service entry
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        account: String,
        /// API token for the account
        #[arg(long)]
        token: String,
        #[arg(long = "service-id")]
        service_id: String,
        #[arg(long = "environment-id")]
        environment_id: String,
    },

    /// Remove a service entry
    Delete { name: String },
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub async fn cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(log_level(cli.verbose));
    run(cli).await
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = KeepwarmClient::new(&cli.server, cli.password.clone())?;

    match cli.command {
        Commands::Services => {
            let res = client.list_services().await?;
            println!("Accounts: {}", res.accounts.join(", "));
            print!("{}", format::services_table(&res.services));
        }
        Commands::Status => {
            let res = client.statuses().await?;
            print!("{}", format::status_table(&res.statuses));
        }
        Commands::Config(ConfigCommands::Add {
            name,
            account,
            token,
            service_id,
            environment_id,
        }) => {
            client
                .add_service(AddServiceRequest {
                    password: None,
                    name: Some(name.clone()),
                    account: Some(account),
                    token: Some(token),
                    service_id: Some(service_id),
                    environment_id: Some(environment_id),
                })
                .await?;
            println!("Added {}", name);
        }
        Commands::Config(ConfigCommands::Delete { name }) => {
            client.delete_service(&name).await?;
            println!("Deleted {}", name);
        }
        Commands::Restart { name } => run_action(&client, Action::Restart, &name).await?,
        Commands::Stop { name } => run_action(&client, Action::Stop, &name).await?,
        Commands::Start { name } => run_action(&client, Action::Start, &name).await?,
        Commands::Redeploy { name } => run_action(&client, Action::Redeploy, &name).await?,
    }

    Ok(())
}

async fn run_action(client: &KeepwarmClient, action: Action, name: &str) -> anyhow::Result<()> {
    let res = client.run_action(action, name).await?;
    if !res.success {
        bail!("{} {} was not acknowledged", action, name);
    }
    println!("{} {}: ok", action, name);
    Ok(())
}
