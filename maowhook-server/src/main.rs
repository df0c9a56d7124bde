// File: maowhook-server/src/main.rs

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use maowhook_core::{Client, ClientConfig};

mod commands;
mod server;

use commands::SubscriptionArg;

#[derive(Parser, Debug, Clone)]
#[command(name = "maowhook")]
#[command(author, version, about = "Twitch EventSub webhook receiver and subscription manager")]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the webhook receiver and optionally create subscriptions once it is listening.
    Serve {
        /// Address the HTTP server binds to.
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,

        /// Route Twitch posts webhook requests to.
        #[arg(long, default_value = "/eventsub")]
        path: String,

        /// `type:version:key=value,...`, e.g. `stream.online:1:broadcaster_user_id=1337`. Repeatable.
        #[arg(long = "subscribe")]
        subscriptions: Vec<SubscriptionArg>,

        /// Remove the subscriptions created by this run on shutdown.
        #[arg(long, default_value = "false")]
        cleanup: bool,
    },

    /// List existing subscriptions.
    List {
        #[arg(long = "type", conflicts_with = "status")]
        sub_type: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Remove a subscription by ID.
    Remove { id: String },

    /// Remove every subscription of a type whose condition matches exactly.
    RemoveType {
        sub_type: String,
        /// `key=value,...`
        condition: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("maowhook=info".parse().unwrap_or_default());
    fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = ClientConfig::from_env()?;
    let client = Client::new(config).await?;
    info!("maowhook starting, command={:?}", args.command);

    let result = match args.command {
        Command::Serve {
            bind,
            path,
            subscriptions,
            cleanup,
        } => server::run_server(client, &bind, &path, subscriptions, cleanup).await,
        Command::List { sub_type, status } => commands::list(&client, sub_type, status).await,
        Command::Remove { id } => commands::remove(&client, &id).await,
        Command::RemoveType {
            sub_type,
            condition,
        } => commands::remove_type(&client, &sub_type, &condition).await,
    };

    if let Err(e) = &result {
        error!("maowhook failed: {:#}", e);
    }
    result
}
