//! maowhook-server/src/server.rs
//!
//! Serves the webhook route and creates the requested subscriptions once the
//! listener is up, since Twitch calls back before a create can complete.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum_server::Handle;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use maowhook_core::{Client, Error};

use crate::commands::SubscriptionArg;

pub async fn run_server(
    client: Client,
    bind: &str,
    path: &str,
    subscriptions: Vec<SubscriptionArg>,
    cleanup: bool,
) -> anyhow::Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", bind))?;
    let client = Arc::new(client);

    for arg in &subscriptions {
        let sub_type = arg.sub_type.clone();
        client.on(&arg.sub_type, move |event| {
            let sub_type = sub_type.clone();
            async move {
                info!("[EventSub] {} => {}", sub_type, event);
            }
        });
    }
    client.on_revocation(|sub| {
        warn!(
            "[EventSub] Twitch revoked {} ({}): {}",
            sub.id, sub.sub_type, sub.status
        );
    });

    let app = client.clone().router(path);
    let handle = Handle::new();

    let server_handle = handle.clone();
    let server = tokio::spawn(async move {
        axum_server::bind(addr)
            .handle(server_handle)
            .serve(app.into_make_service())
            .await
    });

    let Some(listening) = handle.listening().await else {
        return match server.await {
            Ok(Err(e)) => Err(e).with_context(|| format!("binding {}", addr)),
            _ => Err(anyhow::anyhow!("server exited before listening on {}", addr)),
        };
    };
    info!(
        "Webhook server listening on http://{}{} (public callback {})",
        listening,
        path,
        client.webhook_url()
    );

    let created = create_all(&client, subscriptions).await;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
    }
    info!("Ctrl-C detected; shutting down webhook server...");

    if cleanup {
        for id in &created {
            match client.remove_subscription(id).await {
                Ok(()) => {}
                Err(Error::SubscriptionNotFound) => info!("{} was already gone", id),
                Err(e) => error!("Could not remove {}: {}", id, e),
            }
        }
    }

    handle.graceful_shutdown(Some(Duration::from_secs(5)));
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Webhook server error: {}", e),
        Err(e) => error!("Webhook server task failed: {}", e),
    }
    info!("Server shutdown complete.");
    Ok(())
}

/// Creates every requested subscription concurrently, returning the IDs that succeeded.
async fn create_all(client: &Arc<Client>, subscriptions: Vec<SubscriptionArg>) -> Vec<String> {
    let mut tasks = JoinSet::new();
    for arg in subscriptions {
        let client = client.clone();
        tasks.spawn(async move {
            let result = client
                .create_subscription(&arg.sub_type, &arg.version, arg.condition.clone())
                .await;
            (arg, result)
        });
    }

    let mut created = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let Ok((arg, result)) = joined else {
            continue;
        };
        match result {
            Ok(id) => {
                info!("Subscribed to {} v{} as {}", arg.sub_type, arg.version, id);
                created.push(id);
            }
            Err(Error::DuplicateSubscription { .. }) => {
                info!("{} already subscribed with that condition", arg.sub_type)
            }
            Err(e) => {
                if let Some(orphan) = e.orphaned_subscription() {
                    warn!(
                        "{} may still exist in a pending state; remove it with `maowhook remove {}`",
                        orphan.id, orphan.id
                    );
                }
                error!("Failed to subscribe to {}: {}", arg.sub_type, e);
            }
        }
    }
    created
}
