//! Grievance portal command-line shell.
//!
//! Wires configuration, logging, durable session storage and the API client
//! together. The session survives between invocations in the storage file.
//!
//! # Usage
//!
//! ```bash
//! grievance status                   # who is signed in
//! GRIEVANCE_PASSWORD=... grievance login alice
//! grievance check                    # re-validate the stored token
//! grievance me                       # ask the backend who we are
//! grievance complaints               # list complaints for the current role
//! grievance comments 12              # comment thread of complaint 12
//! grievance timeline 12              # escalation timeline of complaint 12
//! grievance logout
//! ```

use anyhow::{Context, bail};
use grievance_client::{ApiClient, Config};
use grievance_core::{Credentials, SystemClock};
use grievance_session::providers::{ChannelNavigator, HttpAuthApi};
use grievance_session::stores::FileStore;
use grievance_session::{SessionEnvironment, SessionManager};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    grievance_session::metrics::register_metrics();
    grievance_client::metrics::register_metrics();

    tracing::debug!(
        api = %config.api_base_url,
        storage = %config.storage_path.display(),
        "Configuration loaded"
    );

    // A corrupt store reads as signed out instead of blocking every command
    let storage = FileStore::open_or_reset(&config.storage_path)
        .await
        .with_context(|| format!("opening {}", config.storage_path.display()))?;
    let auth = HttpAuthApi::new(&config.api_base_url, config.request_timeout)?;
    let (navigator, mut redirects) = ChannelNavigator::new();

    let manager = Arc::new(SessionManager::new(SessionEnvironment::new(
        storage,
        auth,
        navigator,
        SystemClock,
    )));
    manager.initialize().await;

    let api = ApiClient::new(
        &config.api_base_url,
        config.request_timeout,
        manager.bearer(),
        Arc::clone(&manager),
    )?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map_or("status", String::as_str);

    match command {
        "status" => match manager.current_session() {
            Some(session) => println!(
                "{} ({}) signed in as {}",
                session.username, session.email, session.role
            ),
            None => println!("not signed in"),
        },
        "login" => {
            let username = args.get(1).context("usage: grievance login <username>")?;
            let password = std::env::var("GRIEVANCE_PASSWORD")
                .context("set GRIEVANCE_PASSWORD to the account password")?;

            let session = manager
                .login(&Credentials::new(username.as_str(), password))
                .await?;
            println!(
                "signed in as {} ({}), landing on {}",
                session.username,
                session.role,
                manager.landing().path()
            );
        }
        "logout" => {
            manager.logout().await;
            println!("signed out");
        }
        "check" => {
            if manager.is_authenticated().await {
                println!("session valid");
            } else {
                println!("no valid session");
            }
        }
        "me" => {
            let user = api.me().await?;
            println!("{} <{}> {}", user.username, user.email, user.role);
        }
        "complaints" => {
            let complaints = if manager.is_admin() {
                api.all_complaints().await?
            } else {
                api.my_complaints().await?
            };
            for complaint in complaints {
                println!(
                    "#{:<5} {:<12} {:<6} {}",
                    complaint.id,
                    complaint.status,
                    complaint.priority.as_str(),
                    complaint.title
                );
            }
        }
        "comments" => {
            let id = complaint_id(&args)?;
            for comment in api.comments(id, manager.is_admin()).await? {
                println!(
                    "{:<8} {:<20} {}",
                    comment.kind.as_str(),
                    comment.author_name.as_deref().unwrap_or("-"),
                    comment.content
                );
            }
        }
        "timeline" => {
            let timeline = api.escalation_timeline(complaint_id(&args)?).await?;
            if let Some(message) = &timeline.message {
                println!("{message}");
            }
            for entry in &timeline.entries {
                println!("[{:?}] {}", entry.status, entry.title);
            }
        }
        other => bail!("unknown command: {other}"),
    }

    while let Ok(destination) = redirects.try_recv() {
        tracing::info!(path = %destination.path(), "Redirected");
    }

    drop(api);
    if let Some(manager) = Arc::into_inner(manager) {
        manager.dispose();
    }

    Ok(())
}

fn complaint_id(args: &[String]) -> anyhow::Result<i64> {
    args.get(1)
        .context("usage: grievance <command> <complaint id>")?
        .parse()
        .context("complaint id must be a number")
}
