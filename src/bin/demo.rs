//! Sign in the development user, create a couple of tasks and print the board.
//!
//! Set `TASKBOARD_ACCESS_TOKEN` to a Google OAuth access token to also display your calendar, tasks and mail.
//! You can also set the RUST_LOG environment variable to display more info.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use taskboard::client::GoogleClient;
use taskboard::config::IntegrationConfig;
use taskboard::identity::{AccessCredential, AuthProvider, DevIdentityProvider};
use taskboard::memory_store::MemoryStore;
use taskboard::storage::LocalStorage;
use taskboard::task::{NewTask, Priority, TaskStatus};
use taskboard::Dashboard;

const STORAGE_FILE: &str = "taskboard_storage.json";


#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut provider = DevIdentityProvider::new();
    if let Ok(token) = std::env::var("TASKBOARD_ACCESS_TOKEN") {
        provider = provider.granting(AccessCredential::new(token));
    }

    let config = IntegrationConfig::from_env();
    let storage = Arc::new(LocalStorage::open_or_create(Path::new(STORAGE_FILE)));
    let mut dashboard = Dashboard::new(
        Arc::new(provider),
        Arc::new(MemoryStore::new()),
        Arc::new(GoogleClient::new(config.clone())),
        config,
        storage,
    );

    let identity = match dashboard.sign_in(AuthProvider::Google).await? {
        None => {
            println!("Sign-in cancelled");
            return Ok(());
        },
        Some(identity) => identity,
    };
    println!("Signed in as {} (language: {})", identity.display_name(), dashboard.language());

    let mut changes = dashboard.changes();
    dashboard.create_task(NewTask::new("Write the weekly report", "")).await?;
    changes.changed().await?;
    dashboard.create_task(NewTask::new("Book the venue", "Before Friday")
        .with_status(TaskStatus::InProgress)
        .with_priority(Priority::High)).await?;
    changes.changed().await?;

    println!("---- board -----");
    taskboard::utils::print_board(&dashboard.board());

    println!("---- integration: {} -----", dashboard.integration_state());
    if let Some(msg) = dashboard.panel().error_message() {
        println!("{}", msg);
    }
    taskboard::utils::print_integration(dashboard.panel().data());

    dashboard.sign_out().await;
    Ok(())
}
