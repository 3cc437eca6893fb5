use anyhow::Context;

use crate::config::{self, StorageBackend};
use crate::database::DatabaseManager;

pub async fn handle() -> anyhow::Result<()> {
    let database = &config::config().database;
    if database.backend == StorageBackend::Memory {
        anyhow::bail!("STORAGE_BACKEND=memory has no schema to migrate");
    }

    let pool = DatabaseManager::connect(database)
        .await
        .context("failed to connect to the database")?;
    DatabaseManager::migrate(&pool).await.context("migration failed")?;
    println!("Migrations applied");
    Ok(())
}
