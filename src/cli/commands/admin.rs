use anyhow::{anyhow, Context};

use crate::config::{self, StorageBackend};
use crate::database::models::Role;
use crate::database::DatabaseManager;
use crate::services::accounts::{self, AccountError, RegistrationRequest};

pub async fn handle(username: String, email: String, password: String) -> anyhow::Result<()> {
    let database = &config::config().database;
    if database.backend == StorageBackend::Memory {
        anyhow::bail!("an admin created in the memory store would vanish on exit; set STORAGE_BACKEND=postgres");
    }

    let store = DatabaseManager::store(database)
        .await
        .context("failed to initialise the store")?;

    let request = RegistrationRequest {
        username,
        email,
        password2: password.clone(),
        password,
        first_name: String::new(),
        last_name: String::new(),
        role: Some(Role::Admin),
    };

    let user = match accounts::create_account(store.as_ref(), request, Role::Admin).await {
        Ok(user) => user,
        Err(AccountError::Invalid(errors)) => {
            let mut fields: Vec<String> = errors.into_iter().map(|(k, v)| format!("{k}: {v}")).collect();
            fields.sort();
            return Err(anyhow!("invalid account data:\n  {}", fields.join("\n  ")));
        }
        Err(e) => return Err(e.into()),
    };

    println!("Created admin '{}' ({})", user.username, user.id);
    Ok(())
}
