use std::sync::Arc;

use access::validation::CreateUserInput;
use access::{AccessError, BcryptHasher, SharedHasher, UserLifecycle};
use anyhow::{Result, anyhow};
use sea_orm::Database;
use tracing::{error, info, trace};

use crate::config::Settings;

/// Account details of the administrator to create.
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

pub async fn create_admin(settings: &Settings, account: AdminAccount) -> Result<()> {
    trace!("Entering create_admin function");
    info!("Creating SUPER_ADMIN account {}", account.username);

    let db = Database::connect(&settings.database_url).await?;
    let hasher: SharedHasher = Arc::new(BcryptHasher::new(settings.bcrypt_cost));
    let input = CreateUserInput {
        username: Some(account.username),
        email: Some(account.email),
        password: Some(account.password),
        full_name: account.full_name,
        avatar_url: None,
        role_id: None,
    };

    match UserLifecycle::new(&db, &hasher).bootstrap_super_admin(input).await {
        Ok(user) => {
            info!("Administrator {} created with ID {}", user.username, user.user_id);
            Ok(())
        }
        Err(AccessError::Validation(issues)) => {
            for issue in &issues {
                error!("{}: {}", issue.path.join("."), issue.message);
            }
            Err(anyhow!("Administrator account is invalid"))
        }
        Err(e) => {
            error!("Failed to create administrator: {}", e);
            Err(e.into())
        }
    }
}
