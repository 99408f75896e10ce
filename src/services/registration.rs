use std::sync::Arc;

use crate::db::{HookStore, StoreError};
use crate::models::github::CreateHook;
use crate::models::{NewRegistration, RepoRecord};
use crate::services::github::{GithubApi, GithubError};
use crate::utils::secret::{self, HOOK_PATH_LEN, HOOK_SECRET_LEN};

/// Attempts at finding an unused callback token before giving up.
const MAX_TOKEN_ATTEMPTS: usize = 5;

/// Installs GitHub webhooks and records where their deliveries land.
pub struct RegistrationService {
    store: Arc<dyn HookStore>,
    github: Arc<dyn GithubApi>,
    public_url: String,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn HookStore>, github: Arc<dyn GithubApi>, public_url: &str) -> Self {
        RegistrationService {
            store,
            github,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a webhook on `owner/name` pointing at a fresh capability URL
    /// and persists the registration.
    ///
    /// A failure after GitHub accepted the hook leaves it orphaned on the
    /// remote side; that case is logged with the remote id for manual cleanup.
    /// The remote hook retired afterwards is the one the store write actually
    /// replaced, so overlapping installs each delete a distinct hook.
    pub async fn install(
        &self,
        owner: &str,
        name: &str,
        access_token: &str,
    ) -> Result<RepoRecord, RegistrationError> {
        let token = self.unused_token().await?;
        let secret = secret::generate(HOOK_SECRET_LEN);
        let hook_url = format!("{}/hooks/{}", self.public_url, token);

        let hook = self
            .github
            .create_hook(access_token, owner, name, &CreateHook::web(hook_url, secret.clone()))
            .await?;

        if !hook.active {
            log::warn!("GitHub created hook {} on {owner}/{name} inactive", hook.id);
        }

        let registration = NewRegistration {
            owner: owner.to_string(),
            name: name.to_string(),
            token,
            secret,
            hook_id: hook.id,
            access_token: access_token.to_string(),
        };

        let replaced = match self.store.register_hook(&registration).await {
            Ok(replaced) => replaced,
            Err(e) => {
                log::error!(
                    "Orphaned GitHub hook {} on {owner}/{name}: created remotely but not stored: {e}",
                    hook.id
                );
                return Err(match e {
                    StoreError::Conflict => RegistrationError::TokenCollision,
                    other => RegistrationError::Store(other),
                });
            }
        };

        if let Some(replaced) = replaced {
            self.retire_remote_hook(&replaced).await;
        }

        Ok(registration.repo_record())
    }

    async fn unused_token(&self) -> Result<String, RegistrationError> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = secret::generate(HOOK_PATH_LEN);
            if !self.store.hook_exists(&token).await? {
                return Ok(token);
            }
            log::warn!("Generated hook token collided with an existing registration");
        }
        Err(RegistrationError::TokenCollision)
    }

    async fn retire_remote_hook(&self, previous: &RepoRecord) {
        match self
            .github
            .delete_hook(
                &previous.access_token,
                &previous.owner,
                &previous.name,
                previous.hook_id,
            )
            .await
        {
            Ok(()) => log::info!(
                "Deleted superseded GitHub hook {} on {}",
                previous.hook_id,
                previous.full_name()
            ),
            Err(e) => log::warn!(
                "Could not delete superseded GitHub hook {} on {}: {e}",
                previous.hook_id,
                previous.full_name()
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("GitHub API error: {0}")]
    Github(#[from] GithubError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Could not mint an unused hook token")]
    TokenCollision,
}
