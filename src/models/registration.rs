use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration of a repository, stored in the `repos` hash under
/// `owner:name`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepoRecord {
    pub owner: String,
    pub name: String,
    #[serde(rename = "HookID")]
    pub hook_id: i64,
    pub access_token: String,
    pub hook_path: String,
}

/// Secret material for one callback path, stored in the `hooks` hash under
/// the path token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HookRecord {
    pub owner: String,
    pub name: String,
    pub secret: String,
}

/// Everything the store needs to persist one registration.
#[derive(Clone)]
pub struct NewRegistration {
    pub owner: String,
    pub name: String,
    pub token: String,
    pub secret: String,
    pub hook_id: i64,
    pub access_token: String,
}

impl RepoRecord {
    pub fn key(owner: &str, name: &str) -> String {
        format!("{owner}:{name}")
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl NewRegistration {
    pub fn repo_record(&self) -> RepoRecord {
        RepoRecord {
            owner: self.owner.clone(),
            name: self.name.clone(),
            hook_id: self.hook_id,
            access_token: self.access_token.clone(),
            hook_path: self.token.clone(),
        }
    }

    pub fn hook_record(&self) -> HookRecord {
        HookRecord {
            owner: self.owner.clone(),
            name: self.name.clone(),
            secret: self.secret.clone(),
        }
    }
}

// Credentials stay out of Debug output so records can be logged safely.

impl fmt::Debug for RepoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoRecord")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("hook_id", &self.hook_id)
            .field("access_token", &"<redacted>")
            .field("hook_path", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for HookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRecord")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for NewRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRegistration")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("hook_id", &self.hook_id)
            .finish_non_exhaustive()
    }
}
