use serde::{Deserialize, Serialize};

/// Events every registered hook subscribes to.
pub const HOOK_EVENTS: &[&str] = &[
    "issue_comment",
    "issues",
    "pull_request_review_comment",
    "pull_request",
    "push",
    "status",
];

/// Body of `POST /repos/{owner}/{repo}/hooks`.
#[derive(Serialize)]
pub struct CreateHook {
    pub name: &'static str,
    pub active: bool,
    pub events: Vec<&'static str>,
    pub config: HookConfig,
}

#[derive(Serialize)]
pub struct HookConfig {
    pub url: String,
    pub content_type: &'static str,
    pub secret: String,
    pub insecure_ssl: &'static str,
}

/// The subset of GitHub's hook resource this service reads back.
#[derive(Debug, Clone, Deserialize)]
pub struct Hook {
    pub id: i64,
    #[serde(default)]
    pub active: bool,
}

impl CreateHook {
    pub fn web(url: String, secret: String) -> Self {
        CreateHook {
            name: "web",
            active: true,
            events: HOOK_EVENTS.to_vec(),
            config: HookConfig {
                url,
                content_type: "json",
                secret,
                insecure_ssl: "0",
            },
        }
    }
}
