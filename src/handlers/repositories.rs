use actix_web::{web, HttpRequest, HttpResponse, Result};
use maud::{html, DOCTYPE};
use serde::Serialize;

use crate::db::HookStore;
use crate::models::RepoRecord;
use crate::services::{GithubApi, RegistrationError, RegistrationService};
use crate::utils::access_token;

/// Public view of a registration. Never carries the secret, the access token
/// or the callback path.
#[derive(Debug, Serialize)]
pub struct HookStatus {
    pub owner: String,
    pub name: String,
    pub installed: bool,
    pub hook_id: Option<i64>,
}

impl HookStatus {
    fn new(owner: &str, name: &str, record: Option<&RepoRecord>) -> Self {
        HookStatus {
            owner: owner.to_string(),
            name: name.to_string(),
            installed: record.is_some(),
            hook_id: record.map(|r| r.hook_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RepositoryEntry {
    pub id: i64,
    pub full_name: String,
    pub owner: String,
    pub name: String,
    pub private: bool,
    pub url: String,
    pub installed: bool,
}

pub async fn install_hook(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    registration: web::Data<RegistrationService>,
) -> Result<HttpResponse> {
    let (owner, name) = path.into_inner();
    let token = access_token(&req)
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("Missing access token"))?;

    match registration.install(&owner, &name, &token).await {
        Ok(record) => {
            log::info!("Installed hook for {}", record.full_name());
            Ok(HttpResponse::Created().json(HookStatus::new(&owner, &name, Some(&record))))
        }
        Err(e) => {
            log::error!("Failed to install hook for {owner}/{name}: {e}");
            Ok(registration_failure(&e))
        }
    }
}

pub async fn hook_status(
    path: web::Path<(String, String)>,
    store: web::Data<dyn HookStore>,
) -> Result<HttpResponse> {
    let (owner, name) = path.into_inner();

    let record = store.get_repo_info(&owner, &name).await.map_err(|e| {
        log::error!("Failed to load registration for {owner}/{name}: {e}");
        actix_web::error::ErrorInternalServerError("Failed to load registration")
    })?;

    Ok(HttpResponse::Ok().json(HookStatus::new(&owner, &name, record.as_ref())))
}

pub async fn list_repositories(
    req: HttpRequest,
    github: web::Data<dyn GithubApi>,
    store: web::Data<dyn HookStore>,
) -> Result<HttpResponse> {
    let token = access_token(&req)
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("Missing access token"))?;

    let repositories = github.list_repositories(&token).await.map_err(|e| {
        log::error!("Failed to list repositories: {e}");
        if e.is_unauthorized() {
            actix_web::error::ErrorUnauthorized("GitHub rejected the access token")
        } else {
            actix_web::error::ErrorBadGateway("Failed to list repositories")
        }
    })?;

    let mut entries = Vec::with_capacity(repositories.len());
    for repo in repositories {
        let installed = store
            .get_repo_info(&repo.owner.login, &repo.name)
            .await
            .map_err(|e| {
                log::error!("Failed to load registration for {}: {e}", repo.full_name);
                actix_web::error::ErrorInternalServerError("Failed to load registrations")
            })?
            .is_some();

        entries.push(RepositoryEntry {
            id: repo.id,
            full_name: repo.full_name,
            owner: repo.owner.login,
            name: repo.name,
            private: repo.private,
            url: repo.html_url,
            installed,
        });
    }

    Ok(HttpResponse::Ok().json(entries))
}

pub async fn repository_detail(
    path: web::Path<(String, String)>,
    store: web::Data<dyn HookStore>,
) -> Result<HttpResponse> {
    let (owner, name) = path.into_inner();

    let record = store
        .get_repo_info(&owner, &name)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (owner) "/" (name) " - hookline" }
            }
            body {
                h1 { (owner) "/" (name) }
                @if let Some(record) = &record {
                    p { "Webhook installed." }
                    dl {
                        dt { "GitHub hook id" }
                        dd { (record.hook_id) }
                    }
                } @else {
                    p { "No webhook installed for this repository." }
                }
                a href=(format!("https://github.com/{owner}/{name}")) target="_blank" {
                    "View on GitHub"
                }
            }
        }
    };

    Ok(HttpResponse::Ok()
        .content_type("text/html")
        .body(markup.into_string()))
}

fn registration_failure(err: &RegistrationError) -> HttpResponse {
    match err {
        RegistrationError::Github(e) if e.is_unauthorized() => HttpResponse::Unauthorized()
            .json(serde_json::json!({
                "error": "GitHub rejected the access token"
            })),
        RegistrationError::Github(_) => HttpResponse::BadGateway().json(serde_json::json!({
            "error": "Failed to create webhook on GitHub"
        })),
        RegistrationError::TokenCollision => HttpResponse::Conflict().json(serde_json::json!({
            "error": "Could not allocate a hook path, try again"
        })),
        RegistrationError::Store(_) => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to store registration"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryHookStore;
    use crate::services::github::fake::FakeGithub;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    struct Deps {
        store: Arc<MemoryHookStore>,
        github: Arc<FakeGithub>,
    }

    impl Deps {
        fn new(github: FakeGithub) -> Self {
            Deps {
                store: Arc::new(MemoryHookStore::new()),
                github: Arc::new(github),
            }
        }

        fn store_data(&self) -> web::Data<dyn HookStore> {
            let store: Arc<dyn HookStore> = self.store.clone();
            web::Data::from(store)
        }

        fn github_data(&self) -> web::Data<dyn GithubApi> {
            let github: Arc<dyn GithubApi> = self.github.clone();
            web::Data::from(github)
        }

        fn registration(&self) -> web::Data<RegistrationService> {
            web::Data::new(RegistrationService::new(
                self.store.clone(),
                self.github.clone(),
                "https://hooks.example.com",
            ))
        }
    }

    #[actix_web::test]
    async fn test_install_then_status() {
        let deps = Deps::new(FakeGithub::new());
        let app = test::init_service(
            App::new()
                .app_data(deps.registration())
                .app_data(deps.store_data())
                .route("/api/repos/{owner}/{name}/hook", web::post().to(install_hook))
                .route("/api/repos/{owner}/{name}/hook", web::get().to(hook_status)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/repos/acme/widgets/hook")
            .insert_header(("Authorization", "Bearer gho_abc123"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        let secret = deps.github.created()[0].secret.clone();
        assert!(!text.contains(&secret));
        assert!(!text.contains("gho_abc123"));

        let req = test::TestRequest::get()
            .uri("/api/repos/acme/widgets/hook")
            .to_request();
        let status: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status["installed"], true);
        assert_eq!(status["hook_id"], 1000);
    }

    #[actix_web::test]
    async fn test_install_requires_token() {
        let deps = Deps::new(FakeGithub::new());
        let app = test::init_service(
            App::new()
                .app_data(deps.registration())
                .route("/api/repos/{owner}/{name}/hook", web::post().to(install_hook)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/repos/acme/widgets/hook")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(deps.github.created().is_empty());
    }

    #[actix_web::test]
    async fn test_install_remote_failure_is_bad_gateway() {
        let deps = Deps::new(FakeGithub::failing());
        let app = test::init_service(
            App::new()
                .app_data(deps.registration())
                .route("/api/repos/{owner}/{name}/hook", web::post().to(install_hook)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/repos/acme/widgets/hook")
            .insert_header(("Authorization", "token gho_abc123"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_list_repositories_marks_installed() {
        let deps = Deps::new(FakeGithub::with_repos(&["acme/widgets", "acme/gadgets"]));
        deps.registration()
            .install("acme", "widgets", "gho_abc123")
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(deps.store_data())
                .app_data(deps.github_data())
                .route("/api/repos", web::get().to(list_repositories)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/repos")
            .insert_header(("Authorization", "Bearer gho_abc123"))
            .to_request();
        let repos: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(repos[0]["full_name"], "acme/widgets");
        assert_eq!(repos[0]["installed"], true);
        assert_eq!(repos[1]["full_name"], "acme/gadgets");
        assert_eq!(repos[1]["installed"], false);
    }

    #[actix_web::test]
    async fn test_repository_detail_page() {
        let deps = Deps::new(FakeGithub::new());
        let record = deps
            .registration()
            .install("acme", "widgets", "gho_abc123")
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(deps.store_data())
                .route("/repo/{owner}/{name}", web::get().to(repository_detail)),
        )
        .await;

        let req = test::TestRequest::get().uri("/repo/acme/widgets").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let page = String::from_utf8(body.to_vec()).unwrap();

        assert!(page.contains("Webhook installed."));
        assert!(!page.contains(&record.hook_path));
        assert!(!page.contains("gho_abc123"));

        let req = test::TestRequest::get().uri("/repo/acme/gadgets").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let page = String::from_utf8(body.to_vec()).unwrap();

        assert!(page.contains("No webhook installed"));
    }
}
