use actix_web::HttpRequest;

/// Pulls the caller's GitHub access token from `Authorization`.
///
/// Accepts both `Bearer <token>` and GitHub's legacy `token <token>` form.
pub fn access_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get("Authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") && !scheme.eq_ignore_ascii_case("token") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
