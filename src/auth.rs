//! Nominal login. The session only remembers which email is logged in; there
//! are no passwords on record and nothing is verified beyond the input format.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};

use crate::{config::AppConfig, error::AppError, models::user::UserIdentity, state::AppState};

pub const SESSION_COOKIE: &str = "loggedInUser";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<UserIdentity>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar =
            PrivateCookieJar::<Key>::from_headers(&parts.headers, state.cookie_key.clone());
        let identity = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| UserIdentity::new(cookie.value()).ok());
        Ok(Self(identity))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&UserIdentity, AppError> {
        self.0.as_ref().ok_or(AppError::IdentityMissing)
    }
}

/// Format check only: an address at the configured mail domain and a
/// password of at least [`MIN_PASSWORD_LEN`] characters.
pub fn check_login(
    config: &AppConfig,
    email: &str,
    password: &str,
) -> Result<UserIdentity, AppError> {
    let email = email.trim();
    let suffix = format!("@{}", config.login_email_domain);
    let has_local_part = email.len() > suffix.len();
    if !email.ends_with(&suffix)
        || !has_local_part
        || password.trim().chars().count() < MIN_PASSWORD_LEN
    {
        return Err(AppError::BadRequest(format!(
            "Please use a valid {} address and a password of at least {MIN_PASSWORD_LEN} characters.",
            config.login_email_domain
        )));
    }
    UserIdentity::new(email)
}

pub fn apply_session_cookie(jar: PrivateCookieJar, identity: &UserIdentity) -> PrivateCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, identity.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
