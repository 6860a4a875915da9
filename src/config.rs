use std::{env, net::SocketAddr, path::PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub data_root: PathBuf,
    pub cookie_secret: String,
    /// Mail domain the cosmetic login check insists on, without the `@`.
    pub login_email_domain: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let listen_addr: SocketAddr = env::var("TRIPS_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid TRIPS_LISTEN_ADDR: {err}")))?;

        let data_root = env::var("TRIPS_DATA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-trip-planner-cookie-secret".to_string());

        let login_email_domain = env::var("LOGIN_EMAIL_DOMAIN")
            .map(|domain| domain.trim().trim_start_matches('@').to_string())
            .unwrap_or_else(|_| "gmail.com".to_string());
        if login_email_domain.is_empty() {
            return Err(AppError::Config(
                "LOGIN_EMAIL_DOMAIN must not be empty".to_string(),
            ));
        }

        Ok(Self {
            listen_addr,
            data_root,
            cookie_secret,
            login_email_domain,
        })
    }
}
