use std::future::Future;

use anyhow::{Result, bail};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use log::{info, warn};
use uuid::Uuid;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

pub const SIGN_IN_FAILED: &str = "invalid email or password";

const STATIC_PREFIXES: [&str; 2] = ["/static/", "/favicon.ico"];
const STATIC_EXTENSIONS: [&str; 6] = ["svg", "png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Identity store the session verifies passwords against.
pub trait Authenticator: Send + Sync {
    fn find_credentials(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Credentials>>> + Send;
}

#[derive(Debug)]
pub struct Session<A> {
    authenticator: A,
    user: Option<User>,
}

impl<A: Authenticator> Session<A> {
    pub fn new(authenticator: A) -> Self {
        Self {
            authenticator,
            user: None,
        }
    }

    /// Every failure, including a failed lookup, reports the same message.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&User> {
        let credentials = match self.authenticator.find_credentials(email).await {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!("failed to look up credentials: {err:#}");
                None
            }
        };

        let Some(credentials) =
            credentials.filter(|c| verify_password(&c.password_hash, password))
        else {
            bail!(SIGN_IN_FAILED);
        };

        info!("signed in: {}", credentials.user.email);
        Ok(self.user.insert(credentials.user))
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!("signed out: {}", user.email);
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let Ok(hash) = PasswordHash::new(password_hash) else {
        warn!("stored password hash is malformed");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Pass,
    Redirect(&'static str),
}

/// Login gate: signed-out users only reach the login page, signed-in users
/// never see it.
pub fn gate(path: &str, user: Option<&User>) -> Gate {
    if is_static_asset(path) {
        return Gate::Pass;
    }

    match (user, path.starts_with(LOGIN_PATH)) {
        (None, false) => Gate::Redirect(LOGIN_PATH),
        (Some(_), true) => Gate::Redirect(HOME_PATH),
        _ => Gate::Pass,
    }
}

fn is_static_asset(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }

    path.rsplit_once('.')
        .is_some_and(|(_, ext)| STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
