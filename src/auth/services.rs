use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::{
    jwt::IssuedToken,
    password::{hash_password, verify_against_dummy, verify_password},
    repo_types::User,
};
use crate::config::SeedAdmin;
use crate::db::{bounded, StoreError};
use crate::error::AppError;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

/// Emails are compared case-insensitively: every write and lookup goes
/// through this.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Verifies credentials and issues an access token. Unknown email and wrong
/// password fail identically.
pub async fn login(
    st: &AppState,
    email: &str,
    password: &str,
    now: OffsetDateTime,
) -> Result<IssuedToken, AppError> {
    let email = normalize_email(email);

    let user = bounded(st.store_deadline(), st.users.find_by_email(&email)).await?;
    let Some(user) = user else {
        verify_against_dummy(password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let issued = st.keys.issue(user.id, now)?;
    info!(user_id = user.id, "user logged in");
    Ok(issued)
}

pub async fn register(
    st: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let name = name.trim();
    let email = normalize_email(email);

    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("invalid email".into()));
    }
    check_password_strength(password)?;

    let deadline = st.store_deadline();
    if bounded(deadline, st.users.find_by_email(&email)).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("email already registered".into()));
    }

    let hash = hash_password(password)?;
    let user = match bounded(deadline, st.users.create(name, &email, &hash)).await {
        Ok(u) => u,
        Err(StoreError::UniqueViolation(_)) => {
            return Err(AppError::Conflict("email already registered".into()))
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

pub async fn profile(st: &AppState, user_id: i64) -> Result<User, AppError> {
    bounded(st.store_deadline(), st.users.find_by_id(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))
}

pub async fn change_password(
    st: &AppState,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    check_password_strength(new_password)?;
    let user = profile(st, user_id).await?;

    if !verify_password(current_password, &user.password_hash)? {
        warn!(user_id, "password change with wrong current password");
        return Err(AppError::InvalidCredentials);
    }

    let hash = hash_password(new_password)?;
    let updated = bounded(
        st.store_deadline(),
        st.users.update_password_hash(user_id, &hash),
    )
    .await?;
    if !updated {
        return Err(AppError::NotFound(format!("user {user_id} not found")));
    }

    info!(user_id, "password changed");
    Ok(())
}

/// Makes sure the configured admin account exists. Leaves an existing
/// account untouched.
pub async fn seed_admin(st: &AppState, seed: &SeedAdmin) -> Result<User, AppError> {
    let email = normalize_email(&seed.email);
    if let Some(existing) = bounded(st.store_deadline(), st.users.find_by_email(&email)).await? {
        info!(user_id = existing.id, "admin already seeded");
        return Ok(existing);
    }
    register(st, &seed.name, &email, &seed.password).await
}
