use rusqlite::ErrorCode;
use thiserror::Error;

use crate::helper::token_helpers::{TokenError, TokenIssuer};
use crate::models::db_operations::{users_db_operations, DbError, EntityStore};
use crate::models::{Identity, Role};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Email or Password Incorrect";
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email and wrong password are deliberately the same outcome.
    #[error("Email or Password Incorrect")]
    InvalidCredentials,
    #[error("Store error: {0}")]
    Store(#[from] DbError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Registration rejected: {}", .0.join(" "))]
    Validation(Vec<String>),
    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub email: String,
    pub roles: Vec<Role>,
    pub token: String,
}

pub fn login<S: EntityStore + ?Sized>(
    store: &S,
    issuer: &TokenIssuer,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, AuthError> {
    let conn = store.connection()?;
    let identity = users_db_operations::verify_credentials(&conn, email, password)
        .map_err(DbError::from)?
        .ok_or(AuthError::InvalidCredentials)?;

    let roles = users_db_operations::read_roles_for_user(&conn, identity.id).map_err(DbError::from)?;
    let token = issuer.issue_token(&identity, &roles)?;

    log::info!("User '{}' logged in with roles {:?}", identity.email, roles);
    Ok(LoginOutcome { email: email.to_string(), roles, token })
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// Strength policy for new passwords. Returns one message per unmet rule.
pub fn password_policy_violations(password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!("Passwords must be at least {} characters.", MIN_PASSWORD_LENGTH));
    }
    if password.chars().all(char::is_alphanumeric) {
        errors.push("Passwords must have at least one non alphanumeric character.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Passwords must have at least one digit ('0'-'9').".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Passwords must have at least one lowercase ('a'-'z').".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Passwords must have at least one uppercase ('A'-'Z').".to_string());
    }
    errors
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

/// Creates an identity holding exactly the Reader membership.
pub fn register<S: EntityStore + ?Sized>(
    store: &S,
    email: &str,
    password: &str,
    cost: u32,
) -> Result<Identity, RegistrationError> {
    let email = email.trim();
    let mut conn = store.connection()?;

    let mut errors = Vec::new();
    if !is_plausible_email(email) {
        errors.push(format!("Email '{}' is invalid.", email));
    } else if users_db_operations::email_exists(&conn, email).map_err(DbError::from)? {
        errors.push(format!("Email '{}' is already taken.", email));
    }
    errors.extend(password_policy_violations(password));
    if !errors.is_empty() {
        return Err(RegistrationError::Validation(errors));
    }

    let tx = conn.transaction().map_err(DbError::from)?;
    let identity = match users_db_operations::create_user(&tx, email, password, cost) {
        Ok(identity) => identity,
        Err(e) if is_unique_violation(&e) => {
            return Err(RegistrationError::Validation(vec![format!("Email '{}' is already taken.", email)]));
        }
        Err(e) => return Err(DbError::from(e).into()),
    };
    users_db_operations::add_user_to_role(&tx, identity.id, Role::Reader).map_err(DbError::from)?;
    tx.commit().map_err(DbError::from)?;

    log::info!("Registered new user '{}'", identity.email);
    Ok(identity)
}
