use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::helper::auth_helpers::{self, AuthError, RegistrationError, INVALID_CREDENTIALS_MESSAGE};
use crate::helper::token_helpers::TokenIssuer;
use crate::routes::{internal_error, validation_problem};
use crate::DbPool;

#[derive(Deserialize)]
struct CredentialsRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    email: String,
    roles: Vec<String>,
    token: String,
}

pub fn config_auth(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/register", web::post().to(register)),
    );
}

async fn login(
    pool: web::Data<DbPool>,
    issuer: web::Data<TokenIssuer>,
    body: web::Json<CredentialsRequest>,
) -> impl Responder {
    let CredentialsRequest { email, password } = body.into_inner();
    // bcrypt is CPU-bound; run it on the blocking pool so the worker keeps serving.
    let result = web::block(move || {
        auth_helpers::login(pool.get_ref(), issuer.get_ref(), &email, &password)
    })
    .await;

    match result {
        Ok(Ok(outcome)) => HttpResponse::Ok().json(LoginResponse {
            email: outcome.email,
            roles: outcome.roles.iter().map(|r| r.name().to_string()).collect(),
            token: outcome.token,
        }),
        Ok(Err(AuthError::InvalidCredentials)) => {
            log::warn!("Failed login attempt");
            validation_problem(vec![INVALID_CREDENTIALS_MESSAGE.to_string()])
        }
        Ok(Err(e)) => internal_error("Login failed", e),
        Err(e) => internal_error("Login task failed", e),
    }
}

async fn register(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<CredentialsRequest>,
) -> impl Responder {
    let CredentialsRequest { email, password } = body.into_inner();
    let cost = config.password_hash_cost;
    let result = web::block(move || auth_helpers::register(pool.get_ref(), &email, &password, cost)).await;

    match result {
        Ok(Ok(_)) => HttpResponse::Ok().finish(),
        Ok(Err(RegistrationError::Validation(errors))) => validation_problem(errors),
        Ok(Err(e)) => internal_error("Registration failed", e),
        Err(e) => internal_error("Registration task failed", e),
    }
}
