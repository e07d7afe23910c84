use actix_web::{dev, http::header, web, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::helper::token_helpers::{AccessClaims, TokenIssuer};
use crate::models::Role;

/// Extracting this rejects the request unless it carries a valid bearer token
/// granting the Writer role. Place it first in a handler's arguments so the check
/// runs before the body is read.
pub struct WriterAccess {
    pub claims: AccessClaims,
}

impl FromRequest for WriterAccess {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        ready(authorize(req, Role::Writer).map(|claims| WriterAccess { claims }))
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn authorize(req: &HttpRequest, role: Role) -> Result<AccessClaims, Error> {
    let issuer = match req.app_data::<web::Data<TokenIssuer>>() {
        Some(issuer) => issuer,
        None => {
            log::error!("TokenIssuer is not registered as app data; refusing protected request.");
            return Err(actix_web::error::ErrorInternalServerError("Server misconfigured."));
        }
    };

    let token = bearer_token(req).ok_or_else(|| actix_web::error::ErrorUnauthorized("Missing bearer token."))?;

    let claims = issuer.verify(token).map_err(|e| {
        log::warn!("Rejected bearer token for {}: {}", req.path(), e);
        actix_web::error::ErrorUnauthorized("Invalid or expired token.")
    })?;

    if !claims.has_role(role) {
        log::warn!("User '{}' lacks the {} role for {}", claims.email, role.name(), req.path());
        return Err(actix_web::error::ErrorForbidden("Insufficient role."));
    }

    Ok(claims)
}
