use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::BlogError;
use crate::helper::auth_helpers::{AccessGate, SessionClaims};
use crate::middleware::{AdminSession, SESSION_CLAIMS_KEY};
use crate::routes::run_blocking;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

fn session_body(claims: &SessionClaims) -> serde_json::Value {
    json!({
        "user": {
            "id": claims.sub,
            "email": claims.email,
            "name": claims.name,
            "role": claims.role,
        },
        "expiresAt": claims.expires_at,
    })
}

/// Starts a fresh session for the administrator and stores the claims in it.
pub fn start_admin_session(session: &Session, claims: &SessionClaims) -> Result<(), actix_web::Error> {
    session.renew();
    session.insert(SESSION_CLAIMS_KEY, claims)?;
    Ok(())
}

/// POST /api/auth/login
pub async fn login(
    req: HttpRequest,
    session: Session,
    gate: web::Data<AccessGate>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let LoginRequest { email, password } = body.into_inner();
    let outcome = run_blocking(move || gate.authenticate(email.as_deref(), password.as_deref())).await;
    match outcome {
        Ok(claims) => {
            start_admin_session(&session, &claims)?;
            log::info!("Admin signed in via API");
            Ok(HttpResponse::Ok().json(session_body(&claims)))
        }
        Err(e) => {
            log::warn!(
                "Failed admin login attempt from {}",
                req.connection_info().realip_remote_addr().unwrap_or("unknown")
            );
            Err(e.into())
        }
    }
}

/// POST /api/auth/logout
pub async fn logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(json!({ "message": "Signed out" }))
}

/// GET /api/auth/session
pub async fn current_session(admin: AdminSession) -> Result<HttpResponse, BlogError> {
    Ok(HttpResponse::Ok().json(session_body(&admin.0)))
}
