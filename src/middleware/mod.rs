use actix_session::{
    config::PersistentSession, storage::CookieSessionStore, Session, SessionExt, SessionMiddleware,
};
use actix_web::{
    body::EitherBody,
    cookie::{time, Key, SameSite},
    dev::{self, forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, FromRequest, HttpRequest, HttpResponse,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::future::{ready, Ready as StdReady};
use std::rc::Rc;

use crate::error::BlogError;
use crate::helper::auth_helpers::{is_session_valid, SessionClaims};

pub const SESSION_CLAIMS_KEY: &str = "admin_session";
pub const LOGIN_PATH: &str = "/admin/login";

/// Private (encrypted and signed) cookie session that outlives browser
/// restarts for `ttl_hours`.
pub fn session_middleware(
    key: Key,
    secure: bool,
    ttl_hours: i64,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(time::Duration::hours(ttl_hours)))
        .build()
}

pub fn read_claims(session: &Session) -> Option<SessionClaims> {
    session.get::<SessionClaims>(SESSION_CLAIMS_KEY).unwrap_or(None)
}

pub fn admin_guard(session: &Session) -> bool {
    is_session_valid(read_claims(session).as_ref())
}

/// Extractor for JSON endpoints that require the administrator. Rejects with
/// 401 instead of redirecting.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionClaims);

impl FromRequest for AdminSession {
    type Error = BlogError;
    type Future = StdReady<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        match read_claims(&session) {
            Some(claims) if is_session_valid(Some(&claims)) => ready(Ok(AdminSession(claims))),
            Some(_) => {
                log::info!("Rejected expired admin session on {}", req.path());
                session.remove(SESSION_CLAIMS_KEY);
                ready(Err(BlogError::Unauthorized))
            }
            None => ready(Err(BlogError::Unauthorized)),
        }
    }
}

/// Guards the admin pages: requests without a valid admin session are
/// redirected to the login page instead of reaching the handler.
pub struct AdminGate {
    login_path: Rc<str>,
}

impl AdminGate {
    pub fn redirect_to(login_path: &str) -> Self {
        AdminGate {
            login_path: Rc::from(login_path),
        }
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        AdminGate::redirect_to(LOGIN_PATH)
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminGateMiddleware {
            service,
            login_path: self.login_path.clone(),
        })
    }
}

pub struct AdminGateMiddleware<S> {
    service: S,
    login_path: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for AdminGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if admin_guard(&req.get_session()) {
            let fut = self.service.call(req);
            Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            })
        } else {
            let login_path = self.login_path.to_string();
            Box::pin(async move {
                let (http_req, _payload) = req.into_parts();
                let res = HttpResponse::Found()
                    .append_header((header::LOCATION, login_path))
                    .finish()
                    .map_into_right_body();
                Ok(ServiceResponse::new(http_req, res))
            })
        }
    }
}
