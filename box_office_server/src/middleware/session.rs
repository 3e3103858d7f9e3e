//! Session middleware.
//!
//! Resolves the bearer token in the `Auth` header into a [`Session`] and stores it in the request extensions, where
//! the ACL middleware and the [`Caller`] extractor find it. Requests without the header pass through anonymously; an
//! unknown or expired token is refused with 401 so that staff apps know to sign in again.

use std::{
    future::{ready, Ready},
    marker::PhantomData,
    pin::Pin,
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use box_office_engine::{db_types::Session, traits::SessionProvider, SessionApi};
use futures::Future;
use log::*;

use crate::errors::ServerError;

pub const AUTH_HEADER: &str = "Auth";

pub struct SessionMiddlewareFactory<D> {
    _db: PhantomData<fn() -> D>,
}

impl<D> SessionMiddlewareFactory<D> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { _db: PhantomData }
    }
}

impl<S, B, D> Transform<S, ServiceRequest> for SessionMiddlewareFactory<D>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    D: SessionProvider + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S, D>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService { service: Rc::new(service), _db: PhantomData }))
    }
}

pub struct SessionMiddlewareService<S, D> {
    service: Rc<S>,
    _db: PhantomData<fn() -> D>,
}

impl<S, B, D> Service<ServiceRequest> for SessionMiddlewareService<S, D>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    D: SessionProvider + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            if let Some(token) = bearer_token(&req) {
                let api = req
                    .app_data::<web::Data<SessionApi<D>>>()
                    .cloned()
                    .ok_or_else(|| ServerError::InitializeError("The session API is not configured".into()))?;
                match api.authenticate(&token).await.map_err(ServerError::from)? {
                    Some(session) => {
                        trace!("💻️ Request from {}", session.username);
                        req.extensions_mut().insert(session);
                    },
                    None => return Err(ServerError::Unauthenticated.into()),
                }
            }
            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let value = req.headers().get(AUTH_HEADER)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// The session behind a request, if the caller sent one.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<Session>);

impl Caller {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Caller(req.extensions().get::<Session>().cloned())))
    }
}
