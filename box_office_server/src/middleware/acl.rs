//! Access control list middleware for the box office server.
//! This middleware can be placed on any route or service.
//!
//! It expects the session middleware to have resolved the caller's session into the request extensions. A request
//! without a session is refused with 401 Unauthorized. A session holding none of the privileges listed for the route
//! gets 403 Forbidden.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use box_office_engine::db_types::{Privilege, Session};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::errors::ServerError;

pub struct AclMiddlewareFactory {
    allowed: Vec<Privilege>,
}

impl AclMiddlewareFactory {
    /// The caller needs at least one of `allowed`.
    pub fn new(allowed: &[Privilege]) -> Self {
        AclMiddlewareFactory { allowed: allowed.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { allowed: self.allowed.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    allowed: Vec<Privilege>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed = self.allowed.clone();
        Box::pin(async move {
            let privileges = req.extensions().get::<Session>().map(|s| s.privileges);
            match privileges {
                None => {
                    debug!("💻️ {} {} needs a session, but none was given", req.method(), req.path());
                    Err(ServerError::Unauthenticated.into())
                },
                Some(p) if p.any(&allowed) => service.call(req).await,
                Some(_) => {
                    debug!("💻️ {} {} refused. Requires one of {allowed:?}", req.method(), req.path());
                    Err(ServerError::Forbidden.into())
                },
            }
        })
    }
}
