use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use log::{error, info, warn};

/// Logs one line per request and one per response, with status and latency.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service: Rc::new(service) }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + 'static>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client_ip = req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_owned)
            .unwrap_or_else(|| "unknown".to_string());

        info!("--> {} {} from {}", method, path, client_ip);

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let start = Instant::now();
            let res = service.call(req).await?;
            let elapsed = start.elapsed();
            let status = res.status();

            if status.is_server_error() {
                error!("<-- {} {} {} in {:.2?}", status.as_u16(), method, path, elapsed);
            } else if status.is_client_error() {
                warn!("<-- {} {} {} in {:.2?}", status.as_u16(), method, path, elapsed);
            } else {
                info!("<-- {} {} {} in {:.2?}", status.as_u16(), method, path, elapsed);
            }

            Ok(res)
        })
    }
}
