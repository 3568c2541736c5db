//! Tower wiring for [`EdgePolicy`].
//!
//! Must wrap the whole axum `Router`, not be added with `Router::layer`:
//! layers added there run after routing, so the resume rewrite would never
//! reach the router.

use axum::extract::Request;
use axum::response::Response;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::edge::EdgePolicy;

#[derive(Clone)]
pub struct EdgeLayer {
    policy: Arc<EdgePolicy>,
}

impl EdgeLayer {
    pub fn new(policy: EdgePolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for EdgeLayer {
    type Service = EdgeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EdgeService {
            inner,
            policy: self.policy.clone(),
        }
    }
}

#[derive(Clone)]
pub struct EdgeService<S> {
    inner: S,
    policy: Arc<EdgePolicy>,
}

impl<S, B> Service<Request> for EdgeService<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let ctx = self.policy.prepare(&mut req);
        let policy = self.policy.clone();
        let future = self.inner.call(req);

        Box::pin(async move {
            let response = future.await?;
            Ok(policy.finalize(&ctx, response))
        })
    }
}
