//! HTTP integration for axum / tower
//!
//! `MaskingLayer` installs the pipeline around every response produced by
//! the wrapped service. The downstream service is called exactly once; its
//! response body is buffered, run through a fresh `MaskedSend`, and the
//! response is rebuilt from the original head (status and headers kept).
//!
//! Bodies with no upper size bound (streams, SSE) or above the configured
//! limit are forwarded untouched without buffering.

use crate::body::Payload;
use crate::pipeline::MaskingPipeline;
use axum::body::{to_bytes, Body, Bytes, HttpBody};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum::BoxError;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer applying response masking
#[derive(Debug, Clone)]
pub struct MaskingLayer {
    pipeline: Arc<MaskingPipeline>,
}

impl MaskingLayer {
    pub fn new(pipeline: Arc<MaskingPipeline>) -> Self {
        Self { pipeline }
    }
}

impl<S> Layer<S> for MaskingLayer {
    type Service = MaskingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MaskingService {
            inner,
            pipeline: self.pipeline.clone(),
        }
    }
}

/// Service produced by [`MaskingLayer`]
#[derive(Debug, Clone)]
pub struct MaskingService<S> {
    inner: S,
    pipeline: Arc<MaskingPipeline>,
}

impl<S, ReqBody, ResBody> Service<axum::http::Request<ReqBody>> for MaskingService<S>
where
    S: Service<axum::http::Request<ReqBody>, Response = axum::http::Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: axum::http::Request<ReqBody>) -> Self::Future {
        // Use the instance that was polled ready; leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let pipeline = self.pipeline.clone();

        Box::pin(async move {
            let response = inner.call(request).await?;
            Ok(intercept(&pipeline, response).await)
        })
    }
}

/// Middleware function for `axum::middleware::from_fn_with_state`
pub async fn mask_response(
    State(pipeline): State<Arc<MaskingPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    intercept(&pipeline, response).await
}

/// Run a finished response through the pipeline
pub async fn intercept<B>(pipeline: &MaskingPipeline, response: axum::http::Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (mut parts, body) = response.into_parts();
    let limit = pipeline.body_limit();

    match body.size_hint().upper() {
        Some(upper) if upper <= limit as u64 => {}
        upper => {
            tracing::debug!(
                limit,
                upper = ?upper,
                "Response body unbounded or over limit, skipping masking"
            );
            return Response::from_parts(parts, Body::new(body));
        }
    }

    let bytes = match to_bytes(Body::new(body), limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read response body");
            // Surface the read error to the client instead of a truncated 2xx
            parts.headers.remove(header::CONTENT_LENGTH);
            let failed = futures::stream::once(async move { Err::<Bytes, _>(e) });
            return Response::from_parts(parts, Body::from_stream(failed));
        }
    };
    let original_len = bytes.len();

    pipeline
        .install(move |payload: Payload| {
            let bytes = payload.into_bytes();
            // Only a masked body changes length; HEAD/304 heads stay as sent
            if bytes.len() != original_len {
                parts
                    .headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            }
            Response::from_parts(parts, Body::from(bytes))
        })
        .send(Payload::from_bytes(bytes))
}
