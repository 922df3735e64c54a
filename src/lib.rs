//! # a3s-mask
//!
//! Fail-safe masking of sensitive fields in outbound HTTP responses.
//!
//! ## Overview
//!
//! `a3s-mask` sits on the exit path of a response. When the body is a JSON
//! object (or text shaped like one), the configured fields are masked before
//! the body is sent. Anything else (plain text, arrays, binary, malformed
//! JSON, or a masking failure) is sent exactly as the handler produced it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use a3s_mask::{MaskingPipeline, MaskingRules};
//! use axum::{routing::get, Json, Router};
//!
//! let rules = MaskingRules::new()
//!     .with_fields("emailFields", ["email"])
//!     .with_fields("passwordFields", ["password"]);
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/user",
//!         get(|| async {
//!             Json(serde_json::json!({
//!                 "email": "user@example.com",
//!                 "password": "supersecretpassword",
//!                 "username": "testuser"
//!             }))
//!         }),
//!     )
//!     .layer(MaskingPipeline::new(rules).layer());
//! // GET /user → {"email":"use*@*********om","password":"****************","username":"testuser"}
//! ```
//!
//! ## Architecture
//!
//! - **MaskingPipeline**: rule set + masker, shared across requests
//! - **MaskedSend**: per-response decorator around the transmission primitive
//! - **Masker** trait: pluggable masking capability (`FieldMasker` bundled)
//! - **MaskingLayer**: tower layer wiring the pipeline into axum

pub mod body;
pub mod config;
pub mod error;
pub mod masker;
pub mod middleware;
pub mod pipeline;
pub mod rules;

// Re-export core types
pub use body::{Classification, Payload};
pub use config::MaskingConfig;
pub use error::{MaskError, Result};
pub use masker::{FieldMasker, Masker};
pub use middleware::{intercept, mask_response, MaskingLayer, MaskingService};
pub use pipeline::{Disposition, MaskedSend, MaskingPipeline};
pub use rules::MaskingRules;
