//! Interception pipeline
//!
//! `MaskingPipeline` is built once per rule set and shared across requests.
//! For each response it installs a `MaskedSend`, a decorator that owns the
//! original transmission primitive and exposes the same call contract.
//!
//! `MaskedSend::send` always ends in exactly one call to that primitive,
//! with either the masked, re-serialized body or the original body. Every
//! failure on the way (parse, mask, serialize, or a panic in any of them)
//! is logged and short-circuits to the original body.

use crate::body::{Classification, Payload};
use crate::config::MaskingConfig;
use crate::error::{MaskError, Result};
use crate::masker::{FieldMasker, Masker};
use crate::middleware::MaskingLayer;
use crate::rules::MaskingRules;
use serde_json::Value;
use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// What to transmit for a given body
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Send the original body untouched
    Passthrough,
    /// Send this masked JSON text instead
    Masked(String),
}

/// Fail-safe response masking pipeline
pub struct MaskingPipeline {
    rules: MaskingRules,
    masker: Box<dyn Masker>,
    max_body_bytes: usize,
}

impl std::fmt::Debug for MaskingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskingPipeline")
            .field("rules", &self.rules)
            .field("masker", &self.masker.name())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl MaskingPipeline {
    /// Create a pipeline using the bundled `FieldMasker`
    pub fn new(rules: MaskingRules) -> Self {
        Self::with_masker(rules, FieldMasker)
    }

    /// Create a pipeline with a custom masking capability
    pub fn with_masker(rules: MaskingRules, masker: impl Masker + 'static) -> Self {
        Self {
            rules,
            masker: Box::new(masker),
            max_body_bytes: MaskingConfig::default().max_body_bytes,
        }
    }

    /// Create a pipeline from loaded configuration
    pub fn from_config(config: MaskingConfig) -> Self {
        Self::new(config.rules).max_body_bytes(config.max_body_bytes)
    }

    /// Largest response body the HTTP layer will buffer for masking
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn body_limit(&self) -> usize {
        self.max_body_bytes
    }

    pub fn rules(&self) -> &MaskingRules {
        &self.rules
    }

    pub fn masker_name(&self) -> &str {
        self.masker.name()
    }

    /// Wrap into a tower layer for an axum `Router`
    pub fn layer(self) -> MaskingLayer {
        MaskingLayer::new(Arc::new(self))
    }

    /// Install interception around a transmission primitive.
    ///
    /// The returned wrapper is request-scoped and consumed by `send`.
    pub fn install<F, R>(&self, transmit: F) -> MaskedSend<'_, F>
    where
        F: FnOnce(Payload) -> R,
    {
        MaskedSend {
            pipeline: self,
            transmit,
        }
    }

    /// Decide what should be transmitted for `body`, without transmitting.
    ///
    /// Opaque bodies are `Passthrough`; everything else is parsed, masked and
    /// serialized, and the first failing stage is returned as an error.
    pub fn prepare(&self, body: &Payload) -> Result<Disposition> {
        let value: Cow<'_, Value> = match (body.classify(), body) {
            (Classification::Structured, Payload::Json(value)) => Cow::Borrowed(value),
            (Classification::Candidate, Payload::Text(text)) => {
                Cow::Owned(serde_json::from_str(text).map_err(MaskError::Parse)?)
            }
            _ => return Ok(Disposition::Passthrough),
        };

        let masked = self.masker.mask(&value, &self.rules)?;
        let text = serde_json::to_string(&masked)?;
        Ok(Disposition::Masked(text))
    }

    /// `prepare` behind the outer guard: panics become `MaskError::Panic`
    fn prepare_guarded(&self, body: &Payload) -> Result<Disposition> {
        panic::catch_unwind(AssertUnwindSafe(|| self.prepare(body)))
            .unwrap_or_else(|payload| Err(MaskError::Panic(panic_message(payload.as_ref()))))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Request-scoped decorator around a transmission primitive
pub struct MaskedSend<'a, F> {
    pipeline: &'a MaskingPipeline,
    transmit: F,
}

impl<F> MaskedSend<'_, F> {
    /// Classify, mask and transmit `body`, returning the primitive's result.
    ///
    /// The primitive runs exactly once, outside the panic guard.
    pub fn send<R>(self, body: Payload) -> R
    where
        F: FnOnce(Payload) -> R,
    {
        let outgoing = match self.pipeline.prepare_guarded(&body) {
            Ok(Disposition::Masked(text)) => Payload::Text(text),
            Ok(Disposition::Passthrough) => body,
            Err(err @ MaskError::Panic(_)) => {
                tracing::error!(
                    stage = err.stage(),
                    masker = self.pipeline.masker_name(),
                    error = %err,
                    "Unexpected error while masking response, sending original body"
                );
                body
            }
            Err(err) => {
                tracing::warn!(
                    stage = err.stage(),
                    masker = self.pipeline.masker_name(),
                    error = %err,
                    "Response masking failed, sending original body"
                );
                body
            }
        };

        (self.transmit)(outgoing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EMAIL_FIELDS, PASSWORD_FIELDS};
    use serde_json::json;
    use std::cell::RefCell;

    fn rules() -> MaskingRules {
        MaskingRules::new()
            .with_fields(EMAIL_FIELDS, ["email"])
            .with_fields(PASSWORD_FIELDS, ["password"])
    }

    fn scenario_body() -> Value {
        json!({
            "email": "user@example.com",
            "password": "supersecretpassword",
            "username": "testuser"
        })
    }

    /// Send `body` and record every call to the primitive
    fn send_recorded(pipeline: &MaskingPipeline, body: Payload) -> Vec<Payload> {
        let calls = RefCell::new(Vec::new());
        pipeline
            .install(|out: Payload| calls.borrow_mut().push(out))
            .send(body);
        calls.into_inner()
    }

    #[test]
    fn test_masks_structured_body() {
        let pipeline = MaskingPipeline::new(rules());
        let calls = send_recorded(&pipeline, Payload::Json(scenario_body()));

        assert_eq!(calls.len(), 1);
        let Payload::Text(text) = &calls[0] else {
            panic!("expected serialized text, got {:?}", calls[0]);
        };
        let sent: Value = serde_json::from_str(text).unwrap();
        assert_eq!(sent["email"], "use*@*********om");
        assert_eq!(sent["password"], "****************");
        assert_eq!(sent["username"], "testuser");
    }

    #[test]
    fn test_masks_json_text() {
        let pipeline = MaskingPipeline::new(rules());
        let calls = send_recorded(&pipeline, Payload::Text(scenario_body().to_string()));

        assert_eq!(calls.len(), 1);
        let Payload::Text(text) = &calls[0] else {
            panic!("expected text");
        };
        let sent: Value = serde_json::from_str(text).unwrap();
        assert_eq!(sent["email"], "use*@*********om");
        assert_eq!(sent["username"], "testuser");
    }

    #[test]
    fn test_key_order_preserved() {
        let pipeline = MaskingPipeline::new(rules());
        let calls = send_recorded(
            &pipeline,
            Payload::from(r#"{"zeta":1,"password":"abc","alpha":2}"#),
        );
        assert_eq!(
            calls,
            vec![Payload::Text(r#"{"zeta":1,"password":"***","alpha":2}"#.into())]
        );
    }

    #[test]
    fn test_returns_primitive_result() {
        let pipeline = MaskingPipeline::new(rules());
        let len = pipeline
            .install(|out: Payload| out.into_bytes().len())
            .send(Payload::from("plain"));
        assert_eq!(len, 5);
    }

    #[test]
    fn test_opaque_passthrough() {
        let pipeline = MaskingPipeline::new(rules());
        for body in [
            Payload::from("This is not a valid JSON object"),
            Payload::from(r#"[{"email":"user@example.com"}]"#),
            Payload::Json(json!(["user@example.com"])),
            Payload::Json(json!(null)),
            Payload::Bytes(bytes::Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef])),
        ] {
            let calls = send_recorded(&pipeline, body.clone());
            assert_eq!(calls, vec![body]);
        }
    }

    #[test]
    fn test_malformed_candidate_sent_unchanged() {
        let pipeline = MaskingPipeline::new(rules());
        let calls = send_recorded(&pipeline, Payload::from("{not json}"));
        assert_eq!(calls, vec![Payload::from("{not json}")]);

        let err = pipeline.prepare(&Payload::from("{not json}")).unwrap_err();
        assert_eq!(err.stage(), "parse");
    }

    #[test]
    fn test_masking_failure_sends_original() {
        let pipeline = MaskingPipeline::new(rules().with_fields("ssnFields", ["ssn"]));
        let body = Payload::Json(scenario_body());
        let calls = send_recorded(&pipeline, body.clone());
        assert_eq!(calls, vec![body]);

        let text = Payload::Text(scenario_body().to_string());
        let calls = send_recorded(&pipeline, text.clone());
        assert_eq!(calls, vec![text]);
    }

    #[test]
    fn test_custom_masker_error_sends_original() {
        let failing = |_: &Value, _: &MaskingRules| -> Result<Value> {
            Err(MaskError::Masking("backend unavailable".into()))
        };
        let pipeline = MaskingPipeline::with_masker(rules(), failing);
        let body = Payload::Json(scenario_body());
        assert_eq!(send_recorded(&pipeline, body.clone()), vec![body]);
    }

    #[test]
    fn test_panicking_masker_sends_original() {
        let exploding = |_: &Value, _: &MaskingRules| -> Result<Value> { panic!("masker bug") };
        let pipeline = MaskingPipeline::with_masker(rules(), exploding);
        let body = Payload::Json(scenario_body());
        assert_eq!(send_recorded(&pipeline, body.clone()), vec![body.clone()]);

        let err = pipeline.prepare_guarded(&body).unwrap_err();
        assert!(matches!(err, MaskError::Panic(ref msg) if msg == "masker bug"));
    }

    #[test]
    fn test_prepare_dispositions() {
        let pipeline = MaskingPipeline::new(rules());
        assert_eq!(
            pipeline.prepare(&Payload::from("hello")).unwrap(),
            Disposition::Passthrough
        );
        assert!(matches!(
            pipeline.prepare(&Payload::from(r#"{"password":"x"}"#)).unwrap(),
            Disposition::Masked(text) if text == r#"{"password":"*"}"#
        ));
    }

    #[test]
    fn test_original_value_not_mutated() {
        let pipeline = MaskingPipeline::new(rules());
        let body = Payload::Json(scenario_body());
        let snapshot = body.clone();
        let _ = pipeline.prepare(&body).unwrap();
        assert_eq!(body, snapshot);
    }

    #[test]
    fn test_shared_across_threads() {
        let pipeline = Arc::new(MaskingPipeline::new(rules()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = pipeline.clone();
                std::thread::spawn(move || {
                    pipeline
                        .install(|out: Payload| out)
                        .send(Payload::Json(json!({"password": "hunter2"})))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                Payload::Text(r#"{"password":"*******"}"#.into())
            );
        }
    }

    #[test]
    fn test_builder_accessors() {
        let pipeline = MaskingPipeline::new(rules()).max_body_bytes(512);
        assert_eq!(pipeline.body_limit(), 512);
        assert_eq!(pipeline.masker_name(), "field");
        assert_eq!(pipeline.rules(), &rules());
    }
}
