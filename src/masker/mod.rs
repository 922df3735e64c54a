//! Masking capability: the seam between the pipeline and the rule engine
//!
//! The pipeline only knows the `Masker` trait. `FieldMasker` is the bundled
//! implementation: it reads field paths and options from a `MaskingRules`
//! value and rewrites matching string leaves with the strategies in
//! [`strategy`].

use crate::error::{MaskError, Result};
use crate::rules::{
    MaskingRules, CARD_FIELDS, EMAIL_FIELDS, JWT_FIELDS, PASSWORD_FIELDS, PHONE_FIELDS,
    STRING_FIELDS, UUID_FIELDS,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod strategy;

use strategy::{
    DigitMaskOptions, EmailMaskOptions, JwtMaskOptions, PasswordMaskOptions, StringMaskOptions,
    UuidMaskOptions,
};

/// Core trait for masking backends
///
/// Implementations must not mutate `value`; they return a new, masked value.
/// Any error makes the pipeline fall back to the original body.
pub trait Masker: Send + Sync {
    /// Produce a masked copy of `value` according to `rules`
    fn mask(&self, value: &Value, rules: &MaskingRules) -> Result<Value>;

    /// Masker name (e.g., "field", "custom")
    fn name(&self) -> &str;
}

impl<F> Masker for F
where
    F: Fn(&Value, &MaskingRules) -> Result<Value> + Send + Sync,
{
    fn mask(&self, value: &Value, rules: &MaskingRules) -> Result<Value> {
        self(value, rules)
    }

    fn name(&self) -> &str {
        "custom"
    }
}

/// Field category understood by `FieldMasker`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Email,
    Password,
    Phone,
    Card,
    Uuid,
    Jwt,
    String,
}

#[derive(Debug, Default)]
struct Options {
    email: EmailMaskOptions,
    password: PasswordMaskOptions,
    phone: DigitMaskOptions,
    card: DigitMaskOptions,
    uuid: UuidMaskOptions,
    jwt: JwtMaskOptions,
    string: StringMaskOptions,
}

/// A rule set resolved into concrete targets
#[derive(Debug, Default)]
struct Plan {
    targets: Vec<(Category, String)>,
    options: Options,
}

impl Plan {
    fn compile(rules: &MaskingRules) -> Result<Self> {
        let mut plan = Plan::default();

        for (key, value) in rules.iter() {
            let category = match key {
                EMAIL_FIELDS => Category::Email,
                PASSWORD_FIELDS => Category::Password,
                PHONE_FIELDS => Category::Phone,
                CARD_FIELDS => Category::Card,
                UUID_FIELDS => Category::Uuid,
                JWT_FIELDS => Category::Jwt,
                STRING_FIELDS => Category::String,
                "emailMaskOptions" => {
                    plan.options.email = options(key, value)?;
                    continue;
                }
                "passwordMaskOptions" => {
                    plan.options.password = options(key, value)?;
                    continue;
                }
                "phoneMaskOptions" => {
                    plan.options.phone = options(key, value)?;
                    continue;
                }
                "cardMaskOptions" => {
                    plan.options.card = options(key, value)?;
                    continue;
                }
                "uuidMaskOptions" => {
                    plan.options.uuid = options(key, value)?;
                    continue;
                }
                "jwtMaskOptions" => {
                    plan.options.jwt = options(key, value)?;
                    continue;
                }
                "stringMaskOptions" => {
                    plan.options.string = options(key, value)?;
                    continue;
                }
                other => return Err(MaskError::UnsupportedCategory(other.to_string())),
            };

            for path in field_list(key, value)? {
                plan.targets.push((category, path));
            }
        }

        Ok(plan)
    }

    fn mask_str(&self, category: Category, value: &str) -> String {
        let opts = &self.options;
        match category {
            Category::Email => strategy::mask_email(value, &opts.email),
            Category::Password => strategy::mask_password(value, &opts.password),
            Category::Phone => strategy::mask_digits(value, &opts.phone),
            Category::Card => strategy::mask_digits(value, &opts.card),
            Category::Uuid => strategy::mask_uuid(value, &opts.uuid),
            Category::Jwt => strategy::mask_jwt(value, &opts.jwt),
            Category::String => strategy::mask_string(value, &opts.string),
        }
    }
}

fn field_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let invalid = || MaskError::InvalidRule {
        key: key.to_string(),
        reason: "expected an array of field paths".to_string(),
    };

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn options<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| MaskError::InvalidRule {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Walk `path` from `node` and rewrite every string leaf it reaches.
///
/// `*` fans out over all object values or array elements; numeric segments
/// index arrays. Paths that do not resolve are ignored.
fn apply_path(node: &mut Value, path: &[&str], mask: &dyn Fn(&str) -> String) {
    let Some((head, rest)) = path.split_first() else {
        if let Value::String(s) = node {
            *s = mask(s);
        }
        return;
    };

    match node {
        Value::Object(map) => {
            if *head == "*" {
                for child in map.values_mut() {
                    apply_path(child, rest, mask);
                }
            } else if let Some(child) = map.get_mut(*head) {
                apply_path(child, rest, mask);
            }
        }
        Value::Array(items) => {
            if *head == "*" {
                for item in items.iter_mut() {
                    apply_path(item, rest, mask);
                }
            } else if let Some(item) = head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                apply_path(item, rest, mask);
            }
        }
        _ => {}
    }
}

/// Default masker driven by `*Fields` / `*MaskOptions` rule entries
///
/// Recognized categories: `emailFields`, `passwordFields`, `phoneFields`,
/// `cardFields`, `uuidFields`, `jwtFields`, `stringFields`. Any other key is
/// an [`MaskError::UnsupportedCategory`]. Only string leaves are masked.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMasker;

impl FieldMasker {
    pub fn new() -> Self {
        Self
    }
}

impl Masker for FieldMasker {
    fn mask(&self, value: &Value, rules: &MaskingRules) -> Result<Value> {
        let plan = Plan::compile(rules)?;
        let mut masked = value.clone();

        for (category, path) in &plan.targets {
            let segments: Vec<&str> = path.split('.').collect();
            let category = *category;
            apply_path(&mut masked, &segments, &|s: &str| plan.mask_str(category, s));
        }

        Ok(masked)
    }

    fn name(&self) -> &str {
        "field"
    }
}
