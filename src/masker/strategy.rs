//! Character substitution strategies per field category
//!
//! Option structs deserialize from the camelCase `*MaskOptions` entries of a
//! rule set. Unknown option names are rejected so typos surface as rule
//! errors instead of silently weaker masking.

use serde::{Deserialize, Serialize};

const DEFAULT_MASK: char = '*';

/// Options for `emailFields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EmailMaskOptions {
    pub mask_with: char,
    /// Characters revealed at the start of the local part
    pub unmasked_start_characters_before_at: usize,
    /// Characters revealed at the end of the domain
    pub unmasked_end_characters_after_at: usize,
    pub mask_at_the_rate: bool,
}

impl Default for EmailMaskOptions {
    fn default() -> Self {
        Self {
            mask_with: DEFAULT_MASK,
            unmasked_start_characters_before_at: 3,
            unmasked_end_characters_after_at: 2,
            mask_at_the_rate: false,
        }
    }
}

/// Options for `passwordFields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PasswordMaskOptions {
    pub mask_with: char,
    /// Output length cap; hides the real password length
    pub max_masked_characters: usize,
    pub unmasked_start_characters: usize,
    pub unmasked_end_characters: usize,
}

impl Default for PasswordMaskOptions {
    fn default() -> Self {
        Self {
            mask_with: DEFAULT_MASK,
            max_masked_characters: 16,
            unmasked_start_characters: 0,
            unmasked_end_characters: 0,
        }
    }
}

/// Options for `phoneFields` and `cardFields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DigitMaskOptions {
    pub mask_with: char,
    pub unmasked_start_digits: usize,
    pub unmasked_end_digits: usize,
}

impl Default for DigitMaskOptions {
    fn default() -> Self {
        Self {
            mask_with: DEFAULT_MASK,
            unmasked_start_digits: 4,
            unmasked_end_digits: 1,
        }
    }
}

/// Options for `uuidFields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct UuidMaskOptions {
    pub mask_with: char,
    pub unmasked_start_characters: usize,
    pub unmasked_end_characters: usize,
}

impl Default for UuidMaskOptions {
    fn default() -> Self {
        Self {
            mask_with: DEFAULT_MASK,
            unmasked_start_characters: 0,
            unmasked_end_characters: 0,
        }
    }
}

/// Options for `jwtFields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct JwtMaskOptions {
    pub mask_with: char,
    pub max_masked_characters: usize,
    pub mask_dot: bool,
    pub mask_header: bool,
    pub mask_payload: bool,
    pub mask_signature: bool,
}

impl Default for JwtMaskOptions {
    fn default() -> Self {
        Self {
            mask_with: DEFAULT_MASK,
            max_masked_characters: 512,
            mask_dot: true,
            mask_header: true,
            mask_payload: true,
            mask_signature: true,
        }
    }
}

/// Options for `stringFields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StringMaskOptions {
    pub mask_with: char,
    pub mask_space: bool,
    pub unmasked_start_characters: usize,
    pub unmasked_end_characters: usize,
}

impl Default for StringMaskOptions {
    fn default() -> Self {
        Self {
            mask_with: DEFAULT_MASK,
            mask_space: true,
            unmasked_start_characters: 0,
            unmasked_end_characters: 0,
        }
    }
}

/// Reveal `start` leading and `end` trailing maskable characters, mask the rest.
///
/// Characters for which `preserve` returns true are copied through and do
/// not count toward `start`/`end`. When the revealed spans would cover every
/// maskable character, everything maskable is masked. A non-empty value
/// never comes back unchanged: if nothing was maskable, every character is
/// masked.
fn mask_between(
    value: &str,
    start: usize,
    end: usize,
    mask: char,
    preserve: impl Fn(char) -> bool,
) -> String {
    let total = value.chars().filter(|c| !preserve(*c)).count();
    let reveal = start.saturating_add(end) < total;
    let mut seen = 0;

    let masked: String = value
        .chars()
        .map(|c| {
            if preserve(c) {
                return c;
            }
            seen += 1;
            if reveal && (seen <= start || seen > total - end) {
                c
            } else {
                mask
            }
        })
        .collect();
    never_verbatim(value, masked, mask)
}

fn repeat(mask: char, count: usize) -> String {
    std::iter::repeat(mask).take(count).collect()
}

/// Replace an output identical to its non-empty input with a full mask
fn never_verbatim(value: &str, masked: String, mask: char) -> String {
    if !value.is_empty() && masked == value {
        repeat(mask, value.chars().count())
    } else {
        masked
    }
}

/// `user@example.com` → `use*@*********om` with default options
pub fn mask_email(value: &str, opts: &EmailMaskOptions) -> String {
    let mask = opts.mask_with;
    match value.split_once('@') {
        Some((local, domain)) => {
            let mut out = mask_between(
                local,
                opts.unmasked_start_characters_before_at,
                0,
                mask,
                |_| false,
            );
            out.push(if opts.mask_at_the_rate { mask } else { '@' });
            out.push_str(&mask_between(
                domain,
                0,
                opts.unmasked_end_characters_after_at,
                mask,
                |_| false,
            ));
            never_verbatim(value, out, mask)
        }
        None => mask_between(
            value,
            opts.unmasked_start_characters_before_at,
            0,
            mask,
            |_| false,
        ),
    }
}

pub fn mask_password(value: &str, opts: &PasswordMaskOptions) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len().min(opts.max_masked_characters.max(1));
    if chars.is_empty() {
        return String::new();
    }

    let start = opts.unmasked_start_characters;
    let end = opts.unmasked_end_characters;
    if start.saturating_add(end) >= len {
        return repeat(opts.mask_with, len);
    }

    let mut out: String = chars[..start].iter().collect();
    out.push_str(&repeat(opts.mask_with, len - start - end));
    out.extend(&chars[chars.len() - end..]);
    out
}

/// Masks digits only; separators such as `-`, `+` and spaces are kept.
pub fn mask_digits(value: &str, opts: &DigitMaskOptions) -> String {
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return mask_between(value, 0, 0, opts.mask_with, |_| false);
    }
    mask_between(
        value,
        opts.unmasked_start_digits,
        opts.unmasked_end_digits,
        opts.mask_with,
        |c| !c.is_ascii_digit(),
    )
}

pub fn mask_uuid(value: &str, opts: &UuidMaskOptions) -> String {
    mask_between(
        value,
        opts.unmasked_start_characters,
        opts.unmasked_end_characters,
        opts.mask_with,
        |c| c == '-',
    )
}

pub fn mask_jwt(value: &str, opts: &JwtMaskOptions) -> String {
    let mask = opts.mask_with;
    let max = opts.max_masked_characters.max(1);
    let parts: Vec<&str> = value.split('.').collect();

    let masked = if parts.len() == 3 {
        let flags = [opts.mask_header, opts.mask_payload, opts.mask_signature];
        let mut out = String::with_capacity(value.len());
        for (i, (part, masked)) in parts.iter().zip(flags).enumerate() {
            if i > 0 {
                out.push(if opts.mask_dot { mask } else { '.' });
            }
            if masked {
                out.push_str(&repeat(mask, part.chars().count()));
            } else {
                out.push_str(part);
            }
        }
        out
    } else {
        // Not a compact JWS; treat the whole thing as secret
        repeat(mask, value.chars().count())
    };

    masked.chars().take(max).collect()
}

pub fn mask_string(value: &str, opts: &StringMaskOptions) -> String {
    let mask_space = opts.mask_space;
    mask_between(
        value,
        opts.unmasked_start_characters,
        opts.unmasked_end_characters,
        opts.mask_with,
        |c| !mask_space && c.is_whitespace(),
    )
}
