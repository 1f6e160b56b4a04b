//! File id generation and validation.
//!
//! Ids are drawn from `[A-Za-z0-9]`. Anything the generator produces, and
//! anything accepted by [`validate_id`], is usable directly as a single file
//! name component: no separators, no dots, no traversal.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::constants::{MAX_ID_LENGTH, MIN_ID_LENGTH};
use crate::error::{ValidationError, ValidationResult};

/// Produces candidate file ids.
///
/// Collision detection is the caller's job; a generator only promises ids in
/// the safe charset.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, length: usize) -> ValidationResult<String>;
}

/// Production generator backed by a 128-bit random draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self, length: usize) -> ValidationResult<String> {
        if length < MIN_ID_LENGTH {
            return Err(ValidationError::InvalidLength {
                length,
                min: MIN_ID_LENGTH,
            });
        }

        let raw: u128 = rand::random();
        let encoded = escape(&URL_SAFE_NO_PAD.encode(raw.to_le_bytes()));
        if encoded.len() <= length {
            return Ok(encoded);
        }
        Ok(encoded[..length].to_string())
    }
}

/// Maps the URL-safe base64 alphabet onto `[A-Za-z0-9]`.
///
/// `9` is the escape character, so `9 -> 99`, `- -> 90`, `_ -> 91`.
fn escape(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 4);
    for c in encoded.chars() {
        match c {
            '9' => out.push_str("99"),
            '-' => out.push_str("90"),
            '_' => out.push_str("91"),
            c => out.push(c),
        }
    }
    out
}

/// Whether `id` consists only of safe characters and has an acceptable length.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Validate an id before any path is built from it.
pub fn validate_id(id: &str) -> ValidationResult<()> {
    if is_safe_id(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_string()))
    }
}

/// Turn a client-supplied path segment into a file id.
///
/// Links are often shared with an extension appended (`N2YwODUx.mp4`); one
/// trailing extension is dropped before validation.
pub fn resolve_request_id(segment: &str) -> ValidationResult<&str> {
    let id = match segment.split_once('.') {
        Some((stem, ext)) if !ext.contains('.') => stem,
        _ => segment,
    };
    validate_id(id)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_respects_length() {
        let generator = RandomIdGenerator;
        for length in [2, 5, 8, 16] {
            let id = generator.generate(length).unwrap();
            assert_eq!(id.len(), length);
        }
    }

    #[test]
    fn test_generate_short_encoding_is_not_padded() {
        let generator = RandomIdGenerator;
        for _ in 0..100 {
            let id = generator.generate(MAX_ID_LENGTH).unwrap();
            assert!(id.len() <= MAX_ID_LENGTH);
            assert!(!id.contains('='));

            // The whole escaped encoding comes back: undoing the escape
            // yields 22 base64 chars that decode to the 16-byte draw.
            let encoded = unescape(&id);
            assert_eq!(encoded.len(), 22, "truncated or padded id {}", id);
            assert_eq!(URL_SAFE_NO_PAD.decode(&encoded).unwrap().len(), 16);
            assert_eq!(escape(&encoded), id);
        }
    }

    fn unescape(id: &str) -> String {
        let mut out = String::new();
        let mut chars = id.chars();
        while let Some(c) = chars.next() {
            if c != '9' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('9') => out.push('9'),
                Some('0') => out.push('-'),
                Some('1') => out.push('_'),
                other => panic!("bad escape 9{:?} in {}", other, id),
            }
        }
        out
    }

    #[test]
    fn test_generate_rejects_short_length() {
        let generator = RandomIdGenerator;
        assert_eq!(
            generator.generate(1),
            Err(ValidationError::InvalidLength { length: 1, min: 2 })
        );
        assert!(generator.generate(0).is_err());
    }

    #[test]
    fn test_generated_ids_are_safe() {
        let generator = RandomIdGenerator;
        for _ in 0..1000 {
            let id = generator.generate(32).unwrap();
            assert!(is_safe_id(&id), "unsafe id generated: {}", id);
            assert!(!id.contains('/'));
            assert!(!id.contains(".."));
        }
    }

    #[test]
    fn test_generated_ids_differ() {
        let generator = RandomIdGenerator;
        let a = generator.generate(16).unwrap();
        let b = generator.generate(16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a9b-c_d"), "a99b90c91d");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("N2YwODUx").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("a\\b").is_err());
        assert!(validate_id("file.txt").is_err());
        assert!(validate_id("ünïcode").is_err());
        assert!(validate_id(&"a".repeat(MAX_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_resolve_request_id() {
        assert_eq!(resolve_request_id("N2YwODUx").unwrap(), "N2YwODUx");
        assert_eq!(resolve_request_id("N2YwODUx.mp4").unwrap(), "N2YwODUx");
        assert!(resolve_request_id("N2YwODUx.tar.gz").is_err());
        assert!(resolve_request_id("..").is_err());
        assert!(resolve_request_id(".hidden").is_err());
    }
}
