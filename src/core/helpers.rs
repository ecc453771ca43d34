use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use regex::Regex;

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::PasswordHash;

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Strips every HTML tag, leaving plain text.
pub fn sanitize_text(text: &str) -> String {
    Builder::default()
        .tags(HashSet::new())
        .clean(text)
        .to_string()
}

/// Keeps ammonia's default whitelist of formatting tags.
pub fn sanitize_html(text: &str) -> String {
    Builder::default()
        .link_rel(Some("noopener noreferrer"))
        .clean(text)
        .to_string()
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile")
    })
}

pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_sanitize_text_strips_tags() {
        assert_eq!(sanitize_text("<b>alice</b>"), "alice");
        assert_eq!(sanitize_text("<script>alert(1)</script>bob"), "bob");
    }

    #[test]
    fn test_sanitize_html_keeps_formatting() {
        let clean = sanitize_html(r#"<em>hi</em><img src=x onerror="alert(1)">"#);
        assert!(clean.contains("<em>hi</em>"));
        assert!(!clean.contains("onerror"));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com"));
        assert!(!validate_email("alice"));
        assert!(!validate_email("alice@localhost"));
        assert!(!validate_email("a b@example.com"));
    }
}
