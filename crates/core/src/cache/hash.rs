//! Cache key and submission id generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request identity (method + URL).
///
/// The method is uppercased so `get` and `GET` share an entry.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive an identifier for a captured form submission.
pub fn compute_submission_id(method: &str, url: &str, body: &[u8], captured_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(body);
    hasher.update(b"\n");
    hasher.update(captured_at.as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(32);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/about");
        let hash2 = compute_cache_key("GET", "https://example.com/about");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_cache_key("get", "https://example.com/"),
            compute_cache_key("GET", "https://example.com/")
        );
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://example.com/contact");
        let post = compute_cache_key("POST", "https://example.com/contact");
        assert_ne!(get, post);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://example.com");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_submission_id_depends_on_capture_time() {
        let a = compute_submission_id("POST", "https://example.com/api/contact", b"name=a", "2026-01-01T00:00:00Z");
        let b = compute_submission_id("POST", "https://example.com/api/contact", b"name=a", "2026-01-01T00:00:01Z");
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
