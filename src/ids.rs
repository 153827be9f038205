//! Prefixed random identifiers

use rand::Rng;

/// URL-safe alphabet, 64 symbols
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Prefix and token length used for blog ids
pub const BLOG_ID_PREFIX: &str = "blog";
pub const BLOG_ID_LENGTH: usize = 12;

/// Generate `<label>_<token>` where the token is `length` random URL-safe characters.
///
/// Uniqueness is probabilistic; the store's primary key is the real guard.
pub fn generate_id(label: &str, length: usize) -> String {
    let mut rng = rand::thread_rng();
    let token: String = (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", label, token)
}

pub fn generate_blog_id() -> String {
    generate_id(BLOG_ID_PREFIX, BLOG_ID_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_blog_id_shape() {
        for _ in 0..100 {
            let id = generate_blog_id();
            let token = id.strip_prefix("blog_").unwrap();
            assert_eq!(token.len(), 12);
            assert!(token.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_successive_ids_differ() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_blog_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_custom_label_and_length() {
        let id = generate_id("cat", 5);
        assert!(id.starts_with("cat_"));
        assert_eq!(id.len(), 9);
    }
}
