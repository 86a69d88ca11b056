//! Opaque key generation for records and messages.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Draws a random alphanumeric key of the given length, in the style of
/// store push keys. Uniqueness is probabilistic; key space is large
/// enough that collisions are not handled.
pub(crate) fn push_key(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_key_length_and_charset() {
        let key = push_key(20);
        assert_eq!(key.len(), 20);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_push_keys_differ() {
        assert_ne!(push_key(20), push_key(20));
    }
}
