use sha1::{Digest, Sha1};

/// Lowercase hex SHA-1 of `bytes`, the canonical artifact name.
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

pub fn is_sha1_hex(candidate: &str) -> bool {
    candidate.len() == 40
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_known_vector() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert!(is_sha1_hex(&sha1_hex(b"")));
    }

    #[test]
    fn rejects_non_canonical_names() {
        assert!(!is_sha1_hex("../etc/passwd"));
        assert!(!is_sha1_hex("A9993E364706816ABA3E25717850C26C9CD0D89D"));
        assert!(!is_sha1_hex("a9993e"));
    }
}
