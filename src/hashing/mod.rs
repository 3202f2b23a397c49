use blake3::Hasher;

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Order-insensitive fingerprint of a skill list.
///
/// Skills are trimmed, blanks dropped, then sorted before hashing, so `["SQL", "Python"]`
/// and `["Python", " SQL"]` fingerprint identically. Case is preserved.
pub fn skills_fingerprint<S: AsRef<str>>(skills: &[S]) -> u64 {
    let mut sorted: Vec<&str> = skills
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect();
    sorted.sort_unstable();

    let mut hasher = Hasher::new();
    for (i, skill) in sorted.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(skill.as_bytes());
    }

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Maps a token to a (bucket, sign) pair for feature hashing.
#[inline]
pub fn hash_token(token: &str, buckets: usize) -> (usize, f32) {
    let h = hash_to_u64(token.as_bytes());
    let bucket = (h % buckets.max(1) as u64) as usize;
    let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
    (bucket, sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_to_u64_determinism() {
        assert_eq!(hash_to_u64(b"python"), hash_to_u64(b"python"));
        assert_ne!(hash_to_u64(b"python"), hash_to_u64(b"Python"));
    }

    #[test]
    fn test_fingerprint_order_insensitive() {
        let a = skills_fingerprint(&["Python", "SQL", "Excel"]);
        let b = skills_fingerprint(&["Excel", "Python", "SQL"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_blank_and_padding() {
        let a = skills_fingerprint(&["Python", "SQL"]);
        let b = skills_fingerprint(&[" Python ", "", "SQL", "   "]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_detects_change() {
        let before = skills_fingerprint(&["Python", "SQL"]);
        let after = skills_fingerprint(&["Python", "SQL", "Excel"]);
        assert_ne!(before, after);
    }

    #[test]
    fn test_fingerprint_separator_prevents_concat_collisions() {
        let a = skills_fingerprint(&["ab", "c"]);
        let b = skills_fingerprint(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_of_empty_list_is_stable() {
        let empty: [&str; 0] = [];
        assert_eq!(skills_fingerprint(&empty), skills_fingerprint(&[" "]));
    }

    #[test]
    fn test_hash_token_in_range() {
        for token in ["python", "sql", "excel", "project management"] {
            let (bucket, sign) = hash_token(token, 512);
            assert!(bucket < 512);
            assert!(sign == 1.0 || sign == -1.0);
        }
    }

    #[test]
    fn test_hash_token_zero_buckets_does_not_panic() {
        let (bucket, _) = hash_token("python", 0);
        assert_eq!(bucket, 0);
    }
}
