use sha2::{Digest, Sha256};

/// Derives the stable identifier a chunk is stored under: a SHA-256 over
/// the source name and the chunk text.
///
/// The source name is length-prefixed before hashing so that shifting
/// characters between the two fields can never produce the same digest.
/// Identical (source, text) pairs always map to the same fingerprint,
/// which is what makes re-ingestion an overwrite instead of a duplicate.
pub fn chunk_fingerprint(source: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((source.len() as u64).to_be_bytes());
    hasher.update(source.as_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identical_inputs_produce_identical_fingerprints() {
        assert_eq!(
            chunk_fingerprint("report.pdf", "chapter one"),
            chunk_fingerprint("report.pdf", "chapter one")
        );
    }

    #[test]
    fn fingerprints_are_lowercase_hex_of_fixed_length() {
        let fingerprint = chunk_fingerprint("report.pdf", "chapter one");
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn different_sources_or_texts_produce_different_fingerprints() {
        let base = chunk_fingerprint("report.pdf", "chapter one");
        assert_ne!(base, chunk_fingerprint("other.pdf", "chapter one"));
        assert_ne!(base, chunk_fingerprint("report.pdf", "chapter two"));
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        assert_ne!(
            chunk_fingerprint("ab", "c"),
            chunk_fingerprint("a", "bc")
        );
    }

    #[test]
    fn no_collisions_over_a_large_sample() {
        let mut seen = HashSet::new();
        for source in 0..100 {
            for chunk in 0..100 {
                let fingerprint =
                    chunk_fingerprint(&format!("doc-{source}.pdf"), &format!("chunk {chunk}"));
                assert!(seen.insert(fingerprint), "unexpected fingerprint collision");
            }
        }
    }
}
