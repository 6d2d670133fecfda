//! Normalized edit-distance similarity over lowercased strings.

/// Similarity in `[0, 1]`: `1 - levenshtein(a, b) / max(len(a), len(b))`.
///
/// Case-insensitive and symmetric. Two empty strings score 1.0.
/// Lengths are counted in characters, not bytes.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Weighted sum of field similarities. Weights are expected to sum to 1.
pub fn combined_similarity(pairs: &[(f64, &str, &str)]) -> f64 {
    pairs
        .iter()
        .map(|(weight, a, b)| weight * similarity(a, b))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_empty() {
        assert_eq!(similarity("Smile Dental", "Smile Dental"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(similarity("SMILE dental", "smile DENTAL"), 1.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("kitten", "sitting"),
            ("Smile Dental", "Smiles Dental Care"),
            ("Dr. Asha Rao", "Asha Rao"),
            ("", "x"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_known_distance() {
        // kitten -> sitting is 3 edits over 7 chars
        let s = similarity("kitten", "sitting");
        assert!((s - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // One substitution over four characters, despite multi-byte input.
        let s = similarity("café", "cafe");
        assert!((s - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_combined_weights() {
        let s = combined_similarity(&[(0.7, "same", "same"), (0.3, "abc", "xyz")]);
        assert!((s - 0.7).abs() < 1e-9);
    }
}
