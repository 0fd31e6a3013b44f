use crate::document::TermWeights;

/// Dot product of two sparse term maps.
///
/// Iterates the smaller of the two maps; a term missing from either side
/// contributes zero, so the result does not depend on which side is walked.
#[inline]
pub fn dot(a: &TermWeights, b: &TermWeights) -> f64 {
    let (small, large) = if b.len() < a.len() { (b, a) } else { (a, b) };
    small
        .iter()
        .map(|(term, &w)| w * large.get(term).copied().unwrap_or(0.0))
        .sum()
}

/// Squared L2 norm of a sparse term map.
#[inline]
pub fn sq_norm(v: &TermWeights) -> f64 {
    v.values().map(|w| w * w).sum()
}

/// L2 (Euclidean) norm of a sparse term map.
#[inline]
pub fn l2_norm(v: &TermWeights) -> f64 {
    sq_norm(v).sqrt()
}

/// Divide every entry by the map's L2 norm (cosine normalization).
///
/// A map whose norm is zero is left untouched and `false` is returned,
/// since the normalized direction is undefined.
pub fn normalize_in_place(v: &mut TermWeights) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return false;
    }
    for w in v.values_mut() {
        *w /= norm;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(entries: &[(&str, f64)]) -> TermWeights {
        entries.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn dot_only_counts_shared_terms() {
        let a = weights(&[("a", 1.0), ("b", 2.0)]);
        let b = weights(&[("b", 3.0), ("c", 4.0)]);
        assert_eq!(dot(&a, &b), 6.0);
        assert_eq!(dot(&b, &a), 6.0);
    }

    #[test]
    fn dot_with_disjoint_maps_is_zero() {
        let a = weights(&[("a", 1.0)]);
        let b = weights(&[("b", 5.0)]);
        assert_eq!(dot(&a, &b), 0.0);
    }

    #[test]
    fn normalization_produces_unit_norm() {
        let mut v = weights(&[("a", 3.0), ("b", 4.0)]);
        assert!(normalize_in_place(&mut v));
        assert!((l2_norm(&v) - 1.0).abs() < 1e-12);
        assert!((v["a"] - 0.6).abs() < 1e-12);
        assert!((v["b"] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_map_is_left_unnormalized() {
        let mut v = weights(&[("a", 0.0)]);
        assert!(!normalize_in_place(&mut v));
        assert_eq!(v["a"], 0.0);
    }
}
