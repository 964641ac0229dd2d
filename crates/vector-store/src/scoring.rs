use ndarray::Array1;

/// Scale `v` to unit length; the zero vector stays zero.
pub fn normalize(v: &Array1<f64>) -> Array1<f64> {
    let norm = v.dot(v).sqrt();
    if norm > 0.0 {
        v / norm
    } else {
        v.clone()
    }
}

/// Cosine similarity of two vectors, 0 when either has no length.
pub fn cosine(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let denom = a.dot(a).sqrt() * b.dot(b).sqrt();
    if denom > 0.0 {
        (a.dot(b) / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Mean of the given vectors, `None` for an empty slice.
pub fn centroid(vectors: &[&Array1<f64>]) -> Option<Array1<f64>> {
    let (first, rest) = vectors.split_first()?;
    let mut sum = (*first).clone();
    for v in rest {
        sum += *v;
    }
    Some(sum / vectors.len() as f64)
}

/// Map a positive similarity (and optional negative one), each in [-1, 1],
/// onto a rank in [0, 1].
pub fn to_rank(positive: f64, negative: Option<f64>) -> f64 {
    let rank = match negative {
        Some(negative) => (positive - negative + 2.0) / 4.0,
        None => (positive + 1.0) / 2.0,
    };
    rank.clamp(0.0, 1.0)
}
