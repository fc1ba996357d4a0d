//! Cosine distance and brute-force nearest-neighbour ranking.

/// Cosine distance `1 - cos(a, b)`, in `[0, 2]`.
///
/// Mismatched lengths or a zero vector yield the maximum-uncertainty
/// distance of `1.0` rather than NaN.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    1.0 - similarity
}

/// Rank `candidates` by distance to `query`, nearest first, keeping `limit`.
/// Ties keep candidate order.
pub fn rank<'a, T, I>(query: &[f32], candidates: I, limit: usize) -> Vec<(f64, T)>
where
    I: IntoIterator<Item = (&'a [f32], T)>,
{
    let mut scored: Vec<(f64, T)> = candidates
        .into_iter()
        .map(|(embedding, item)| (cosine_distance(query, embedding), item))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(limit);
    scored
}
