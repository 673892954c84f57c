use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;

pub mod validation;

/// Intersection size over union size; 0 when both sets are empty.
pub fn jaccard_similarity<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// `rating * ln(reviews + 1)`.
pub fn popularity_score(rating: f64, reviews: u64) -> f64 {
    let rating = if rating.is_finite() { rating } else { 0.0 };
    rating * ((reviews as f64) + 1.0).ln()
}

/// Linear rank decay: rank 0 of `len` scores `weight`, the last rank approaches 0.
pub fn position_decay(weight: f64, rank: usize, len: usize) -> f64 {
    if len == 0 {
        return 0.0;
    }
    weight * (1.0 - rank as f64 / len as f64)
}

/// Descending comparison that keeps NaN last.
pub fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Stable sort by score, highest first. Equal scores keep their input order.
pub fn sort_by_score_desc<T>(scored: &mut [(T, f64)]) {
    scored.sort_by(|a, b| descending(a.1, b.1));
}

pub fn lowercase_set<'a, I>(values: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    values.into_iter().map(|value| value.to_lowercase()).collect()
}
