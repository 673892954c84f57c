pub mod collaborative;
pub mod content_based;
pub mod hybrid;
pub mod traits;

pub use collaborative::CollaborativeFiltering;
pub use content_based::ContentBasedFiltering;
pub use hybrid::{BlendWeights, HybridRecommender};

use crate::models::*;
use std::collections::BTreeMap;

/// Occurrence counts per feature key. Ordered, so every pass over it is deterministic.
pub type FeatureCounts = BTreeMap<FeatureKey, u32>;

/// One candidate-ordering strategy the hybrid ranker can blend.
pub trait CandidateRanker: Send + Sync {
    fn name(&self) -> &str;

    /// Candidates in preference order. May return a subset of `request.items`.
    fn rank<'a>(&self, request: &RankingRequest<'_, 'a>) -> Vec<&'a Item>;
}

/// Inputs of one ranking pass. Only `items` must outlive the ranked output.
#[derive(Debug, Clone, Copy)]
pub struct RankingRequest<'r, 'a> {
    pub actor_id: &'r ActorId,
    pub profile: &'r ActorProfile,
    pub events: &'r [BehaviorEvent],
    pub items: &'a [Item],
}

/// Feature keys an item exhibits: tags, category, rating bucket, price
/// bucket and every true flag. Empty tags and categories are skipped.
pub fn item_feature_keys(item: &Item) -> Vec<FeatureKey> {
    let mut keys: Vec<FeatureKey> = item
        .tags
        .iter()
        .filter(|tag| !tag.trim().is_empty())
        .map(|tag| FeatureKey::tag(tag))
        .collect();

    if !item.category.trim().is_empty() {
        keys.push(FeatureKey::category(&item.category));
    }
    keys.push(FeatureKey::Rating(item.rating_bucket()));
    if let Some(level) = item.price_level {
        keys.push(FeatureKey::Price(level));
    }
    keys.extend(item.features.present().map(FeatureKey::Flag));
    keys
}

pub fn context_feature_keys(context: &BehaviorContext) -> Vec<FeatureKey> {
    let mut keys = Vec::with_capacity(2);
    if let Some(slot) = context.time_of_day {
        keys.push(FeatureKey::TimeOfDay(slot));
    }
    if let Some(day) = context.day_of_week.filter(|day| *day < 7) {
        keys.push(FeatureKey::DayOfWeek(day));
    }
    keys
}

pub fn count_features<'a, I, F>(events: I, extract: F) -> FeatureCounts
where
    I: IntoIterator<Item = &'a BehaviorEvent>,
    F: Fn(&BehaviorEvent) -> Vec<FeatureKey>,
{
    let mut counts = FeatureCounts::new();
    for event in events {
        for key in extract(event) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// `(liked - skipped) / (liked + skipped)` for every key observed on either side.
pub fn ratio_weights(liked: &FeatureCounts, skipped: &FeatureCounts) -> BTreeMap<FeatureKey, f64> {
    let mut weights = BTreeMap::new();
    for key in liked.keys().chain(skipped.keys()) {
        if weights.contains_key(key) {
            continue;
        }
        let liked_count = liked.get(key).copied().unwrap_or(0) as f64;
        let skipped_count = skipped.get(key).copied().unwrap_or(0) as f64;
        let total = liked_count + skipped_count;
        if total > 0.0 {
            weights.insert(key.clone(), (liked_count - skipped_count) / total);
        }
    }
    weights
}

/// Like and skip events of a history; views and saves carry no signal here.
pub fn partition_by_action(history: &[BehaviorEvent]) -> (Vec<&BehaviorEvent>, Vec<&BehaviorEvent>) {
    let liked = history.iter().filter(|event| event.action == Action::Like).collect();
    let skipped = history.iter().filter(|event| event.action == Action::Skip).collect();
    (liked, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item::new(ItemId::new(id).unwrap(), id, "Museum")
            .with_tags(["Art", "History", ""])
            .with_rating(4.7, 120)
            .with_price_level(2)
            .with_features(FeatureFlags {
                has_photo: true,
                has_website: false,
                has_phone: true,
                is_open_now: None,
            })
    }

    #[test]
    fn test_item_feature_keys_are_namespaced() {
        let keys: Vec<String> = item_feature_keys(&item("met")).iter().map(ToString::to_string).collect();
        assert_eq!(
            keys,
            vec!["tag_art", "tag_history", "category_museum", "rating_4", "price_2", "has_photo", "has_phone"]
        );
    }

    #[test]
    fn test_context_feature_keys_skip_unknown() {
        assert!(context_feature_keys(&BehaviorContext::default()).is_empty());

        let context = BehaviorContext {
            time_of_day: Some(TimeOfDay::Evening),
            day_of_week: Some(9),
            ..BehaviorContext::default()
        };
        let keys: Vec<String> = context_feature_keys(&context).iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["time_evening"]);
    }

    #[test]
    fn test_ratio_weights() {
        let tag = FeatureKey::tag("museum");
        let other = FeatureKey::tag("nightlife");
        let liked: FeatureCounts = [(tag.clone(), 3)].into_iter().collect();
        let skipped: FeatureCounts = [(tag.clone(), 1), (other.clone(), 2)].into_iter().collect();

        let weights = ratio_weights(&liked, &skipped);
        assert_eq!(weights[&tag], 0.5);
        assert_eq!(weights[&other], -1.0);
        assert!(!weights.contains_key(&FeatureKey::tag("park")));
    }

    #[test]
    fn test_ranked_items_outlive_the_request_inputs() {
        let items = vec![item("met"), item("louvre")];

        let (ranked, collaborative): (Vec<&Item>, Vec<&Item>) = {
            let actor_id = ActorId::new("user_short").unwrap();
            let profile = ActorProfile::new(actor_id.clone());
            let events: Vec<BehaviorEvent> = Vec::new();
            let request = RankingRequest {
                actor_id: &actor_id,
                profile: &profile,
                events: &events,
                items: &items,
            };
            (
                ContentBasedFiltering.rank(&request),
                CollaborativeFiltering::default().rank(&request),
            )
        };

        assert_eq!(ranked.len(), 2);
        assert!(collaborative.is_empty());
    }
}
