use super::{count_features, item_feature_keys, partition_by_action, ratio_weights, CandidateRanker, RankingRequest};
use crate::models::*;
use crate::utils::sort_by_score_desc;
use std::collections::BTreeMap;

/// Learns what a single actor tends to like versus skip, from their own history.
#[derive(Debug, Clone, Default)]
pub struct ContentBasedFiltering;

impl ContentBasedFiltering {
    pub fn new() -> Self {
        Self
    }

    /// Like/skip ratio for every item feature seen in the history.
    ///
    /// Pure and recomputed from scratch on each call.
    pub fn compute_feature_weights(&self, history: &[BehaviorEvent]) -> BTreeMap<FeatureKey, f64> {
        let (liked, skipped) = partition_by_action(history);
        let liked_counts = count_features(liked, snapshot_keys);
        let skipped_counts = count_features(skipped, snapshot_keys);
        ratio_weights(&liked_counts, &skipped_counts)
    }

    pub fn score_item(&self, item: &Item, weights: &PreferenceWeights) -> f64 {
        item_feature_keys(item).iter().map(|key| weights.weight(key)).sum()
    }

    /// Scores in input order; the caller sorts.
    pub fn score_items<'a>(&self, items: &'a [Item], weights: &PreferenceWeights) -> Vec<(&'a Item, f64)> {
        items.iter().map(|item| (item, self.score_item(item, weights))).collect()
    }
}

fn snapshot_keys(event: &BehaviorEvent) -> Vec<FeatureKey> {
    event.item.as_ref().map(item_feature_keys).unwrap_or_default()
}

impl CandidateRanker for ContentBasedFiltering {
    fn name(&self) -> &str {
        "content_based"
    }

    fn rank<'a>(&self, request: &RankingRequest<'_, 'a>) -> Vec<&'a Item> {
        let mut scored = self.score_items(request.items, &request.profile.preferences);
        sort_by_score_desc(&mut scored);
        scored.into_iter().map(|(item, _)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> ActorId {
        ActorId::new("user_a").unwrap()
    }

    fn venue(id: &str, category: &str, tags: &[&str]) -> Item {
        Item::new(ItemId::new(id).unwrap(), id, category)
            .with_tags(tags.iter().copied())
            .with_rating(4.5, 200)
    }

    fn event(item: Item, action: Action) -> BehaviorEvent {
        BehaviorEvent::new(actor(), item, action).at(1_700_000_000_000)
    }

    fn weights_from(map: BTreeMap<FeatureKey, f64>) -> PreferenceWeights {
        let mut weights = PreferenceWeights::default();
        for (key, weight) in &map {
            weights.insert(key, *weight);
        }
        weights
    }

    #[test]
    fn test_like_skip_ratio() {
        let history = vec![
            event(venue("a", "Museum", &["art"]), Action::Like),
            event(venue("b", "Museum", &["art"]), Action::Like),
            event(venue("c", "Gallery", &["art"]), Action::Like),
            event(venue("d", "Bar", &["art", "nightlife"]), Action::Skip),
            event(venue("e", "Club", &["nightlife"]), Action::Skip),
        ];

        let weights = ContentBasedFiltering::new().compute_feature_weights(&history);
        assert_eq!(weights[&FeatureKey::tag("art")], 0.5);
        assert_eq!(weights[&FeatureKey::tag("nightlife")], -1.0);
        assert_eq!(weights[&FeatureKey::category("museum")], 1.0);
        assert!(!weights.contains_key(&FeatureKey::tag("park")));
    }

    #[test]
    fn test_views_and_saves_are_ignored() {
        let history = vec![
            event(venue("a", "Museum", &["art"]), Action::View),
            event(venue("b", "Museum", &["art"]), Action::Save),
        ];
        assert!(ContentBasedFiltering::new().compute_feature_weights(&history).is_empty());
    }

    #[test]
    fn test_minimal_events_contribute_nothing() {
        let history = vec![BehaviorEvent::minimal(actor(), ItemId::new("x").unwrap(), Action::Like)];
        assert!(ContentBasedFiltering::new().compute_feature_weights(&history).is_empty());
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let history = vec![
            event(venue("a", "Museum", &["art", "history"]), Action::Like),
            event(venue("b", "Park", &["nature"]), Action::Skip),
            event(venue("c", "Museum", &["history"]), Action::Skip),
        ];
        let learner = ContentBasedFiltering::new();
        assert_eq!(learner.compute_feature_weights(&history), learner.compute_feature_weights(&history));
    }

    #[test]
    fn test_liked_tag_outscores_unseen_tag() {
        let history: Vec<_> = (0..5)
            .map(|i| event(venue(&format!("m{}", i), "Attraction", &["museum"]), Action::Like))
            .collect();
        let learner = ContentBasedFiltering::new();
        let weights = weights_from(learner.compute_feature_weights(&history));

        let museum = venue("new_museum", "Attraction", &["museum"]);
        let nightlife = venue("new_bar", "Attraction", &["nightlife"]);
        assert!(learner.score_item(&museum, &weights) > learner.score_item(&nightlife, &weights));
    }

    #[test]
    fn test_score_items_keeps_input_order() {
        let weights = weights_from([(FeatureKey::tag("art"), 1.0)].into_iter().collect());
        let items = vec![venue("a", "Park", &[]), venue("b", "Museum", &["art"])];

        let scored = ContentBasedFiltering::new().score_items(&items, &weights);
        assert_eq!(scored[0].0.id.as_str(), "a");
        assert_eq!(scored[0].1, 0.0);
        assert_eq!(scored[1].1, 1.0);
    }
}
