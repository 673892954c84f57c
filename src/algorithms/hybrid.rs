use super::{
    context_feature_keys, count_features, partition_by_action, ratio_weights, CandidateRanker,
    CollaborativeFiltering, ContentBasedFiltering, RankingRequest,
};
use crate::models::*;
use crate::utils::{position_decay, sort_by_score_desc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Share of the blended score each strategy's ranking contributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub collaborative: f64,
    pub content_based: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            collaborative: 0.3,
            content_based: 0.7,
        }
    }
}

/// Blends content-based and collaborative rankings, and owns profile updates.
#[derive(Debug, Clone)]
pub struct HybridRecommender {
    collaborative: CollaborativeFiltering,
    content_based: ContentBasedFiltering,
    confidence_saturation: usize,
}

impl Default for HybridRecommender {
    fn default() -> Self {
        Self::new(CollaborativeFiltering::default(), ContentBasedFiltering::new(), 50)
    }
}

impl HybridRecommender {
    pub fn new(
        collaborative: CollaborativeFiltering,
        content_based: ContentBasedFiltering,
        confidence_saturation: usize,
    ) -> Self {
        Self {
            collaborative,
            content_based,
            confidence_saturation,
        }
    }

    pub fn content_based(&self) -> &ContentBasedFiltering {
        &self.content_based
    }

    pub fn collaborative(&self) -> &CollaborativeFiltering {
        &self.collaborative
    }

    pub fn generate_recommendations<'a>(
        &self,
        actor_id: &ActorId,
        profile: &ActorProfile,
        events: &[BehaviorEvent],
        items: &'a [Item],
        weights: BlendWeights,
    ) -> Vec<&'a Item> {
        self.generate_scored(actor_id, profile, events, items, weights)
            .into_iter()
            .map(|(item, _)| item)
            .collect()
    }

    /// Blended ranking with the score each item accumulated.
    pub fn generate_scored<'a>(
        &self,
        actor_id: &ActorId,
        profile: &ActorProfile,
        events: &[BehaviorEvent],
        items: &'a [Item],
        weights: BlendWeights,
    ) -> Vec<(&'a Item, f64)> {
        let request = RankingRequest {
            actor_id,
            profile,
            events,
            items,
        };

        let collaborative = self.collaborative.rank(&request);
        let content = self.content_based.rank(&request);
        debug!(
            actor = %actor_id,
            collaborative = collaborative.len(),
            content = content.len(),
            "blending {} and {} rankings",
            self.collaborative.name(),
            self.content_based.name()
        );

        blend(&[(collaborative, weights.collaborative), (content, weights.content_based)])
    }

    /// New profile with `event` appended and every weight mapping recomputed
    /// from the full history. The input profile is left untouched.
    pub fn update_profile(&self, profile: &ActorProfile, event: BehaviorEvent) -> ActorProfile {
        let mut history = Vec::with_capacity(profile.behavior_history.len() + 1);
        history.extend(profile.behavior_history.iter().cloned());
        history.push(event);

        ActorProfile {
            actor_id: profile.actor_id.clone(),
            preferences: self.recompute_weights(&history),
            learning_metrics: LearningMetrics::for_history(history.len(), self.confidence_saturation),
            behavior_history: history,
        }
    }

    pub fn recompute_weights(&self, history: &[BehaviorEvent]) -> PreferenceWeights {
        let mut weights = PreferenceWeights::default();
        for (key, weight) in self.content_based.compute_feature_weights(history) {
            weights.insert(&key, weight);
        }
        for (key, weight) in compute_context_weights(history) {
            weights.insert(&key, weight);
        }
        weights
    }
}

/// Like/skip ratio per time-of-day bucket and per day of week.
pub fn compute_context_weights(history: &[BehaviorEvent]) -> BTreeMap<FeatureKey, f64> {
    let (liked, skipped) = partition_by_action(history);
    let liked_counts = count_features(liked, |event| context_feature_keys(&event.context));
    let skipped_counts = count_features(skipped, |event| context_feature_keys(&event.context));
    ratio_weights(&liked_counts, &skipped_counts)
}

/// Merges ranked lists by item id. Rank `i` of a list of length `n` adds
/// `weight * (1 - i / n)`. Ties keep first-seen order.
pub fn blend<'a>(lists: &[(Vec<&'a Item>, f64)]) -> Vec<(&'a Item, f64)> {
    let mut merged: Vec<(&Item, f64)> = Vec::new();
    let mut positions: HashMap<&ItemId, usize> = HashMap::new();

    for (ranking, weight) in lists {
        let len = ranking.len();
        for (rank, item) in ranking.iter().enumerate() {
            let contribution = position_decay(*weight, rank, len);
            match positions.get(&item.id) {
                Some(&position) => merged[position].1 += contribution,
                None => {
                    positions.insert(&item.id, merged.len());
                    merged.push((*item, contribution));
                }
            }
        }
    }

    sort_by_score_desc(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str) -> ActorId {
        ActorId::new(id).unwrap()
    }

    fn item(id: &str, tags: &[&str]) -> Item {
        Item::new(ItemId::new(id).unwrap(), id, "Attraction")
            .with_tags(tags.iter().copied())
            .with_rating(4.2, 80)
    }

    fn ids<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<&'a str> {
        items.into_iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_blend_position_decay() {
        let a = item("a", &[]);
        let b = item("b", &[]);
        let c = item("c", &[]);

        let blended = blend(&[(vec![&c], 0.3), (vec![&a, &b, &c], 0.7)]);
        let scores: HashMap<&str, f64> = blended.iter().map(|(item, score)| (item.id.as_str(), *score)).collect();

        assert!((scores["a"] - 0.7).abs() < 1e-12);
        assert!((scores["b"] - 0.7 * (2.0 / 3.0)).abs() < 1e-12);
        assert!((scores["c"] - (0.3 + 0.7 / 3.0)).abs() < 1e-12);
        assert_eq!(ids(blended.iter().map(|(item, _)| *item)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_blend_ties_keep_first_seen_order() {
        let a = item("a", &[]);
        let b = item("b", &[]);
        let blended = blend(&[(vec![&a], 0.5), (vec![&b], 0.5)]);
        assert_eq!(ids(blended.iter().map(|(item, _)| *item)), vec!["a", "b"]);
    }

    #[test]
    fn test_update_profile_is_immutable_and_recomputes() {
        let hybrid = HybridRecommender::default();
        let profile = ActorProfile::new(actor("u"));
        let event = BehaviorEvent::new(actor("u"), item("m", &["museum"]), Action::Like).at(1_700_000_000_000);

        let updated = hybrid.update_profile(&profile, event);

        assert!(profile.behavior_history.is_empty());
        assert_eq!(profile.learning_metrics.total_interactions, 0);

        assert_eq!(updated.behavior_history.len(), 1);
        assert_eq!(updated.learning_metrics.total_interactions, 1);
        assert!((updated.learning_metrics.confidence - 0.02).abs() < 1e-12);
        assert_eq!(updated.preferences.tag_weights["tag_museum"], 1.0);
        assert_eq!(updated.preferences.tag_weights["rating_4"], 1.0);
        assert_eq!(updated.preferences.category_weights["category_attraction"], 1.0);
        assert_eq!(updated.preferences.context_weights.len(), 2);
    }

    #[test]
    fn test_context_weights_per_bucket() {
        // 2023-11-14T22:13:20Z is a Tuesday night
        let night = 1_700_000_000_000;
        // 2023-11-15T10:00:00Z is a Wednesday morning
        let morning = 1_700_042_400_000;
        let history = vec![
            BehaviorEvent::new(actor("u"), item("a", &[]), Action::Like).at(night),
            BehaviorEvent::new(actor("u"), item("b", &[]), Action::Skip).at(night),
            BehaviorEvent::new(actor("u"), item("c", &[]), Action::Like).at(morning),
        ];

        let weights = compute_context_weights(&history);
        assert_eq!(weights[&FeatureKey::TimeOfDay(TimeOfDay::Night)], 0.0);
        assert_eq!(weights[&FeatureKey::TimeOfDay(TimeOfDay::Morning)], 1.0);
        assert_eq!(weights[&FeatureKey::DayOfWeek(2)], 0.0);
        assert_eq!(weights[&FeatureKey::DayOfWeek(3)], 1.0);
        assert!(!weights.contains_key(&FeatureKey::TimeOfDay(TimeOfDay::Evening)));
    }

    #[test]
    fn test_recompute_twice_is_identical() {
        let hybrid = HybridRecommender::default();
        let mut profile = ActorProfile::new(actor("u"));
        for (i, action) in [Action::Like, Action::Skip, Action::View, Action::Like].into_iter().enumerate() {
            let event = BehaviorEvent::new(actor("u"), item(&format!("i{}", i), &["park", "nature"]), action);
            profile = hybrid.update_profile(&profile, event);
        }

        let first = hybrid.recompute_weights(&profile.behavior_history);
        let second = hybrid.recompute_weights(&profile.behavior_history);
        assert_eq!(first, second);
        assert_eq!(first, profile.preferences);
    }

    #[test]
    fn test_generate_recommendations_blends_collaborative_signal() {
        let hybrid = HybridRecommender::default();
        let items = vec![item("museum", &["art"]), item("bar", &["nightlife"]), item("park", &["nature"])];

        let mut profile = ActorProfile::new(actor("u"));
        let own_like = BehaviorEvent::new(actor("u"), items[0].clone(), Action::Like);
        profile = hybrid.update_profile(&profile, own_like.clone());

        let events = vec![
            own_like,
            BehaviorEvent::new(actor("v"), items[0].clone(), Action::Like),
            BehaviorEvent::new(actor("v"), items[2].clone(), Action::Like),
        ];

        let ranked = hybrid.generate_recommendations(&actor("u"), &profile, &events, &items, BlendWeights::default());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ids(ranked), vec!["museum", "park", "bar"]);
    }
}
