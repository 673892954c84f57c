use crate::algorithms::{BlendWeights, CollaborativeFiltering, ContentBasedFiltering, HybridRecommender};
use crate::config::LearningConfig;
use crate::error::Result;
use crate::models::*;
use crate::services::storage::ProfileRepository;
use crate::utils::{descending, sort_by_score_desc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const GUIDANCE: [&str; 3] = [
    "Try more attractions to improve recommendations",
    "Rate attractions you visit to help the system learn",
    "Explore different types of attractions for better diversity",
];

/// Registry of actor profiles.
///
/// Profiles are immutable values behind `Arc`. Writers for the same actor are
/// serialized and swap in a fully built profile, so readers see either the
/// previous or the next profile without blocking on the recompute.
pub struct PreferenceManager {
    config: LearningConfig,
    hybrid: HybridRecommender,
    profiles: RwLock<HashMap<ActorId, Arc<ActorProfile>>>,
    writers: DashMap<ActorId, Arc<Mutex<()>>>,
    repository: Option<Arc<dyn ProfileRepository>>,
}

impl Default for PreferenceManager {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}

impl PreferenceManager {
    pub fn new(config: LearningConfig) -> Self {
        let hybrid = HybridRecommender::new(
            CollaborativeFiltering::new(config.similar_actor_limit, config.min_actor_similarity),
            ContentBasedFiltering::new(),
            config.confidence_saturation,
        );

        Self {
            config,
            hybrid,
            profiles: RwLock::new(HashMap::new()),
            writers: DashMap::new(),
            repository: None,
        }
    }

    pub fn with_repository(mut self, repository: Arc<dyn ProfileRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn hybrid(&self) -> &HybridRecommender {
        &self.hybrid
    }

    /// Loads every stored profile, replacing in-memory ones with the same id.
    pub fn hydrate(&self) -> Result<usize> {
        let Some(repository) = &self.repository else {
            return Ok(0);
        };

        let loaded = repository.load_all()?;
        let count = loaded.len();
        let mut profiles = self.profiles.write();
        for profile in loaded {
            profiles.insert(profile.actor_id.clone(), Arc::new(profile));
        }
        info!("Hydrated {} actor profiles", count);
        Ok(count)
    }

    pub fn get_or_create_profile(&self, actor_id: &ActorId) -> Arc<ActorProfile> {
        if let Some(profile) = self.profiles.read().get(actor_id) {
            return profile.clone();
        }

        self.profiles
            .write()
            .entry(actor_id.clone())
            .or_insert_with(|| {
                debug!(actor = %actor_id, "Created empty profile");
                Arc::new(ActorProfile::new(actor_id.clone()))
            })
            .clone()
    }

    /// Existing profile, without creating one.
    pub fn profile(&self, actor_id: &ActorId) -> Option<Arc<ActorProfile>> {
        self.profiles.read().get(actor_id).cloned()
    }

    fn writer(&self, actor_id: &ActorId) -> Arc<Mutex<()>> {
        self.writers.entry(actor_id.clone()).or_default().value().clone()
    }

    /// Appends the event to its actor's history and recomputes the profile.
    ///
    /// Never fails. A repository error is logged and the in-memory update kept.
    pub fn record_behavior(&self, event: BehaviorEvent) {
        let actor_id = event.actor_id.clone();
        let writer = self.writer(&actor_id);
        let _guard = writer.lock();

        let current = self.get_or_create_profile(&actor_id);
        let updated = Arc::new(self.hybrid.update_profile(&current, event));
        self.profiles.write().insert(actor_id.clone(), updated.clone());

        debug!(
            actor = %actor_id,
            interactions = updated.total_interactions(),
            confidence = updated.learning_metrics.confidence,
            "Recorded behavior"
        );

        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save(&updated) {
                warn!(actor = %actor_id, "Failed to persist profile: {}", e);
            }
        }
    }

    /// Popularity order below the cold-start threshold, hybrid order above it.
    pub fn get_personalized_recommendations<'a>(
        &self,
        actor_id: &ActorId,
        items: &'a [Item],
        all_events: &[BehaviorEvent],
    ) -> Vec<&'a Item> {
        let profile = self.get_or_create_profile(actor_id);

        if profile.total_interactions() < self.config.cold_start_threshold {
            debug!(
                actor = %actor_id,
                interactions = profile.total_interactions(),
                "Cold start, ranking by popularity"
            );
            return popularity_ranking(items, self.config.popularity_limit);
        }

        let weights = BlendWeights {
            collaborative: self.config.collaborative_weight,
            content_based: self.config.content_weight,
        };
        self.hybrid
            .generate_recommendations(actor_id, &profile, all_events, items, weights)
    }

    pub fn get_insights(&self, actor_id: &ActorId) -> Insights {
        let profile = self.get_or_create_profile(actor_id);

        let mut ranked: Vec<(&str, f64)> = profile.preferences.iter_all().collect();
        sort_by_score_desc(&mut ranked);
        ranked.truncate(self.config.top_preferences);

        Insights {
            confidence: profile.learning_metrics.confidence,
            total_interactions: profile.total_interactions(),
            top_preferences: ranked
                .into_iter()
                .map(|(feature, weight)| TopPreference {
                    feature: feature.to_string(),
                    weight,
                })
                .collect(),
            recommendations: GUIDANCE.iter().map(|line| line.to_string()).collect(),
        }
    }

    /// Point-in-time copy of every profile.
    pub fn snapshot(&self) -> HashMap<ActorId, Arc<ActorProfile>> {
        self.profiles.read().clone()
    }

    /// Every recorded event across actors, oldest first.
    pub fn all_events(&self) -> Vec<BehaviorEvent> {
        let mut profiles: Vec<Arc<ActorProfile>> = self.snapshot().into_values().collect();
        profiles.sort_by(|a, b| a.actor_id.cmp(&b.actor_id));

        let mut events: Vec<BehaviorEvent> = profiles
            .iter()
            .flat_map(|profile| profile.behavior_history.iter().cloned())
            .collect();
        events.sort_by_key(|event| event.timestamp);
        events
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

/// Items by `rating * ln(reviews + 1)`, highest first, at most `limit`.
pub fn popularity_ranking(items: &[Item], limit: usize) -> Vec<&Item> {
    let mut ranked: Vec<&Item> = items.iter().collect();
    ranked.sort_by(|a, b| descending(a.popularity(), b.popularity()));
    ranked.truncate(limit);
    ranked
}
