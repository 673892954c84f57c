use crate::algorithms::traits::TraitCatalog;
use crate::config::ScoringConfig;
use crate::error::Result;
use crate::models::*;
use crate::utils::{descending, jaccard_similarity, lowercase_set};
use rayon::prelude::*;
use std::borrow::Borrow;
use std::collections::HashSet;
use tracing::debug;

/// Explainable multi-factor venue scoring and catalog ranking.
#[derive(Debug, Clone)]
pub struct VenueScoringService {
    config: ScoringConfig,
    traits: TraitCatalog,
}

/// What an actor's swipe history says about a catalog.
#[derive(Debug, Default)]
pub struct SwipeSignals<'a> {
    pub liked: Vec<&'a Venue>,
    /// Lower-cased, like every tag set below.
    pub liked_categories: HashSet<String>,
    pub liked_tags: HashSet<String>,
    pub disliked_categories: HashSet<String>,
    pub disliked_tags: HashSet<String>,
    pub seen: HashSet<&'a ItemId>,
}

impl<'a> SwipeSignals<'a> {
    pub fn from_swipes(swipes: &'a [VenueSwipe]) -> Self {
        let mut signals = Self::default();

        for swipe in swipes {
            let venue = &swipe.venue;
            signals.seen.insert(&venue.id);

            let (categories, tags) = match swipe.action {
                SwipeAction::Like => {
                    signals.liked.push(venue);
                    (&mut signals.liked_categories, &mut signals.liked_tags)
                }
                SwipeAction::Dislike => (&mut signals.disliked_categories, &mut signals.disliked_tags),
                SwipeAction::Skip => continue,
            };

            if !venue.category.is_empty() {
                categories.insert(venue.category.to_lowercase());
            }
            tags.extend(venue.lowercase_tags().filter(|tag| !tag.is_empty()));
        }

        signals
    }
}

impl VenueScoringService {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        Ok(Self {
            config,
            traits: TraitCatalog::builtin()?,
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn traits(&self) -> &TraitCatalog {
        &self.traits
    }

    pub fn quality_score(&self, venue: &Venue) -> f64 {
        venue.rating.filter(|rating| rating.is_finite()).unwrap_or(0.0) / 5.0
    }

    /// Category matches count double, tag matches once, and a free-text hit in
    /// name or description adds half.
    pub fn interest_score(&self, venue: &Venue, interests: &[String]) -> f64 {
        if interests.is_empty() {
            return 0.5;
        }

        let category = venue.category.to_lowercase();
        let tags: Vec<String> = venue.lowercase_tags().filter(|tag| !tag.is_empty()).collect();
        let text = venue.text();

        let mut strong = 0.0;
        let mut matches = 0.0;

        for interest in interests.iter().map(|interest| interest.to_lowercase()) {
            if interest.is_empty() {
                continue;
            }

            if !category.is_empty() && (category.contains(&interest) || interest.contains(&category)) {
                strong += 1.0;
                matches += 1.0;
                continue;
            }

            if tags.iter().any(|tag| tag.contains(&interest) || interest.contains(tag.as_str())) {
                matches += 1.0;
            }

            if text.contains(&interest) {
                matches += 0.5;
            }
        }

        ((strong * 2.0 + matches) / (interests.len() as f64 * 2.0)).min(1.0)
    }

    /// Share of selected traits the venue satisfies. Unknown traits never match.
    pub fn trait_score(&self, venue: &Venue, traits: &[String]) -> f64 {
        if traits.is_empty() {
            return 0.5;
        }

        let matched = traits
            .iter()
            .filter(|trait_id| self.traits.matches(trait_id, venue))
            .count();
        (matched as f64 / traits.len() as f64).min(1.0)
    }

    pub fn budget_score(&self, venue: &Venue, budget_level: u8) -> f64 {
        let price = venue.price_level.unwrap_or(self.config.default_price_level);
        let difference = (f64::from(price) - f64::from(budget_level)).abs();
        (1.0 - difference * 0.25).max(0.0)
    }

    /// Mean similarity to the liked venues; 0.5 without any.
    pub fn similarity_score<V: Borrow<Venue>>(&self, venue: &Venue, liked: &[V]) -> f64 {
        if liked.is_empty() {
            return 0.5;
        }

        let category = venue.category.to_lowercase();
        let tags = lowercase_set(&venue.tags);
        let price = f64::from(venue.price_level.unwrap_or(self.config.default_price_level));

        let total: f64 = liked
            .iter()
            .map(|other| {
                let other = other.borrow();
                let mut similarity = 0.0;

                if category == other.category.to_lowercase() {
                    similarity += 0.4;
                }

                similarity += jaccard_similarity(&tags, &lowercase_set(&other.tags)) * 0.4;

                let other_price = f64::from(other.price_level.unwrap_or(self.config.default_price_level));
                similarity += (1.0 - (price - other_price).abs() * 0.2).max(0.0) * 0.2;

                similarity
            })
            .sum();

        total / liked.len() as f64
    }

    pub fn score_venue<V: Borrow<Venue>>(&self, venue: &Venue, preferences: &UserPreferences, liked: &[V]) -> ScoredVenue {
        let config = &self.config;
        let mut score = 0.0;
        let mut reasons = Vec::new();

        let quality = self.quality_score(venue);
        score += quality * config.quality_weight;
        if quality > 0.7 {
            reasons.push("Highly rated".to_string());
        }

        let interest = self.interest_score(venue, &preferences.interests);
        score += interest * config.interest_weight;
        if interest > 0.5 {
            reasons.push(format!("Matches your interests in {}", venue.category));
        }

        let traits = self.trait_score(venue, &preferences.traits);
        score += traits * config.trait_weight;
        if traits > 0.5 {
            reasons.push("Fits your travel style".to_string());
        }

        let budget = self.budget_score(venue, preferences.budget_level);
        score += budget * config.budget_weight;
        if budget > 0.8 {
            reasons.push("Within your budget".to_string());
        }

        let similarity = self.similarity_score(venue, liked);
        score += similarity * config.similarity_weight;
        if similarity > 0.5 {
            reasons.push("Similar to places you liked".to_string());
        }

        ScoredVenue {
            venue: venue.clone(),
            score,
            reasons,
        }
    }

    /// Base score plus the swipe-history boosts, penalties and novelty bonus.
    pub fn adjusted_score(&self, venue: &Venue, preferences: &UserPreferences, signals: &SwipeSignals<'_>) -> ScoredVenue {
        let config = &self.config;
        let mut scored = self.score_venue(venue, preferences, &signals.liked);
        let category = venue.category.to_lowercase();
        let tags: Vec<String> = venue.lowercase_tags().filter(|tag| !tag.is_empty()).collect();

        if signals.liked_categories.contains(&category) {
            scored.score += config.liked_category_boost;
            scored.reasons.insert(0, "Category you loved!".to_string());
        } else {
            scored.score += config.novelty_bonus;
            scored.reasons.push("New experience".to_string());
        }

        let liked_tags: Vec<&String> = tags.iter().filter(|tag| signals.liked_tags.contains(*tag)).collect();
        if let Some(first) = liked_tags.first() {
            scored.score += config.liked_tag_boost * liked_tags.len() as f64;
            scored.reasons.insert(0, format!("Has {} (you liked this!)", first));
        }

        if signals.disliked_categories.contains(&category) {
            scored.score -= config.disliked_category_penalty;
        }

        let disliked_tags = tags.iter().filter(|tag| signals.disliked_tags.contains(*tag)).count();
        scored.score -= config.disliked_tag_penalty * disliked_tags as f64;

        scored
    }

    /// Ranks the venues the actor has not swiped yet.
    ///
    /// The score threshold relaxes in steps so that a non-empty catalog of
    /// unseen venues never produces an empty result. When everything has been
    /// swiped, the catalog is returned by rating.
    pub fn rank_venues(
        &self,
        catalog: &[Venue],
        preferences: &UserPreferences,
        swipes: &[VenueSwipe],
        limit: Option<usize>,
    ) -> Vec<ScoredVenue> {
        let config = &self.config;
        let limit = limit.unwrap_or(config.default_limit);
        let signals = SwipeSignals::from_swipes(swipes);

        let unseen: Vec<&Venue> = catalog.iter().filter(|venue| !signals.seen.contains(&venue.id)).collect();
        if unseen.is_empty() {
            debug!(catalog = catalog.len(), "Every venue swiped, ranking by rating");
            return self.top_rated(catalog, preferences, &signals, limit);
        }

        let mut scored: Vec<ScoredVenue> = unseen
            .par_iter()
            .map(|venue| self.adjusted_score(venue, preferences, &signals))
            .collect();
        scored.sort_by(|a, b| descending(a.score, b.score));

        let threshold = if signals.liked.len() > config.strict_after_likes {
            config.strict_threshold
        } else {
            config.default_threshold
        };

        let mut passing = scored.iter().filter(|venue| venue.score >= threshold).count();
        let mut cutoff = Some(threshold);

        if passing < config.min_before_relax {
            debug!(passing, threshold, "Relaxing venue threshold to {}", config.relaxed_threshold);
            passing = scored.iter().filter(|venue| venue.score >= config.relaxed_threshold).count();
            cutoff = Some(config.relaxed_threshold);
        }

        if passing < config.min_before_fallback {
            debug!(passing, "Too few venues after relaxing, taking top {}", config.fallback_limit);
            cutoff = None;
        }

        let mut ranked: Vec<ScoredVenue> = match cutoff {
            Some(cutoff) => scored.into_iter().filter(|venue| venue.score >= cutoff).collect(),
            None => scored.into_iter().take(config.fallback_limit).collect(),
        };
        ranked.truncate(limit);
        ranked
    }

    fn top_rated(
        &self,
        catalog: &[Venue],
        preferences: &UserPreferences,
        signals: &SwipeSignals<'_>,
        limit: usize,
    ) -> Vec<ScoredVenue> {
        let mut by_rating: Vec<&Venue> = catalog.iter().collect();
        by_rating.sort_by(|a, b| descending(a.rating.unwrap_or(0.0), b.rating.unwrap_or(0.0)));
        by_rating
            .into_iter()
            .take(limit)
            .map(|venue| self.score_venue(venue, preferences, &signals.liked))
            .collect()
    }

    /// The strongest reason the venue suits the actor, or a generic fallback.
    pub fn recommendation_reason<V: Borrow<Venue>>(&self, venue: &Venue, preferences: &UserPreferences, liked: &[V]) -> String {
        self.score_venue(venue, preferences, liked)
            .reasons
            .into_iter()
            .next()
            .unwrap_or_else(|| format!("Popular {}", venue.category.to_lowercase()))
    }
}
