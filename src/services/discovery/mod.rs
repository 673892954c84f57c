use crate::models::*;
use crate::services::preference::PreferenceManager;
use crate::services::venue_scoring::VenueScoringService;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Catalog to ranked deck: venue scoring filters the raw catalog, then the
/// preference manager re-ranks what survived.
#[derive(Clone)]
pub struct DiscoveryService {
    preferences: Arc<PreferenceManager>,
    scoring: Arc<VenueScoringService>,
}

impl DiscoveryService {
    pub fn new(preferences: Arc<PreferenceManager>, scoring: Arc<VenueScoringService>) -> Self {
        Self { preferences, scoring }
    }

    /// `events` feeds the collaborative signal; the store's own events are used when `None`.
    pub fn discover(
        &self,
        actor_id: &ActorId,
        catalog: &[Venue],
        preferences: &UserPreferences,
        swipes: &[VenueSwipe],
        events: Option<&[BehaviorEvent]>,
        limit: Option<usize>,
    ) -> Vec<ScoredVenue> {
        let default_limit = self.scoring.config().default_limit;
        let limit = limit.unwrap_or(default_limit);
        // the re-rank may promote venues the filter placed below `limit`
        let filtered = self
            .scoring
            .rank_venues(catalog, preferences, swipes, Some(limit.max(default_limit)));

        let items: Vec<Item> = filtered.iter().map(|scored| Item::from(&scored.venue)).collect();
        let stored;
        let events: &[BehaviorEvent] = match events {
            Some(events) => events,
            None => {
                stored = self.preferences.all_events();
                &stored
            }
        };

        let ranked = self.preferences.get_personalized_recommendations(actor_id, &items, events);

        let mut by_id: HashMap<&ItemId, &ScoredVenue> =
            filtered.iter().map(|scored| (&scored.venue.id, scored)).collect();
        let deck: Vec<ScoredVenue> = ranked
            .into_iter()
            .filter_map(|item| by_id.remove(&item.id))
            .take(limit)
            .cloned()
            .collect();

        info!(
            actor = %actor_id,
            catalog = catalog.len(),
            filtered = filtered.len(),
            returned = deck.len(),
            "Built discovery deck"
        );
        deck
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LearningConfig, ScoringConfig};

    fn actor() -> ActorId {
        ActorId::new("user_discover").unwrap()
    }

    fn service() -> DiscoveryService {
        DiscoveryService::new(
            Arc::new(PreferenceManager::new(LearningConfig::default())),
            Arc::new(VenueScoringService::new(ScoringConfig::default()).unwrap()),
        )
    }

    fn venue(id: &str, category: &str, tags: &[&str], rating: f64, reviews: u64) -> Venue {
        let mut venue = Venue::new(ItemId::new(id).unwrap(), id, category)
            .with_tags(tags.iter().copied())
            .with_rating(rating);
        venue.reviews = Some(reviews);
        venue
    }

    #[test]
    fn test_cold_start_deck_is_popularity_ordered() {
        let svc = service();
        let catalog = vec![
            venue("low", "Museum", &[], 3.9, 10),
            venue("top", "Museum", &[], 4.8, 100),
            venue("mid", "Museum", &[], 4.2, 50),
        ];

        let no_events: Vec<BehaviorEvent> = Vec::new();
        let deck = svc.discover(&actor(), &catalog, &UserPreferences::default(), &[], Some(no_events.as_slice()), None);
        let ids: Vec<&str> = deck.iter().map(|scored| scored.venue.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "mid", "low"]);
        assert!(deck.iter().all(|scored| !scored.reasons.is_empty()));
    }

    #[test]
    fn test_swiped_venues_never_return() {
        let svc = service();
        let catalog = vec![venue("a", "Park", &[], 4.0, 10), venue("b", "Park", &[], 4.5, 10)];
        let swipes = vec![VenueSwipe::new(catalog[1].clone(), SwipeAction::Dislike)];

        let deck = svc.discover(&actor(), &catalog, &UserPreferences::default(), &swipes, None, None);
        assert_eq!(deck.len(), 1);
        assert_eq!(deck[0].venue.id.as_str(), "a");
    }

    #[test]
    fn test_learned_preferences_reorder_the_deck() {
        let svc = service();
        for i in 0..5 {
            let liked = Item::new(ItemId::new(format!("seen{}", i)).unwrap(), "Gallery", "Museum")
                .with_tags(["art"])
                .with_rating(4.0, 10);
            svc.preferences.record_behavior(BehaviorEvent::new(actor(), liked, Action::Like).at(i));
        }

        let catalog = vec![
            venue("bar", "Bar", &["nightlife"], 4.9, 5000),
            venue("gallery", "Museum", &["art"], 4.0, 10),
        ];
        let deck = svc.discover(&actor(), &catalog, &UserPreferences::default(), &[], None, Some(1));
        assert_eq!(deck.len(), 1);
        assert_eq!(deck[0].venue.id.as_str(), "gallery");
    }

    #[test]
    fn test_empty_catalog_gives_empty_deck() {
        let svc = service();
        assert!(svc.discover(&actor(), &[], &UserPreferences::default(), &[], None, None).is_empty());
    }
}
