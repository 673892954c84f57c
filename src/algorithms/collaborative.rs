use super::{CandidateRanker, RankingRequest};
use crate::models::*;
use crate::utils::{jaccard_similarity, sort_by_score_desc};
use std::collections::{HashMap, HashSet};

/// Surfaces items liked by actors whose likes overlap the target actor's.
#[derive(Debug, Clone)]
pub struct CollaborativeFiltering {
    pub similar_actor_limit: usize,
    pub min_similarity: f64,
}

impl Default for CollaborativeFiltering {
    fn default() -> Self {
        Self::new(10, 0.1)
    }
}

/// Liked item sets per actor, built in one pass over the events.
struct LikeIndex<'a> {
    actors: Vec<&'a ActorId>,
    liked: HashMap<&'a ActorId, HashSet<&'a ItemId>>,
    liked_in_order: HashMap<&'a ActorId, Vec<&'a ItemId>>,
}

impl<'a> LikeIndex<'a> {
    fn build(events: &'a [BehaviorEvent]) -> Self {
        let mut actors = Vec::new();
        let mut seen = HashSet::new();
        let mut liked: HashMap<&ActorId, HashSet<&ItemId>> = HashMap::new();
        let mut liked_in_order: HashMap<&ActorId, Vec<&ItemId>> = HashMap::new();

        for event in events {
            if seen.insert(&event.actor_id) {
                actors.push(&event.actor_id);
            }
            if event.action == Action::Like
                && liked.entry(&event.actor_id).or_default().insert(&event.item_id)
            {
                liked_in_order.entry(&event.actor_id).or_default().push(&event.item_id);
            }
        }

        Self {
            actors,
            liked,
            liked_in_order,
        }
    }

    fn similarity(&self, a: &ActorId, b: &ActorId) -> f64 {
        match (self.liked.get(a), self.liked.get(b)) {
            (Some(a_liked), Some(b_liked)) => jaccard_similarity(a_liked, b_liked),
            _ => 0.0,
        }
    }

    fn liked_by(&self, actor: &ActorId) -> &[&'a ItemId] {
        self.liked_in_order.get(actor).map(Vec::as_slice).unwrap_or(&[])
    }

    fn has_liked(&self, actor: &ActorId, item: &ItemId) -> bool {
        self.liked.get(actor).is_some_and(|liked| liked.contains(item))
    }
}

impl CollaborativeFiltering {
    pub fn new(similar_actor_limit: usize, min_similarity: f64) -> Self {
        Self {
            similar_actor_limit,
            min_similarity,
        }
    }

    /// Jaccard similarity of the two actors' liked item sets.
    pub fn similarity(&self, a: &ActorId, b: &ActorId, events: &[BehaviorEvent]) -> f64 {
        LikeIndex::build(events).similarity(a, b)
    }

    /// Other actors above the similarity floor, most similar first, at most `limit`.
    pub fn similar_actors(&self, actor: &ActorId, events: &[BehaviorEvent], limit: usize) -> Vec<(ActorId, f64)> {
        let index = LikeIndex::build(events);
        self.similar_in(&index, actor, limit)
            .into_iter()
            .map(|(other, similarity)| (other.clone(), similarity))
            .collect()
    }

    fn similar_in<'a>(&self, index: &LikeIndex<'a>, actor: &ActorId, limit: usize) -> Vec<(&'a ActorId, f64)> {
        let mut similar: Vec<(&ActorId, f64)> = index
            .actors
            .iter()
            .filter(|other| **other != actor)
            .map(|other| (*other, index.similarity(actor, other)))
            .filter(|(_, similarity)| *similarity > self.min_similarity)
            .collect();

        sort_by_score_desc(&mut similar);
        similar.truncate(limit);
        similar
    }

    /// Items liked by similar actors and not by `actor`, scored by the summed
    /// similarity of the actors who liked them. Only items present in `items`
    /// are returned. Empty when nobody is similar enough.
    pub fn collaborative_scores<'a>(
        &self,
        actor: &ActorId,
        events: &[BehaviorEvent],
        items: &'a [Item],
    ) -> Vec<(&'a Item, f64)> {
        let index = LikeIndex::build(events);
        let similar = self.similar_in(&index, actor, self.similar_actor_limit);
        if similar.is_empty() {
            return Vec::new();
        }

        let catalog: HashMap<&ItemId, &Item> = items.iter().map(|item| (&item.id, item)).collect();
        let mut scored: Vec<(&Item, f64)> = Vec::new();
        let mut positions: HashMap<&ItemId, usize> = HashMap::new();

        for (other, similarity) in similar {
            for item_id in index.liked_by(other) {
                if index.has_liked(actor, item_id) {
                    continue;
                }
                let Some(item) = catalog.get(*item_id) else {
                    continue;
                };
                match positions.get(*item_id) {
                    Some(&position) => scored[position].1 += similarity,
                    None => {
                        positions.insert(*item_id, scored.len());
                        scored.push((*item, similarity));
                    }
                }
            }
        }

        sort_by_score_desc(&mut scored);
        scored
    }

    pub fn collaborative_recommendations<'a>(
        &self,
        actor: &ActorId,
        events: &[BehaviorEvent],
        items: &'a [Item],
    ) -> Vec<&'a Item> {
        self.collaborative_scores(actor, events, items)
            .into_iter()
            .map(|(item, _)| item)
            .collect()
    }
}

impl CandidateRanker for CollaborativeFiltering {
    fn name(&self) -> &str {
        "collaborative"
    }

    fn rank<'a>(&self, request: &RankingRequest<'_, 'a>) -> Vec<&'a Item> {
        self.collaborative_recommendations(request.actor_id, request.events, request.items)
    }
}
