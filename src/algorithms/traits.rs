use crate::error::Result;
use crate::models::Venue;
use crate::utils::validation::validate_trait_rules;
use std::collections::HashMap;

/// Keyword rule for one travel trait.
///
/// A venue matches when any keyword is a substring of one of its tags or of
/// its lower-cased name and description. With `match_category`, the category
/// is searched too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitRule {
    pub id: &'static str,
    pub keywords: &'static [&'static str],
    pub match_category: bool,
}

impl TraitRule {
    pub const fn new(id: &'static str, keywords: &'static [&'static str], match_category: bool) -> Self {
        Self {
            id,
            keywords,
            match_category,
        }
    }

    pub fn matches(&self, venue: &Venue) -> bool {
        let tags: Vec<String> = venue.lowercase_tags().collect();
        let category = venue.category.to_lowercase();
        let text = venue.text();

        self.keywords.iter().any(|keyword| {
            tags.iter().any(|tag| tag.contains(keyword))
                || (self.match_category && category.contains(keyword))
                || text.contains(keyword)
        })
    }
}

pub const TRAIT_RULES: &[TraitRule] = &[
    TraitRule::new(
        "adventurous",
        &["adventure", "outdoor", "sports", "hiking", "climbing", "kayak", "zip", "thrill"],
        false,
    ),
    TraitRule::new(
        "cultural",
        &["museum", "art", "culture", "historic", "gallery", "theater", "theatre", "heritage", "memorial"],
        true,
    ),
    TraitRule::new(
        "foodie",
        &["food", "restaurant", "cafe", "market", "dining", "culinary", "bakery", "cuisine"],
        true,
    ),
    TraitRule::new(
        "nightlife",
        &["nightlife", "bar", "club", "entertainment", "night", "lounge", "pub"],
        false,
    ),
    TraitRule::new(
        "relaxed",
        &["park", "nature", "spa", "garden", "peaceful", "calm", "beach", "relax"],
        true,
    ),
    TraitRule::new(
        "nature",
        &["park", "nature", "garden", "beach", "outdoor", "forest", "trail", "botanical", "wildlife"],
        true,
    ),
    TraitRule::new(
        "beach",
        &["beach", "shore", "coast", "ocean", "sea", "waterfront", "boardwalk"],
        false,
    ),
    TraitRule::new(
        "shopping",
        &["shopping", "mall", "market", "boutique", "store", "retail"],
        true,
    ),
    TraitRule::new(
        "wellness",
        &["spa", "wellness", "yoga", "fitness", "health", "meditation", "relaxation"],
        false,
    ),
    TraitRule::new(
        "photography",
        &["scenic", "view", "photo", "landmark", "observation", "lookout", "bridge", "architecture"],
        false,
    ),
    TraitRule::new(
        "art",
        &["art", "gallery", "museum", "sculpture", "painting", "exhibit", "artist"],
        true,
    ),
    TraitRule::new(
        "history",
        &["historic", "history", "heritage", "memorial", "monument", "museum", "ancient"],
        true,
    ),
    // onboarding trait cards
    TraitRule::new("ocean-view", &["ocean", "sea", "waterfront", "harbor", "coast", "pier"], false),
    TraitRule::new("mountains", &["mountain", "peak", "summit", "alpine", "overlook"], false),
    TraitRule::new("hiking", &["hiking", "hike", "trail", "trek"], true),
    TraitRule::new("coffee", &["coffee", "cafe", "café", "roaster", "espresso"], true),
];

/// Validated lookup table from trait id to rule.
#[derive(Debug, Clone)]
pub struct TraitCatalog {
    rules: HashMap<&'static str, TraitRule>,
}

impl TraitCatalog {
    pub fn new(rules: &[TraitRule]) -> Result<Self> {
        validate_trait_rules(rules)?;
        Ok(Self {
            rules: rules.iter().map(|rule| (rule.id, *rule)).collect(),
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(TRAIT_RULES)
    }

    pub fn rule(&self, trait_id: &str) -> Option<&TraitRule> {
        self.rules.get(trait_id.to_lowercase().as_str())
    }

    /// Unknown traits never match.
    pub fn matches(&self, trait_id: &str, venue: &Venue) -> bool {
        self.rule(trait_id).is_some_and(|rule| rule.matches(venue))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
