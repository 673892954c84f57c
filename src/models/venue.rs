use super::{Coordinates, FeatureFlags, Item, ItemId, ItemLocation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueLocation {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default)]
    pub address: String,
}

/// A catalog venue, with the richer structured fields the catalog carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: VenueLocation,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Review count, when the catalog knows it.
    #[serde(default)]
    pub reviews: Option<u64>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub google_place_id: Option<String>,
}

impl Venue {
    pub fn new(id: ItemId, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            description: String::new(),
            location: VenueLocation::default(),
            price_level: None,
            rating: None,
            reviews: None,
            photos: Vec::new(),
            tags: Vec::new(),
            google_place_id: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_price_level(mut self, price_level: u8) -> Self {
        self.price_level = Some(price_level);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn lowercase_tags(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|tag| tag.to_lowercase())
    }

    /// Lower-cased `name description`, used for free-text matching.
    pub fn text(&self) -> String {
        format!("{} {}", self.name, self.description).to_lowercase()
    }
}

impl From<&Venue> for Item {
    fn from(venue: &Venue) -> Self {
        let coordinates = (venue.location.lat != 0.0 || venue.location.lng != 0.0).then_some(Coordinates {
            lat: venue.location.lat,
            lng: venue.location.lng,
        });

        Item {
            id: venue.id.clone(),
            title: venue.name.clone(),
            tags: venue.tags.clone(),
            rating: venue.rating.unwrap_or(0.0),
            reviews: venue.reviews.unwrap_or(0),
            price_level: venue.price_level,
            category: venue.category.clone(),
            location: ItemLocation {
                city: String::new(),
                country: String::new(),
                coordinates,
            },
            features: FeatureFlags {
                has_photo: !venue.photos.is_empty(),
                ..FeatureFlags::default()
            },
        }
    }
}

/// What the actor declared during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default = "default_budget_level")]
    pub budget_level: u8,
    #[serde(default = "default_travel_style")]
    pub travel_style: String,
}

fn default_budget_level() -> u8 {
    2
}

fn default_travel_style() -> String {
    "solo".to_string()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            interests: Vec::new(),
            traits: Vec::new(),
            budget_level: default_budget_level(),
            travel_style: default_travel_style(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVenue {
    pub venue: Venue,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Dislike,
    Skip,
}

/// A persisted swipe, joined with the venue it was made on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueSwipe {
    pub venue: Venue,
    pub action: SwipeAction,
}

impl VenueSwipe {
    pub fn new(venue: Venue, action: SwipeAction) -> Self {
        Self { venue, action }
    }
}
