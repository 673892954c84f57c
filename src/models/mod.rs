use crate::error::{EngineError, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub mod venue;

pub use venue::*;

/// Stable identifier of an actor (a user or visitor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EngineError::InvalidActorId(id));
        }
        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(format!("user_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActorId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ActorId> for String {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of a recommendable item or venue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EngineError::InvalidItemId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemLocation {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    HasPhoto,
    HasWebsite,
    HasPhone,
    IsOpenNow,
}

impl FeatureFlag {
    pub const ALL: [FeatureFlag; 4] = [
        FeatureFlag::HasPhoto,
        FeatureFlag::HasWebsite,
        FeatureFlag::HasPhone,
        FeatureFlag::IsOpenNow,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FeatureFlag::HasPhoto => "has_photo",
            FeatureFlag::HasWebsite => "has_website",
            FeatureFlag::HasPhone => "has_phone",
            FeatureFlag::IsOpenNow => "is_open_now",
        }
    }
}

/// Boolean feature bundle. `is_open_now` is unknown when `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub has_photo: bool,
    #[serde(default)]
    pub has_website: bool,
    #[serde(default)]
    pub has_phone: bool,
    #[serde(default)]
    pub is_open_now: Option<bool>,
}

impl FeatureFlags {
    pub fn is_set(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::HasPhoto => self.has_photo,
            FeatureFlag::HasWebsite => self.has_website,
            FeatureFlag::HasPhone => self.has_phone,
            FeatureFlag::IsOpenNow => self.is_open_now.unwrap_or(false),
        }
    }

    pub fn present(&self) -> impl Iterator<Item = FeatureFlag> + '_ {
        FeatureFlag::ALL.into_iter().filter(move |flag| self.is_set(*flag))
    }
}

/// A recommendable venue or attraction, as observed at interaction time.
///
/// Everything except the id defaults to a neutral value so that partially
/// populated snapshots still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u64,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: ItemLocation,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tags: Vec::new(),
            rating: 0.0,
            reviews: 0,
            price_level: None,
            category: category.into(),
            location: ItemLocation::default(),
            features: FeatureFlags::default(),
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

    pub fn with_rating(mut self, rating: f64, reviews: u64) -> Self {
        self.rating = rating;
        self.reviews = reviews;
        self
    }

    pub fn with_price_level(mut self, price_level: u8) -> Self {
        self.price_level = Some(price_level);
        self
    }

    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Integer rating bucket, clamped to 0..=5.
    pub fn rating_bucket(&self) -> u8 {
        if self.rating.is_finite() {
            self.rating.floor().clamp(0.0, 5.0) as u8
        } else {
            0
        }
    }

    /// `rating * ln(reviews + 1)`, the cold-start popularity signal.
    pub fn popularity(&self) -> f64 {
        crate::utils::popularity_score(self.rating, self.reviews)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Like,
    Skip,
    View,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => TimeOfDay::Night,
            6..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

/// Situational context captured with a behavior event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorContext {
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub time_of_day: Option<TimeOfDay>,
    /// 0 = Sunday .. 6 = Saturday.
    #[serde(default)]
    pub day_of_week: Option<u8>,
    #[serde(default)]
    pub season: Option<Season>,
}

impl BehaviorContext {
    /// Context with the time buckets derived from an epoch-millis timestamp (UTC).
    pub fn at(timestamp_ms: i64) -> Self {
        let mut context = Self::default();
        if let Some(at) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
            context.time_of_day = Some(TimeOfDay::from_hour(at.hour()));
            context.day_of_week = Some(at.weekday().num_days_from_sunday() as u8);
        }
        context
    }

    pub fn with_selections(mut self, traits: Vec<String>, interests: Vec<String>) -> Self {
        self.traits = traits;
        self.interests = interests;
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }
}

/// Append-only record of one actor action on one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventRecord")]
pub struct BehaviorEvent {
    pub actor_id: ActorId,
    pub item_id: ItemId,
    pub action: Action,
    /// Epoch millis.
    pub timestamp: i64,
    /// Denormalized snapshot; `None` when the producer sent only ids.
    pub item: Option<Item>,
    pub context: BehaviorContext,
}

/// Wire form of a behavior event. A missing timestamp means "now", and
/// missing time buckets are derived from the timestamp.
#[derive(Deserialize)]
struct EventRecord {
    actor_id: ActorId,
    item_id: ItemId,
    action: Action,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    item: Option<Item>,
    #[serde(default)]
    context: BehaviorContext,
}

impl From<EventRecord> for BehaviorEvent {
    fn from(record: EventRecord) -> Self {
        let timestamp = record.timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
        let derived = BehaviorContext::at(timestamp);
        let mut context = record.context;
        context.time_of_day = context.time_of_day.or(derived.time_of_day);
        context.day_of_week = context.day_of_week.or(derived.day_of_week);

        Self {
            actor_id: record.actor_id,
            item_id: record.item_id,
            action: record.action,
            timestamp,
            item: record.item,
            context,
        }
    }
}

impl BehaviorEvent {
    pub fn new(actor_id: ActorId, item: Item, action: Action) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        Self {
            actor_id,
            item_id: item.id.clone(),
            action,
            timestamp,
            item: Some(item),
            context: BehaviorContext::at(timestamp),
        }
    }

    /// Event carrying only ids; item feature contributions are neutral.
    pub fn minimal(actor_id: ActorId, item_id: ItemId, action: Action) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        Self {
            actor_id,
            item_id,
            action,
            timestamp,
            item: None,
            context: BehaviorContext::at(timestamp),
        }
    }

    pub fn at(mut self, timestamp_ms: i64) -> Self {
        let derived = BehaviorContext::at(timestamp_ms);
        self.timestamp = timestamp_ms;
        self.context.time_of_day = derived.time_of_day;
        self.context.day_of_week = derived.day_of_week;
        self
    }

    pub fn with_context(mut self, context: BehaviorContext) -> Self {
        self.context = context;
        self
    }
}

/// Which of the four weight mappings a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightDimension {
    Tag,
    Category,
    Feature,
    Context,
}

/// A namespaced, deterministic feature key.
///
/// Rating and price buckets share the tag mapping; their prefixes keep
/// them apart from tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKey {
    Tag(String),
    Category(String),
    Rating(u8),
    Price(u8),
    Flag(FeatureFlag),
    TimeOfDay(TimeOfDay),
    DayOfWeek(u8),
}

impl FeatureKey {
    pub fn tag(tag: &str) -> Self {
        FeatureKey::Tag(tag.to_lowercase())
    }

    pub fn category(category: &str) -> Self {
        FeatureKey::Category(category.to_lowercase())
    }

    pub fn dimension(&self) -> WeightDimension {
        match self {
            FeatureKey::Tag(_) | FeatureKey::Rating(_) | FeatureKey::Price(_) => WeightDimension::Tag,
            FeatureKey::Category(_) => WeightDimension::Category,
            FeatureKey::Flag(_) => WeightDimension::Feature,
            FeatureKey::TimeOfDay(_) | FeatureKey::DayOfWeek(_) => WeightDimension::Context,
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Tag(tag) => write!(f, "tag_{}", tag),
            FeatureKey::Category(category) => write!(f, "category_{}", category),
            FeatureKey::Rating(bucket) => write!(f, "rating_{}", bucket),
            FeatureKey::Price(level) => write!(f, "price_{}", level),
            FeatureKey::Flag(flag) => f.write_str(flag.key()),
            FeatureKey::TimeOfDay(slot) => write!(f, "time_{}", slot.as_str()),
            FeatureKey::DayOfWeek(day) => write!(f, "day_{}", day),
        }
    }
}

/// The four independent weight mappings of a profile.
///
/// A key with no observations is absent; lookups treat absence as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceWeights {
    #[serde(default)]
    pub tag_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub category_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub feature_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub context_weights: BTreeMap<String, f64>,
}

impl PreferenceWeights {
    pub fn dimension(&self, dimension: WeightDimension) -> &BTreeMap<String, f64> {
        match dimension {
            WeightDimension::Tag => &self.tag_weights,
            WeightDimension::Category => &self.category_weights,
            WeightDimension::Feature => &self.feature_weights,
            WeightDimension::Context => &self.context_weights,
        }
    }

    fn dimension_mut(&mut self, dimension: WeightDimension) -> &mut BTreeMap<String, f64> {
        match dimension {
            WeightDimension::Tag => &mut self.tag_weights,
            WeightDimension::Category => &mut self.category_weights,
            WeightDimension::Feature => &mut self.feature_weights,
            WeightDimension::Context => &mut self.context_weights,
        }
    }

    pub fn insert(&mut self, key: &FeatureKey, weight: f64) {
        self.dimension_mut(key.dimension()).insert(key.to_string(), weight);
    }

    pub fn weight(&self, key: &FeatureKey) -> f64 {
        self.dimension(key.dimension())
            .get(&key.to_string())
            .copied()
            .unwrap_or(0.0)
    }

    /// Every weight, in tag, category, feature, context order.
    pub fn iter_all(&self) -> impl Iterator<Item = (&str, f64)> {
        self.tag_weights
            .iter()
            .chain(&self.category_weights)
            .chain(&self.feature_weights)
            .chain(&self.context_weights)
            .map(|(key, weight)| (key.as_str(), *weight))
    }

    pub fn len(&self) -> usize {
        self.tag_weights.len()
            + self.category_weights.len()
            + self.feature_weights.len()
            + self.context_weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningMetrics {
    pub total_interactions: usize,
    /// Epoch millis.
    pub last_updated: i64,
    pub confidence: f64,
}

impl LearningMetrics {
    pub fn empty() -> Self {
        Self {
            total_interactions: 0,
            last_updated: Utc::now().timestamp_millis(),
            confidence: 0.0,
        }
    }

    pub fn for_history(total_interactions: usize, saturation: usize) -> Self {
        Self {
            total_interactions,
            last_updated: Utc::now().timestamp_millis(),
            confidence: confidence_for(total_interactions, saturation),
        }
    }
}

/// `min(1, interactions / saturation)`.
pub fn confidence_for(total_interactions: usize, saturation: usize) -> f64 {
    if saturation == 0 {
        return 1.0;
    }
    (total_interactions as f64 / saturation as f64).min(1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub actor_id: ActorId,
    pub preferences: PreferenceWeights,
    pub behavior_history: Vec<BehaviorEvent>,
    pub learning_metrics: LearningMetrics,
}

impl ActorProfile {
    pub fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            preferences: PreferenceWeights::default(),
            behavior_history: Vec::new(),
            learning_metrics: LearningMetrics::empty(),
        }
    }

    pub fn total_interactions(&self) -> usize {
        self.learning_metrics.total_interactions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPreference {
    pub feature: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub confidence: f64,
    pub total_interactions: usize,
    pub top_preferences: Vec<TopPreference>,
    pub recommendations: Vec<String>,
}
