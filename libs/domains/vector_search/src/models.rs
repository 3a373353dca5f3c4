use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const COLORS_COLLECTION: &str = "colors";
pub const IMAGES_COLLECTION: &str = "images";

/// Default deadline applied to every embedding and index call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Payload stored next to each vector
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Lifecycle state of a collection rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum CollectionState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl CollectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CollectionState::Completed | CollectionState::Failed)
    }
}

/// Snapshot of one collection's initialization progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionStatus {
    pub name: String,
    pub state: CollectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CollectionStatus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: CollectionState::NotStarted,
            error_message: None,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Point identifier: either a sequential integer or a UUID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ItemId {
    Num(u64),
    Uuid(Uuid),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Num(n) => write!(f, "{}", n),
            ItemId::Uuid(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId::Num(n)
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        ItemId::Uuid(id)
    }
}

/// How point ids are assigned when a collection is rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum IdScheme {
    /// 1, 2, 3, ... in the order items were embedded
    Sequential,
    /// Random UUID v4 per point
    Random,
}

impl IdScheme {
    /// Id for the point at 1-based `position`
    pub fn assign(&self, position: u64) -> ItemId {
        match self {
            IdScheme::Sequential => ItemId::Num(position),
            IdScheme::Random => ItemId::Uuid(Uuid::new_v4()),
        }
    }
}

/// Distance metric for similarity calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

/// Vector collection configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VectorConfig {
    pub dimension: u64,
    pub distance: DistanceMetric,
}

impl VectorConfig {
    pub fn new(dimension: u64) -> Self {
        Self {
            dimension,
            distance: DistanceMetric::default(),
        }
    }
}

/// Fixed settings of one named collection type
#[derive(Debug, Clone)]
pub struct CollectionDefinition {
    pub name: String,
    pub vector: VectorConfig,
    pub id_scheme: IdScheme,
    pub search_limit: u64,
    pub call_timeout: Duration,
}

impl CollectionDefinition {
    /// Color names embedded as text
    pub fn colors() -> Self {
        Self {
            name: COLORS_COLLECTION.to_string(),
            vector: VectorConfig::new(1024),
            id_scheme: IdScheme::Sequential,
            search_limit: 5,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Image files embedded as images
    pub fn images() -> Self {
        Self {
            name: IMAGES_COLLECTION.to_string(),
            vector: VectorConfig::new(1024),
            id_scheme: IdScheme::Random,
            search_limit: 5,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_dimension(mut self, dimension: u64) -> Self {
        self.vector.dimension = dimension;
        self
    }
}

/// A point to upsert into the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPoint {
    pub id: ItemId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

impl IndexPoint {
    pub fn new(id: ItemId, vector: Vec<f32>, payload: Payload) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }
}

/// Similarity query sent to the index
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub limit: u64,
    pub filter: Option<SearchFilter>,
}

impl SearchQuery {
    pub fn new(vector: Vec<f32>, limit: u64) -> Self {
        Self {
            vector,
            limit,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<SearchFilter>) -> Self {
        self.filter = filter;
        self
    }
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub id: ItemId,
    pub score: f32,
    #[schema(value_type = Object)]
    pub payload: Payload,
}

/// Value compared by a `Match` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl MatchValue {
    /// Whether a payload value equals this match value
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            MatchValue::Bool(expected) => value.as_bool() == Some(*expected),
            MatchValue::Integer(expected) => value.as_i64() == Some(*expected),
            MatchValue::Text(expected) => value.as_str() == Some(expected.as_str()),
        }
    }
}

impl From<bool> for MatchValue {
    fn from(value: bool) -> Self {
        MatchValue::Bool(value)
    }
}

impl From<i64> for MatchValue {
    fn from(value: i64) -> Self {
        MatchValue::Integer(value)
    }
}

impl From<&str> for MatchValue {
    fn from(value: &str) -> Self {
        MatchValue::Text(value.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(value: String) -> Self {
        MatchValue::Text(value)
    }
}

/// Payload filter expression, translated by each index adapter
///
/// ```json
/// { "all": [ { "match": { "key": "rand_number", "value": 3 } } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilter {
    Match {
        key: String,
        value: MatchValue,
    },
    Range {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gt: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lt: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<f64>,
    },
    All(Vec<SearchFilter>),
    Any(Vec<SearchFilter>),
    Not(Box<SearchFilter>),
}

impl SearchFilter {
    pub fn matches(key: impl Into<String>, value: impl Into<MatchValue>) -> Self {
        SearchFilter::Match {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Evaluate the filter against a payload
    pub fn evaluate(&self, payload: &Payload) -> bool {
        match self {
            SearchFilter::Match { key, value } => {
                payload.get(key).is_some_and(|v| value.matches(v))
            }
            SearchFilter::Range {
                key,
                gt,
                gte,
                lt,
                lte,
            } => match payload.get(key).and_then(serde_json::Value::as_f64) {
                Some(v) => {
                    gt.is_none_or(|b| v > b)
                        && gte.is_none_or(|b| v >= b)
                        && lt.is_none_or(|b| v < b)
                        && lte.is_none_or(|b| v <= b)
                }
                None => false,
            },
            SearchFilter::All(filters) => filters.iter().all(|f| f.evaluate(payload)),
            SearchFilter::Any(filters) => filters.iter().any(|f| f.evaluate(payload)),
            SearchFilter::Not(filter) => !filter.evaluate(payload),
        }
    }
}

/// Vector produced by an embedding provider
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }
}
