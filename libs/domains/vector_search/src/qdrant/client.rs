use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, Distance, Filter, PointId, PointStruct, Range,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use tracing::instrument;
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::{
    DistanceMetric, IndexPoint, ItemId, MatchValue, Payload, SearchFilter, SearchHit,
    SearchQuery, VectorConfig,
};
use crate::repository::VectorIndex;

/// Qdrant-backed implementation of VectorIndex
pub struct QdrantIndex {
    client: Qdrant,
}

impl QdrantIndex {
    pub fn new(config: QdrantConfig) -> VectorSearchResult<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                VectorSearchError::Configuration(format!("Failed to build Qdrant client: {}", e))
            })?;

        Ok(Self { client })
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
        }
    }
}

fn to_point_id(id: &ItemId) -> PointId {
    match id {
        ItemId::Num(n) => PointId::from(*n),
        ItemId::Uuid(uuid) => PointId::from(uuid.to_string()),
    }
}

fn from_point_id(point_id: &PointId) -> VectorSearchResult<ItemId> {
    match &point_id.point_id_options {
        Some(qdrant::point_id::PointIdOptions::Num(n)) => Ok(ItemId::Num(*n)),
        Some(qdrant::point_id::PointIdOptions::Uuid(raw)) => Uuid::parse_str(raw)
            .map(ItemId::Uuid)
            .map_err(|e| VectorSearchError::IndexOperation(format!("Invalid point UUID: {}", e))),
        None => Err(VectorSearchError::IndexOperation(
            "Missing point ID".to_string(),
        )),
    }
}

fn payload_to_qdrant(payload: Payload) -> HashMap<String, QdrantValue> {
    payload
        .into_iter()
        .filter_map(|(key, value)| json_to_qdrant_value(value).map(|v| (key, v)))
        .collect()
}

fn qdrant_to_payload(payload: HashMap<String, QdrantValue>) -> Payload {
    payload
        .into_iter()
        .filter_map(|(key, value)| qdrant_value_to_json(value).map(|v| (key, v)))
        .collect()
}

fn json_to_qdrant_value(val: serde_json::Value) -> Option<QdrantValue> {
    match val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(QdrantValue::from(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(QdrantValue::from(i))
            } else {
                n.as_f64().map(QdrantValue::from)
            }
        }
        serde_json::Value::String(s) => Some(QdrantValue::from(s)),
        // Nested payloads are stored as their JSON text
        other => Some(QdrantValue::from(other.to_string())),
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::NullValue(_)) => Some(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f).map(serde_json::Value::Number),
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        _ => None,
    }
}

/// Translate a filter expression into Qdrant's must/should/must_not form
fn to_qdrant_filter(filter: &SearchFilter) -> Filter {
    match filter {
        SearchFilter::Match { key, value } => {
            let condition = match value {
                MatchValue::Bool(b) => Condition::matches(key.as_str(), *b),
                MatchValue::Integer(i) => Condition::matches(key.as_str(), *i),
                MatchValue::Text(s) => Condition::matches(key.as_str(), s.clone()),
            };
            Filter::must([condition])
        }
        SearchFilter::Range {
            key,
            gt,
            gte,
            lt,
            lte,
        } => Filter::must([Condition::range(
            key.as_str(),
            Range {
                gt: *gt,
                gte: *gte,
                lt: *lt,
                lte: *lte,
            },
        )]),
        SearchFilter::All(filters) => Filter::must(nested(filters)),
        SearchFilter::Any(filters) => Filter::should(nested(filters)),
        SearchFilter::Not(inner) => Filter::must_not([Condition::from(to_qdrant_filter(inner))]),
    }
}

fn nested(filters: &[SearchFilter]) -> Vec<Condition> {
    filters
        .iter()
        .map(|f| Condition::from(to_qdrant_filter(f)))
        .collect()
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn collection_exists(&self, name: &str) -> VectorSearchResult<bool> {
        Ok(self.client.collection_exists(name).await?)
    }

    #[instrument(skip(self), fields(collection = %name))]
    async fn create_collection(&self, name: &str, config: VectorConfig) -> VectorSearchResult<()> {
        let builder = CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
            config.dimension,
            Self::to_qdrant_distance(config.distance),
        ));

        self.client.create_collection(builder).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %name))]
    async fn delete_collection(&self, name: &str) -> VectorSearchResult<()> {
        self.client.delete_collection(name).await?;
        Ok(())
    }

    #[instrument(skip(self, points), fields(collection = %name, points = points.len()))]
    async fn upsert_points(&self, name: &str, points: Vec<IndexPoint>) -> VectorSearchResult<()> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(to_point_id(&p.id), p.vector, payload_to_qdrant(p.payload)))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
            .await?;
        Ok(())
    }

    async fn search(&self, name: &str, query: SearchQuery) -> VectorSearchResult<Vec<SearchHit>> {
        let mut builder =
            SearchPointsBuilder::new(name, query.vector, query.limit).with_payload(true);

        if let Some(filter) = &query.filter {
            builder = builder.filter(to_qdrant_filter(filter));
        }

        let response = self.client.search_points(builder).await?;

        response
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .as_ref()
                    .map(from_point_id)
                    .transpose()?
                    .ok_or_else(|| {
                        VectorSearchError::IndexOperation("Missing point ID".to_string())
                    })?;

                Ok(SearchHit {
                    id,
                    score: point.score,
                    payload: qdrant_to_payload(point.payload),
                })
            })
            .collect()
    }
}
