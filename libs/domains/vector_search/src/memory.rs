//! In-process vector index.
//!
//! Exact nearest-neighbour search over every stored point. Used by tests and by
//! `INDEX_BACKEND=memory` for demo runs without a Qdrant instance.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::{DistanceMetric, IndexPoint, ItemId, SearchHit, SearchQuery, VectorConfig};
use crate::repository::VectorIndex;

struct StoredCollection {
    config: VectorConfig,
    points: Vec<IndexPoint>,
}

#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, StoredCollection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in `name`, or `None` when the collection does not exist
    pub fn point_count(&self, name: &str) -> Option<usize> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|c| c.points.len())
    }

    /// Snapshot of the points stored in `name`
    pub fn points(&self, name: &str) -> Vec<IndexPoint> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|c| c.points.clone())
            .unwrap_or_default()
    }

    /// Ids stored in `name`, in ascending order
    pub fn ids(&self, name: &str) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.points(name).into_iter().map(|p| p.id).collect();
        ids.sort_by_key(sort_key);
        ids
    }
}

fn score(distance: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        DistanceMetric::DotProduct => dot,
        DistanceMetric::Cosine => {
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        // Negated so that higher is always closer
        DistanceMetric::Euclidean => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

fn not_found(name: &str) -> VectorSearchError {
    VectorSearchError::IndexOperation(format!("Collection '{}' does not exist", name))
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn collection_exists(&self, name: &str) -> VectorSearchResult<bool> {
        Ok(self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name))
    }

    async fn create_collection(&self, name: &str, config: VectorConfig) -> VectorSearchResult<()> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if collections.contains_key(name) {
            return Err(VectorSearchError::IndexOperation(format!(
                "Collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            StoredCollection {
                config,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> VectorSearchResult<()> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        Ok(())
    }

    async fn upsert_points(&self, name: &str, points: Vec<IndexPoint>) -> VectorSearchResult<()> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let collection = collections.get_mut(name).ok_or_else(|| not_found(name))?;

        let dimension = collection.config.dimension as usize;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != dimension) {
            return Err(VectorSearchError::IndexOperation(format!(
                "Point {} has dimension {}, expected {}",
                bad.id,
                bad.vector.len(),
                dimension
            )));
        }

        for point in points {
            match collection.points.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => collection.points.push(point),
            }
        }
        Ok(())
    }

    async fn search(&self, name: &str, query: SearchQuery) -> VectorSearchResult<Vec<SearchHit>> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let collection = collections.get(name).ok_or_else(|| not_found(name))?;

        let mut hits: Vec<SearchHit> = collection
            .points
            .iter()
            .filter(|p| query.filter.as_ref().is_none_or(|f| f.evaluate(&p.payload)))
            .map(|p| SearchHit {
                id: p.id.clone(),
                score: score(collection.config.distance, &query.vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit as usize);
        Ok(hits)
    }
}

/// Sequential ids compare numerically, UUIDs by text
fn sort_key(id: &ItemId) -> (u64, String) {
    match id {
        ItemId::Num(n) => (*n, String::new()),
        ItemId::Uuid(id) => (u64::MAX, id.to_string()),
    }
}
