use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{PostWriteHook, WriteOp};
use crate::query::{Condition, QuerySpec};
use crate::store::{Document, Store, StoreError};

/// Keeps a tour's `ratings_quantity` and `ratings_average` in step with its
/// reviews. With no reviews left the aggregates fall back to the catalog
/// defaults (0 reviews, 3.0 average).
pub struct RecomputeTourRatings;

const DEFAULT_AVERAGE: f64 = 3.0;

#[async_trait]
impl PostWriteHook for RecomputeTourRatings {
    fn name(&self) -> &'static str {
        "recompute_tour_ratings"
    }

    async fn run(&self, store: &dyn Store, _op: WriteOp, doc: &Document) -> Result<(), StoreError> {
        let Some(Value::String(tour_id)) = doc.get("tour") else {
            return Ok(());
        };

        let reviews = store
            .find(
                "reviews",
                &QuerySpec::filter_only(vec![Condition::eq(
                    "tour",
                    Value::String(tour_id.clone()),
                )]),
            )
            .await?;

        let ratings: Vec<f64> = reviews
            .iter()
            .filter_map(|review| review.get("rating").and_then(Value::as_f64))
            .collect();
        let quantity = ratings.len();
        let average = if ratings.is_empty() {
            DEFAULT_AVERAGE
        } else {
            let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        let tour_uuid: Uuid = tour_id
            .parse()
            .map_err(|_| StoreError::Backend(format!("Invalid tour id in review: {tour_id}")))?;
        let Some(mut tour) = store.find_by_id("tours", tour_uuid).await? else {
            // Review outlived its tour; nothing to recompute
            return Ok(());
        };

        tour.insert("ratings_quantity".to_string(), json!(quantity));
        tour.insert("ratings_average".to_string(), json!(average));
        store.update_by_id("tours", tour_uuid, tour).await?;
        Ok(())
    }
}
