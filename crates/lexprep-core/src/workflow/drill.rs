//! Drill serving: selection, answer stripping, serve counters, and the
//! post-serve inventory trigger.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::ability::WINDOW_NARROW;
use crate::error::DrillError;
use crate::model::{DrillItem, ItemWithChoices, Passage, Section, Subtype};
use crate::scheduler::inventory::{self, InventorySettings};
use crate::selector::AdaptiveSelector;
use crate::storage::{self, DbPool};

/// Serves drills with answers stripped.
#[derive(Clone)]
pub struct DrillService {
    pool: DbPool,
    selector: AdaptiveSelector,
    inventory: InventorySettings,
}

impl DrillService {
    pub fn new(pool: DbPool, selector: AdaptiveSelector, inventory: InventorySettings) -> Self {
        Self {
            pool,
            selector,
            inventory,
        }
    }

    /// Mixed drill across randomly sampled subtypes.
    pub async fn quick_drill(
        &self,
        user_id: &str,
        section: Section,
        slider: Option<i64>,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<DrillItem>, DrillError> {
        let drill = self
            .selector
            .quick_drill(user_id, section, slider, count, cancel)
            .await?;
        let dto = self.finish_serve(&drill.items, section, None, drill.target_difficulty).await?;
        Ok(dto)
    }

    /// Focused drill on one subtype.
    pub async fn focused_drill(
        &self,
        user_id: &str,
        subtype: Subtype,
        slider: Option<i64>,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<DrillItem>, DrillError> {
        let drill = self
            .selector
            .focused_drill(user_id, subtype, slider, count, cancel)
            .await?;
        let dto = self
            .finish_serve(
                &drill.items,
                subtype.section(),
                Some(subtype),
                drill.target_difficulty,
            )
            .await?;
        Ok(dto)
    }

    /// Strip answers, bump serve counters, and fire the bucket trigger.
    async fn finish_serve(
        &self,
        items: &[ItemWithChoices],
        section: Section,
        subtype: Option<Subtype>,
        target: i64,
    ) -> Result<Vec<DrillItem>, DrillError> {
        let dto = self.strip(items).await?;

        for item in items {
            if let Err(e) = storage::items::increment_served(&self.pool, item.item.id).await {
                tracing::warn!(item_id = item.item.id, error = %e, "Serve counter update failed");
            }
        }

        let window = (
            (target - WINDOW_NARROW).max(0),
            (target + WINDOW_NARROW).min(100),
        );
        inventory::spawn_bucket_check(
            self.pool.clone(),
            self.inventory.clone(),
            section,
            subtype,
            window,
        );

        Ok(dto)
    }

    /// Build wire DTOs, attaching each item's passage (fetched once).
    async fn strip(&self, items: &[ItemWithChoices]) -> Result<Vec<DrillItem>, DrillError> {
        let mut passages: HashMap<i64, Passage> = HashMap::new();
        for item in items {
            if let Some(passage_id) = item.item.passage_id {
                if !passages.contains_key(&passage_id) {
                    let passage = storage::passages::get_passage(&self.pool, passage_id).await?;
                    passages.insert(passage_id, passage);
                }
            }
        }

        Ok(items
            .iter()
            .map(|item| {
                let passage = item.item.passage_id.and_then(|id| passages.get(&id));
                DrillItem::from_item(item, passage)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdaptiveConfig;
    use crate::generation::{GenerationPipeline, PipelineSettings};
    use crate::llm::mock::MockClient;
    use crate::model::{LrSubtype, ValidationStatus};
    use crate::storage::init_test_db;
    use crate::storage::items::test_support::{lr, seed_item, seed_passage_with_items};
    use std::sync::Arc;

    async fn service(pool: &DbPool) -> DrillService {
        let settings = PipelineSettings {
            validation_enabled: false,
            adversarial_enabled: false,
            daily_cost_limit_cents: 1000,
            generation_model: "mock".to_string(),
            validation_model: "mock".to_string(),
        };
        let pipeline =
            GenerationPipeline::new(pool.clone(), Arc::new(MockClient::new()), settings);
        let selector = AdaptiveSelector::new(pool.clone(), pipeline, 50);
        DrillService::new(
            pool.clone(),
            selector,
            InventorySettings::from_config(&AdaptiveConfig::default()),
        )
    }

    #[tokio::test]
    async fn served_items_carry_no_answer_key() {
        let pool = init_test_db().await.expect("init db");
        let sub = lr(LrSubtype::Weaken);
        seed_item(&pool, Section::LogicalReasoning, sub, 50, ValidationStatus::Passed, None).await;

        let items = service(&pool)
            .await
            .focused_drill("u1", sub, None, 1, &CancellationToken::new())
            .await
            .expect("drill");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].choices.len(), 5);
        let json = serde_json::to_string(&items[0]).expect("serialize");
        assert!(!json.contains("is_correct"));
        assert!(!json.contains("explanation"));
        assert!(!json.contains("correct_choice_id"));
    }

    #[tokio::test]
    async fn serving_increments_served_counter() {
        let pool = init_test_db().await.expect("init db");
        let sub = lr(LrSubtype::Flaw);
        let id =
            seed_item(&pool, Section::LogicalReasoning, sub, 50, ValidationStatus::Passed, None)
                .await;

        service(&pool)
            .await
            .focused_drill("u1", sub, None, 1, &CancellationToken::new())
            .await
            .expect("drill");

        let item = storage::items::get_item_with_choices(&pool, id).await.expect("item").item;
        assert_eq!(item.times_served, 1);
    }

    #[tokio::test]
    async fn rc_drill_attaches_the_passage() {
        let pool = init_test_db().await.expect("init db");
        seed_passage_with_items(&pool, 4, 50).await;

        let items = service(&pool)
            .await
            .quick_drill(
                "u1",
                Section::ReadingComprehension,
                None,
                3,
                &CancellationToken::new(),
            )
            .await
            .expect("drill");

        assert!(!items.is_empty());
        for item in &items {
            let passage = item.passage.as_ref().expect("passage attached");
            assert!(!passage.content.is_empty());
            assert!(item.stimulus.is_empty());
        }
    }

    #[tokio::test]
    async fn empty_inventory_without_generation_is_an_error() {
        let pool = init_test_db().await.expect("init db");
        // Exhaust the budget so the fallback generation refuses.
        storage::llm_usage::insert_usage(&pool, "generate", "anthropic", "m", 0, 0, 100.0)
            .await
            .expect("seed spend");

        let err = service(&pool)
            .await
            .focused_drill("u1", lr(LrSubtype::Weaken), None, 3, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DrillError::Empty));
    }
}
