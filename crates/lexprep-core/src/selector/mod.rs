//! Adaptive drill selection.
//!
//! Both entry points center a ±15 difficulty window on the user's target,
//! prefer unseen items, widen to ±35 on a miss, and as a last resort invoke
//! the generation pipeline once synchronously before retrying. Mixed drills
//! diversify across subtypes; reading-comprehension drills keep a user on
//! one passage.

use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;

use crate::ability::{self, WINDOW_NARROW, WINDOW_WIDE};
use crate::error::DrillError;
use crate::generation::GenerationPipeline;
use crate::model::{
    AbilityScope, Difficulty, GenerationRequest, ItemWithChoices, Section, Subtype,
};
use crate::storage::{self, DbPool};

/// Minimum unseen items a passage must offer for a focused RC drill.
const PASSAGE_MIN_UNSEEN: i64 = 3;

/// A selected drill, before answer stripping.
#[derive(Debug)]
pub struct SelectedDrill {
    /// Items in final (shuffled) serve order.
    pub items: Vec<ItemWithChoices>,
    /// The difficulty target the window was centered on.
    pub target_difficulty: i64,
}

/// Adaptive selector over the shared store, with the generation pipeline
/// as its synchronous fallback.
#[derive(Clone)]
pub struct AdaptiveSelector {
    pool: DbPool,
    pipeline: GenerationPipeline,
    default_slider: i64,
}

impl AdaptiveSelector {
    pub fn new(pool: DbPool, pipeline: GenerationPipeline, default_slider: i64) -> Self {
        Self {
            pool,
            pipeline,
            default_slider,
        }
    }

    /// Mixed ("quick") drill: one item per randomly sampled subtype.
    pub async fn quick_drill(
        &self,
        user_id: &str,
        section: Section,
        slider: Option<i64>,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<SelectedDrill, DrillError> {
        let target = self.resolve_target(user_id, section, None, slider).await?;
        let subtypes = sample_subtypes(section, count);

        let mut items: Vec<ItemWithChoices> = Vec::with_capacity(count);
        let mut pinned_passage: Option<i64> = None;
        let mut generated = false;

        for subtype in subtypes {
            let found = self
                .pick_for_slot(
                    user_id,
                    section,
                    subtype,
                    target,
                    pinned_passage,
                    &items,
                    &mut generated,
                    cancel,
                )
                .await?;

            if let Some(item) = found {
                if section == Section::ReadingComprehension && pinned_passage.is_none() {
                    pinned_passage = item.item.passage_id;
                }
                items.push(item);
            }
        }

        self.finish(items, target)
    }

    /// Focused ("subtype") drill: `count` items of one subtype, or a
    /// passage's worth of items for reading comprehension.
    pub async fn focused_drill(
        &self,
        user_id: &str,
        subtype: Subtype,
        slider: Option<i64>,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<SelectedDrill, DrillError> {
        let section = subtype.section();
        let target = self
            .resolve_target(user_id, section, Some(subtype), slider)
            .await?;

        let items = match section {
            Section::LogicalReasoning => {
                self.focused_reasoning(user_id, subtype, target, count, cancel)
                    .await?
            }
            Section::ReadingComprehension => {
                self.focused_reading(user_id, subtype, target, count, cancel)
                    .await?
            }
        };

        self.finish(items, target)
    }

    // -----------------------------------------------------------------
    // Target resolution
    // -----------------------------------------------------------------

    /// Resolve the difficulty target from the slider (explicit, then saved,
    /// then default) and the most specific ability scope available.
    async fn resolve_target(
        &self,
        user_id: &str,
        section: Section,
        subtype: Option<Subtype>,
        slider: Option<i64>,
    ) -> Result<i64, DrillError> {
        let slider = match slider {
            Some(s) => s.clamp(0, 100),
            None => storage::settings::get_slider(&self.pool, user_id)
                .await?
                .unwrap_or(self.default_slider),
        };

        let ability = self.ability_estimate(user_id, section, subtype).await?;
        Ok(ability::target_difficulty(ability, slider))
    }

    /// Most specific ability on record: subtype scope, then section scope,
    /// then overall, then the default of 50.
    async fn ability_estimate(
        &self,
        user_id: &str,
        section: Section,
        subtype: Option<Subtype>,
    ) -> Result<i64, DrillError> {
        if let Some(subtype) = subtype {
            if let Some(row) =
                storage::ability::get(&self.pool, user_id, AbilityScope::Subtype, subtype.as_str())
                    .await?
            {
                return Ok(row.score);
            }
        }
        if let Some(row) =
            storage::ability::get(&self.pool, user_id, AbilityScope::Section, section.as_str())
                .await?
        {
            return Ok(row.score);
        }
        if let Some(row) =
            storage::ability::get(&self.pool, user_id, AbilityScope::Overall, "overall").await?
        {
            return Ok(row.score);
        }
        Ok(50)
    }

    // -----------------------------------------------------------------
    // Slot selection
    // -----------------------------------------------------------------

    /// Pick one item for a mixed-drill slot: narrow window, wide window,
    /// then one synchronous generation for the whole request.
    #[allow(clippy::too_many_arguments)]
    async fn pick_for_slot(
        &self,
        user_id: &str,
        section: Section,
        subtype: Subtype,
        target: i64,
        pinned_passage: Option<i64>,
        chosen: &[ItemWithChoices],
        generated: &mut bool,
        cancel: &CancellationToken,
    ) -> Result<Option<ItemWithChoices>, DrillError> {
        let limit = (chosen.len() + 1) as i64;

        for half_width in [WINDOW_NARROW, WINDOW_WIDE] {
            let (lo, hi) = window(target, half_width);

            // Same-passage locality for reading comprehension.
            if let Some(passage_id) = pinned_passage {
                let candidates = storage::items::pick_from_passage(
                    &self.pool,
                    user_id,
                    passage_id,
                    lo,
                    hi,
                    limit,
                )
                .await?;
                if let Some(item) = first_unchosen(candidates, chosen) {
                    return Ok(Some(item));
                }
                continue;
            }

            let candidates = storage::items::pick_many(
                &self.pool,
                user_id,
                section,
                Some(subtype),
                lo,
                hi,
                limit,
            )
            .await?;
            if let Some(item) = first_unchosen(candidates, chosen) {
                return Ok(Some(item));
            }
        }

        // Locality exhausted: fall back to any passage for this subtype.
        if pinned_passage.is_some() {
            let (lo, hi) = window(target, WINDOW_WIDE);
            let candidates = storage::items::pick_many(
                &self.pool,
                user_id,
                section,
                Some(subtype),
                lo,
                hi,
                limit,
            )
            .await?;
            if let Some(item) = first_unchosen(candidates, chosen) {
                return Ok(Some(item));
            }
        }

        if !*generated {
            *generated = true;
            self.generate_fallback(section, Some(subtype), target, cancel)
                .await;
            let (lo, hi) = window(target, WINDOW_WIDE);
            let candidates = storage::items::pick_many(
                &self.pool,
                user_id,
                section,
                Some(subtype),
                lo,
                hi,
                limit,
            )
            .await?;
            if let Some(item) = first_unchosen(candidates, chosen) {
                return Ok(Some(item));
            }
        }

        Ok(None)
    }

    async fn focused_reasoning(
        &self,
        user_id: &str,
        subtype: Subtype,
        target: i64,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ItemWithChoices>, DrillError> {
        let section = subtype.section();
        for half_width in [WINDOW_NARROW, WINDOW_WIDE] {
            let (lo, hi) = window(target, half_width);
            let items = storage::items::pick_many(
                &self.pool,
                user_id,
                section,
                Some(subtype),
                lo,
                hi,
                count as i64,
            )
            .await?;
            if items.len() >= count {
                return Ok(items);
            }
        }

        // Inventory miss: one synchronous generation, then one retry.
        self.generate_fallback(section, Some(subtype), target, cancel)
            .await;
        let (lo, hi) = window(target, WINDOW_WIDE);
        Ok(storage::items::pick_many(
            &self.pool,
            user_id,
            section,
            Some(subtype),
            lo,
            hi,
            count as i64,
        )
        .await?)
    }

    async fn focused_reading(
        &self,
        user_id: &str,
        subtype: Subtype,
        target: i64,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ItemWithChoices>, DrillError> {
        if let Some(items) = self.passage_drill(user_id, target, count).await? {
            return Ok(items);
        }

        self.generate_fallback(Section::ReadingComprehension, Some(subtype), target, cancel)
            .await;

        if let Some(items) = self.passage_drill(user_id, target, count).await? {
            return Ok(items);
        }
        Ok(Vec::new())
    }

    /// Find one passage with enough unseen items and return its items.
    async fn passage_drill(
        &self,
        user_id: &str,
        target: i64,
        count: usize,
    ) -> Result<Option<Vec<ItemWithChoices>>, DrillError> {
        for half_width in [WINDOW_NARROW, WINDOW_WIDE] {
            let (lo, hi) = window(target, half_width);
            if let Some(passage_id) = storage::items::passage_with_unseen(
                &self.pool,
                user_id,
                lo,
                hi,
                PASSAGE_MIN_UNSEEN,
            )
            .await?
            {
                let items = storage::items::pick_from_passage(
                    &self.pool,
                    user_id,
                    passage_id,
                    lo,
                    hi,
                    count as i64,
                )
                .await?;
                if !items.is_empty() {
                    return Ok(Some(items));
                }
            }
        }
        Ok(None)
    }

    /// Invoke the generation pipeline once, synchronously. Failures are
    /// logged; the caller retries its query either way.
    async fn generate_fallback(
        &self,
        section: Section,
        subtype: Option<Subtype>,
        target: i64,
        cancel: &CancellationToken,
    ) {
        let difficulty = Difficulty::for_target(target);
        let request = GenerationRequest {
            section,
            subtype,
            difficulty,
            count: 6,
            subject_area: None,
            is_comparative: false,
        };
        tracing::info!(
            section = section.as_str(),
            subtype = subtype.map(Subtype::as_str),
            difficulty = difficulty.as_str(),
            "Inventory miss, generating synchronously"
        );
        if let Err(e) = self.pipeline.run(&request, cancel).await {
            tracing::warn!(error = %e, "Synchronous fallback generation failed");
        }
    }

    /// Shuffle into the final serve order and reject empty drills.
    fn finish(
        &self,
        mut items: Vec<ItemWithChoices>,
        target_difficulty: i64,
    ) -> Result<SelectedDrill, DrillError> {
        if items.is_empty() {
            return Err(DrillError::Empty);
        }
        items.shuffle(&mut rand::thread_rng());
        Ok(SelectedDrill {
            items,
            target_difficulty,
        })
    }
}

/// Clamp a difficulty window around the target.
fn window(target: i64, half_width: i64) -> (i64, i64) {
    ((target - half_width).max(0), (target + half_width).min(100))
}

/// A random sample of subtypes for a mixed drill: distinct while the
/// section has enough, cycling randomly past that.
fn sample_subtypes(section: Section, count: usize) -> Vec<Subtype> {
    let all = Subtype::all_for_section(section);
    let mut rng = rand::thread_rng();
    let mut sample: Vec<Subtype> = all
        .choose_multiple(&mut rng, count.min(all.len()))
        .copied()
        .collect();
    while sample.len() < count {
        sample.push(*all.choose(&mut rng).expect("sections have subtypes"));
    }
    sample
}

/// The first candidate not already in the drill.
fn first_unchosen(
    candidates: Vec<ItemWithChoices>,
    chosen: &[ItemWithChoices],
) -> Option<ItemWithChoices> {
    candidates
        .into_iter()
        .find(|c| !chosen.iter().any(|p| p.item.id == c.item.id))
}
