//! Event-driven inventory triggers.
//!
//! Two checks keep the item pool matched to demand: a global per-bucket
//! count fired after every serve and answer, and a per-user unseen count
//! fired after every answer. Both enqueue work through the queue's
//! conditional insert, so concurrent triggers collapse to one job. The
//! spawned checks never propagate errors to the triggering request.

use crate::config::AdaptiveConfig;
use crate::error::StorageError;
use crate::model::{Difficulty, Section, SubjectArea, Subtype};
use crate::storage::queue::NewQueueItem;
use crate::storage::{self, DbPool};

/// The five fixed inventory buckets over the difficulty scale.
pub const BUCKETS: [(i64, i64); 5] = [(0, 20), (21, 40), (41, 60), (61, 80), (81, 100)];

/// How many questions each enqueued job asks for.
const JOB_SIZE: u32 = 6;

/// Comparative passages should be at least this share of the pool.
const COMPARATIVE_MIN_RATIO: f64 = 0.25;

/// Passages needed before the comparative ratio is meaningful.
const COMPARATIVE_MIN_TOTAL: i64 = 4;

/// Trigger thresholds, derived from [`AdaptiveConfig`].
#[derive(Debug, Clone)]
pub struct InventorySettings {
    pub enabled_section_a: bool,
    pub enabled_section_b: bool,
    pub min_unseen: i64,
    pub bucket_low_water: i64,
    pub passage_low_water: i64,
}

impl InventorySettings {
    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self {
            enabled_section_a: config.auto_gen_enabled_section_a,
            enabled_section_b: config.auto_gen_enabled_section_b,
            min_unseen: i64::from(config.auto_gen_min_unseen),
            bucket_low_water: i64::from(config.bucket_low_water),
            passage_low_water: i64::from(config.passage_low_water),
        }
    }

    fn enabled_for(&self, section: Section) -> bool {
        match section {
            Section::LogicalReasoning => self.enabled_section_a,
            Section::ReadingComprehension => self.enabled_section_b,
        }
    }
}

/// Global bucket check: for every fixed bucket overlapping the target
/// window, enqueue a job when the bucket is short. Returns the number of
/// jobs enqueued.
pub async fn check_buckets(
    pool: &DbPool,
    settings: &InventorySettings,
    section: Section,
    subtype: Option<Subtype>,
    window: (i64, i64),
) -> Result<u32, StorageError> {
    if !settings.enabled_for(section) {
        return Ok(0);
    }

    let mut enqueued = 0;
    for (bucket_min, bucket_max) in BUCKETS {
        if bucket_max < window.0 || bucket_min > window.1 {
            continue;
        }

        let short = match section {
            Section::LogicalReasoning => {
                storage::items::count_servable_in_bucket(
                    pool, section, subtype, bucket_min, bucket_max,
                )
                .await?
                    < settings.bucket_low_water
            }
            Section::ReadingComprehension => {
                storage::passages::count_distinct_in_bucket(pool, bucket_min, bucket_max).await?
                    < settings.passage_low_water
            }
        };
        if !short {
            continue;
        }

        let midpoint = (bucket_min + bucket_max) / 2;
        let job = match section {
            Section::LogicalReasoning => NewQueueItem {
                section,
                subtype: subtype.map(|s| s.as_str().to_string()),
                bucket_min,
                bucket_max,
                target_difficulty: Difficulty::for_target(midpoint),
                questions_needed: JOB_SIZE,
                subject_area: None,
                is_comparative: false,
            },
            Section::ReadingComprehension => {
                rc_job(pool, bucket_min, bucket_max, midpoint).await?
            }
        };

        if storage::queue::try_enqueue(pool, &job).await? {
            tracing::info!(
                section = section.as_str(),
                subtype = job.subtype.as_deref(),
                bucket_min,
                bucket_max,
                "Bucket short, generation job enqueued"
            );
            enqueued += 1;
        }
    }
    Ok(enqueued)
}

/// Per-user unseen check: when the user is running out of unseen items for
/// a (section, subtype), enqueue a job centered on their ability. Returns
/// whether a job was enqueued.
pub async fn check_user_unseen(
    pool: &DbPool,
    settings: &InventorySettings,
    user_id: &str,
    section: Section,
    subtype: Subtype,
    ability: i64,
) -> Result<bool, StorageError> {
    if !settings.enabled_for(section) {
        return Ok(false);
    }

    let unseen = storage::items::count_unseen_servable(pool, user_id, section, subtype).await?;
    if unseen >= settings.min_unseen {
        return Ok(false);
    }

    // Slider 50 centers the job on the user's ability.
    let target = crate::ability::target_difficulty(ability, 50);
    let (bucket_min, bucket_max) = bucket_for(target);

    let job = match section {
        Section::LogicalReasoning => NewQueueItem {
            section,
            subtype: Some(subtype.as_str().to_string()),
            bucket_min,
            bucket_max,
            target_difficulty: Difficulty::for_target(target),
            questions_needed: JOB_SIZE,
            subject_area: None,
            is_comparative: false,
        },
        Section::ReadingComprehension => {
            let mut job = rc_job(pool, bucket_min, bucket_max, target).await?;
            job.subtype = Some(subtype.as_str().to_string());
            job
        }
    };

    let inserted = storage::queue::try_enqueue(pool, &job).await?;
    if inserted {
        tracing::info!(
            user_id = %user_id,
            section = section.as_str(),
            subtype = subtype.as_str(),
            unseen,
            "User low on unseen items, generation job enqueued"
        );
    }
    Ok(inserted)
}

/// Build a reading-comprehension job: rotate the subject area round-robin
/// from the most recent passage, and request a comparative pair when the
/// stored ratio has fallen behind.
async fn rc_job(
    pool: &DbPool,
    bucket_min: i64,
    bucket_max: i64,
    target: i64,
) -> Result<NewQueueItem, StorageError> {
    let subject_area = storage::passages::most_recent_subject_area(pool)
        .await?
        .map_or(SubjectArea::ROTATION[0], SubjectArea::next);

    let (total, comparative) = storage::passages::comparative_stats(pool).await?;
    let is_comparative = total >= COMPARATIVE_MIN_TOTAL
        && (comparative as f64) < (total as f64) * COMPARATIVE_MIN_RATIO;

    Ok(NewQueueItem {
        section: Section::ReadingComprehension,
        subtype: None,
        bucket_min,
        bucket_max,
        target_difficulty: Difficulty::for_target(target),
        questions_needed: JOB_SIZE,
        subject_area: Some(subject_area),
        is_comparative,
    })
}

/// The fixed bucket containing a target score.
fn bucket_for(target: i64) -> (i64, i64) {
    BUCKETS
        .into_iter()
        .find(|(min, max)| (*min..=*max).contains(&target))
        .unwrap_or(BUCKETS[2])
}

/// Fire-and-forget bucket check. Errors are logged and swallowed; the
/// task detaches from the triggering request and survives its cancellation.
pub fn spawn_bucket_check(
    pool: DbPool,
    settings: InventorySettings,
    section: Section,
    subtype: Option<Subtype>,
    window: (i64, i64),
) {
    tokio::spawn(async move {
        if let Err(e) = check_buckets(&pool, &settings, section, subtype, window).await {
            tracing::warn!(error = %e, "Bucket inventory check failed");
        }
    });
}

/// Fire-and-forget per-user unseen check.
pub fn spawn_user_check(
    pool: DbPool,
    settings: InventorySettings,
    user_id: String,
    section: Section,
    subtype: Subtype,
    ability: i64,
) {
    tokio::spawn(async move {
        if let Err(e) =
            check_user_unseen(&pool, &settings, &user_id, section, subtype, ability).await
        {
            tracing::warn!(error = %e, "Per-user inventory check failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LrSubtype, ValidationStatus};
    use crate::storage::init_test_db;
    use crate::storage::items::test_support::{lr, seed_item, seed_passage_with_items};

    fn settings() -> InventorySettings {
        InventorySettings::from_config(&AdaptiveConfig::default())
    }

    #[tokio::test]
    async fn empty_buckets_enqueue_one_job_each() {
        let pool = init_test_db().await.expect("init db");
        let sub = lr(LrSubtype::Weaken);

        // Window [35, 65] overlaps buckets (21,40), (41,60), (61,80).
        let enqueued = check_buckets(
            &pool,
            &settings(),
            Section::LogicalReasoning,
            Some(sub),
            (35, 65),
        )
        .await
        .expect("check");
        assert_eq!(enqueued, 3);

        let jobs = storage::queue::fetch_pending(&pool, 10).await.expect("fetch");
        assert_eq!(jobs.len(), 3);
        // Band follows each bucket's midpoint.
        assert_eq!(jobs[0].target_difficulty, Difficulty::Easy);
        assert_eq!(jobs[1].target_difficulty, Difficulty::Medium);
        assert_eq!(jobs[2].target_difficulty, Difficulty::Hard);
    }

    #[tokio::test]
    async fn repeated_checks_are_idempotent() {
        let pool = init_test_db().await.expect("init db");
        let sub = lr(LrSubtype::Flaw);

        let first = check_buckets(&pool, &settings(), Section::LogicalReasoning, Some(sub), (41, 60))
            .await
            .expect("first");
        let second =
            check_buckets(&pool, &settings(), Section::LogicalReasoning, Some(sub), (41, 60))
                .await
                .expect("second");

        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(storage::queue::fetch_pending(&pool, 10).await.expect("fetch").len(), 1);
    }

    #[tokio::test]
    async fn stocked_bucket_does_not_enqueue() {
        let pool = init_test_db().await.expect("init db");
        let sub = lr(LrSubtype::Strengthen);

        for _ in 0..6 {
            seed_item(&pool, Section::LogicalReasoning, sub, 50, ValidationStatus::Passed, None)
                .await;
        }

        let enqueued =
            check_buckets(&pool, &settings(), Section::LogicalReasoning, Some(sub), (45, 55))
                .await
                .expect("check");
        assert_eq!(enqueued, 0);
    }

    #[tokio::test]
    async fn disabled_section_is_a_no_op() {
        let pool = init_test_db().await.expect("init db");
        let mut s = settings();
        s.enabled_section_a = false;

        let enqueued =
            check_buckets(&pool, &s, Section::LogicalReasoning, Some(lr(LrSubtype::Weaken)), (0, 100))
                .await
                .expect("check");
        assert_eq!(enqueued, 0);
    }

    #[tokio::test]
    async fn user_unseen_below_threshold_enqueues_once() {
        let pool = init_test_db().await.expect("init db");
        let sub = lr(LrSubtype::Method);

        // Two unseen items: below the default threshold of 4.
        for _ in 0..2 {
            seed_item(&pool, Section::LogicalReasoning, sub, 50, ValidationStatus::Passed, None)
                .await;
        }

        let first = check_user_unseen(&pool, &settings(), "u1", Section::LogicalReasoning, sub, 50)
            .await
            .expect("first");
        let second = check_user_unseen(&pool, &settings(), "u1", Section::LogicalReasoning, sub, 50)
            .await
            .expect("second");

        assert!(first);
        assert!(!second, "duplicate job must collapse via the conditional insert");

        let jobs = storage::queue::fetch_pending(&pool, 10).await.expect("fetch");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].subtype.as_deref(), Some("method"));
        assert_eq!((jobs[0].bucket_min, jobs[0].bucket_max), (41, 60));
    }

    #[tokio::test]
    async fn user_with_enough_unseen_is_a_no_op() {
        let pool = init_test_db().await.expect("init db");
        let sub = lr(LrSubtype::Principle);

        for _ in 0..4 {
            seed_item(&pool, Section::LogicalReasoning, sub, 50, ValidationStatus::Passed, None)
                .await;
        }

        let enqueued =
            check_user_unseen(&pool, &settings(), "u1", Section::LogicalReasoning, sub, 50)
                .await
                .expect("check");
        assert!(!enqueued);
    }

    #[tokio::test]
    async fn rc_bucket_jobs_rotate_subject_area() {
        let pool = init_test_db().await.expect("init db");
        // Most recent passage is law; three passages short of the low water
        // mark in every bucket.
        seed_passage_with_items(&pool, 3, 50).await;

        let enqueued = check_buckets(
            &pool,
            &settings(),
            Section::ReadingComprehension,
            None,
            (45, 55),
        )
        .await
        .expect("check");
        assert_eq!(enqueued, 1);

        let jobs = storage::queue::fetch_pending(&pool, 10).await.expect("fetch");
        assert_eq!(jobs[0].subject_area, Some(SubjectArea::NaturalScience));
        // Fewer than four passages: comparative flag stays off.
        assert!(!jobs[0].is_comparative);
    }

    #[tokio::test]
    async fn rc_comparative_flag_set_when_ratio_low() {
        let pool = init_test_db().await.expect("init db");
        for _ in 0..4 {
            seed_passage_with_items(&pool, 3, 90).await;
        }

        // Bucket (41,60) is empty; four non-comparative passages exist.
        let enqueued = check_buckets(
            &pool,
            &settings(),
            Section::ReadingComprehension,
            None,
            (45, 55),
        )
        .await
        .expect("check");
        assert_eq!(enqueued, 1);

        let jobs = storage::queue::fetch_pending(&pool, 10).await.expect("fetch");
        assert!(jobs[0].is_comparative);
    }

    #[test]
    fn bucket_for_covers_the_scale() {
        assert_eq!(bucket_for(0), (0, 20));
        assert_eq!(bucket_for(20), (0, 20));
        assert_eq!(bucket_for(21), (21, 40));
        assert_eq!(bucket_for(50), (41, 60));
        assert_eq!(bucket_for(100), (81, 100));
    }
}
