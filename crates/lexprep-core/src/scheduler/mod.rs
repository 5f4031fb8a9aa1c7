//! Background generation scheduler.
//!
//! A single long-running worker ticks on a fixed interval, claims up to a
//! handful of pending queue jobs by flipping them to `generating`, and runs
//! each through the generation pipeline. The worker is not transactional
//! with the pipeline: a crash mid-batch leaves the job `generating`, to be
//! reclaimed by an admin via `queue::reset_generating`.

pub mod inventory;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::error::StorageError;
use crate::generation::GenerationPipeline;
use crate::model::{GenerationRequest, QueueItem, QueueStatus, Subtype};
use crate::storage::{self, DbPool};

/// Counts from one worker tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickSummary {
    pub completed: u32,
    pub failed: u32,
}

/// The queue-draining worker.
pub struct GenerationWorker {
    pool: DbPool,
    pipeline: GenerationPipeline,
    interval: Duration,
    batch_limit: i64,
}

impl GenerationWorker {
    pub fn new(pool: DbPool, pipeline: GenerationPipeline, config: &SchedulerConfig) -> Self {
        Self {
            pool,
            pipeline,
            interval: Duration::from_secs(config.worker_interval_secs),
            batch_limit: i64::from(config.worker_batch_limit),
        }
    }

    /// Run the worker until cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            batch_limit = self.batch_limit,
            "Generation worker started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }

            match self.tick(&cancel).await {
                Ok(summary) if summary.completed + summary.failed > 0 => {
                    tracing::info!(
                        completed = summary.completed,
                        failed = summary.failed,
                        "Worker tick drained queue items"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Worker tick failed, will retry next interval");
                }
            }
        }

        tracing::info!("Generation worker stopped");
    }

    /// Drain one batch of pending jobs.
    pub async fn tick(&self, cancel: &CancellationToken) -> Result<TickSummary, StorageError> {
        let jobs = storage::queue::fetch_pending(&self.pool, self.batch_limit).await?;
        let mut summary = TickSummary::default();

        for job in jobs {
            if cancel.is_cancelled() {
                break;
            }

            storage::queue::set_status(&self.pool, job.id, QueueStatus::Generating, None).await?;

            let request = request_for(&job);
            match self.pipeline.run(&request, cancel).await {
                Ok(batch) => {
                    storage::queue::set_status(&self.pool, job.id, QueueStatus::Completed, None)
                        .await?;
                    tracing::info!(
                        queue_id = job.id,
                        batch_id = batch.batch_id,
                        passed = batch.passed,
                        "Queue job completed"
                    );
                    summary.completed += 1;
                }
                Err(crate::error::GenerationError::Cancelled) => {
                    // Shutdown mid-batch: leave the job claimed, exactly as
                    // a crash would, for admin reclaim.
                    tracing::info!(queue_id = job.id, "Worker cancelled mid-job");
                    break;
                }
                Err(e) => {
                    storage::queue::set_status(
                        &self.pool,
                        job.id,
                        QueueStatus::Failed,
                        Some(&e.to_string()),
                    )
                    .await?;
                    tracing::warn!(queue_id = job.id, error = %e, "Queue job failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Translate a queue row into a pipeline request.
fn request_for(job: &QueueItem) -> GenerationRequest {
    GenerationRequest {
        section: job.section,
        subtype: job
            .subtype
            .as_deref()
            .and_then(|s| Subtype::parse(job.section, s)),
        difficulty: job.target_difficulty,
        count: job.questions_needed.max(1) as u32,
        subject_area: job.subject_area,
        is_comparative: job.is_comparative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::PipelineSettings;
    use crate::llm::mock::MockClient;
    use crate::model::{Difficulty, Section};
    use crate::storage::init_test_db;
    use crate::storage::queue::NewQueueItem;
    use std::sync::Arc;

    fn worker(pool: &DbPool, daily_cost_limit_cents: u32) -> GenerationWorker {
        let settings = PipelineSettings {
            validation_enabled: false,
            adversarial_enabled: false,
            daily_cost_limit_cents,
            generation_model: "mock".to_string(),
            validation_model: "mock".to_string(),
        };
        let pipeline =
            GenerationPipeline::new(pool.clone(), Arc::new(MockClient::new()), settings);
        GenerationWorker::new(pool.clone(), pipeline, &SchedulerConfig::default())
    }

    fn job(subtype: Option<&str>) -> NewQueueItem {
        NewQueueItem {
            section: Section::LogicalReasoning,
            subtype: subtype.map(str::to_string),
            bucket_min: 41,
            bucket_max: 60,
            target_difficulty: Difficulty::Medium,
            questions_needed: 4,
            subject_area: None,
            is_comparative: false,
        }
    }

    #[tokio::test]
    async fn tick_completes_pending_jobs_and_inserts_items() {
        let pool = init_test_db().await.expect("init db");
        assert!(storage::queue::try_enqueue(&pool, &job(Some("weaken"))).await.expect("enqueue"));

        let summary = worker(&pool, 1000)
            .tick(&CancellationToken::new())
            .await
            .expect("tick");
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 0);

        // The queue key is free again and items exist in the bucket.
        assert!(storage::queue::fetch_pending(&pool, 10).await.expect("fetch").is_empty());
        let count = storage::items::count_servable_in_bucket(
            &pool,
            Section::LogicalReasoning,
            None,
            0,
            100,
        )
        .await
        .expect("count");
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn tick_marks_failed_jobs_with_error() {
        let pool = init_test_db().await.expect("init db");
        // Zero budget: the pipeline refuses immediately.
        storage::llm_usage::insert_usage(&pool, "generate", "anthropic", "m", 0, 0, 1.0)
            .await
            .expect("seed spend");
        assert!(storage::queue::try_enqueue(&pool, &job(Some("flaw"))).await.expect("enqueue"));

        let summary = worker(&pool, 1)
            .tick(&CancellationToken::new())
            .await
            .expect("tick");
        assert_eq!(summary.failed, 1);

        let row: (String, Option<String>) =
            sqlx::query_as("SELECT status, error_message FROM generation_queue LIMIT 1")
                .fetch_one(&pool)
                .await
                .expect("row");
        assert_eq!(row.0, "failed");
        assert!(row.1.expect("error").contains("budget"));
    }

    #[tokio::test]
    async fn tick_with_empty_queue_is_a_no_op() {
        let pool = init_test_db().await.expect("init db");
        let summary = worker(&pool, 1000)
            .tick(&CancellationToken::new())
            .await
            .expect("tick");
        assert_eq!(summary.completed + summary.failed, 0);
    }

    #[tokio::test]
    async fn cancelled_worker_leaves_job_claimed() {
        let pool = init_test_db().await.expect("init db");
        assert!(storage::queue::try_enqueue(&pool, &job(Some("method"))).await.expect("enqueue"));

        let cancel = CancellationToken::new();
        cancel.cancel();
        // Cancelled before the loop body: job remains pending.
        let summary = worker(&pool, 1000).tick(&cancel).await.expect("tick");
        assert_eq!(summary.completed + summary.failed, 0);
        assert_eq!(storage::queue::fetch_pending(&pool, 10).await.expect("fetch").len(), 1);
    }
}
