//! Serde default functions for configuration fields.

pub(super) fn default_db_path() -> String {
    "~/.lexprep/lexprep.db".to_string()
}

pub(super) fn default_provider() -> String {
    "anthropic".to_string()
}

pub(super) fn default_generation_model() -> String {
    "claude-sonnet-4-5-20250514".to_string()
}

pub(super) fn default_validation_model() -> String {
    "claude-sonnet-4-5-20250514".to_string()
}

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_batch_size() -> u32 {
    6
}

pub(super) fn default_daily_cost_limit_cents() -> u32 {
    500
}

pub(super) fn default_slider() -> u8 {
    50
}

pub(super) fn default_auto_gen_min_unseen() -> u32 {
    4
}

pub(super) fn default_bucket_low_water() -> u32 {
    6
}

pub(super) fn default_passage_low_water() -> u32 {
    3
}

pub(super) fn default_worker_interval_secs() -> u64 {
    30
}

pub(super) fn default_worker_batch_limit() -> u32 {
    5
}
