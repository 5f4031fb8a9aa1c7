//! Error types for the Lexprep core library.
//!
//! One `thiserror` enum per subsystem boundary, so callers can match on
//! the failure class without digging through strings.

/// Problems loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No config file exists at the requested location.
    #[error("no config file at {path}")]
    NotFound {
        /// Where we looked.
        path: String,
    },

    /// The file exists but is not valid TOML.
    #[error("config is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A field holds a value the backend cannot run with.
    #[error("config field '{field}' rejected: {reason}")]
    Rejected {
        /// The offending field, in `section.key` form.
        field: String,
        /// Why the value was refused.
        reason: String,
    },
}

/// Failures talking to an LLM backend.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The request never produced a response (DNS, TLS, connect, body IO).
    #[error("llm transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("llm backend returned {status}: {detail}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Whatever detail the backend offered.
        detail: String,
    },

    /// The backend asked us to slow down.
    #[error("llm backend throttled us, retry in {retry_after_secs}s")]
    Throttled {
        /// How long the backend wants us to wait.
        retry_after_secs: u64,
    },

    /// The call outlived its stage deadline.
    #[error("llm call exceeded its {seconds}s deadline")]
    DeadlineExceeded {
        /// The deadline that was blown.
        seconds: u64,
    },

    /// The response body did not have the promised shape.
    #[error("llm response malformed: {0}")]
    Malformed(String),

    /// Configuration names no usable backend.
    #[error("llm backend not configured")]
    Unconfigured,

    /// The caller tore the request down mid-flight.
    #[error("llm call cancelled")]
    Cancelled,
}

/// Failures in the SQLite layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The database file could not be opened or the pool built.
    #[error("could not open the database: {source}")]
    Connection {
        /// What sqlx reported.
        #[source]
        source: sqlx::Error,
    },

    /// Applying the embedded schema migrations failed.
    #[error("schema migration failed: {source}")]
    Migration {
        /// What the migrator reported.
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    /// A statement failed mid-flight.
    #[error("query failed: {source}")]
    Query {
        /// What sqlx reported.
        #[source]
        source: sqlx::Error,
    },

    /// A row referenced by id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind (e.g. "item").
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// A stored column held a value outside the domain model.
    #[error("corrupt row in {table}: {message}")]
    CorruptRow {
        /// The table the row came from.
        table: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Errors from drill selection.
#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    /// A storage query failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// No servable items exist for the request, even after fallback
    /// generation.
    #[error("no servable items available for this request")]
    Empty,
}

/// Errors from the question generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The LLM backend failed.
    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    /// Persisting the batch failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The generated batch failed structural validation.
    #[error("batch rejected: {reason}")]
    BatchRejected {
        /// Which structural check failed.
        reason: String,
    },

    /// The daily generation budget is exhausted.
    #[error("daily generation budget exhausted ({spent_cents} of {limit_cents} cents spent)")]
    BudgetExhausted {
        /// Cents spent today.
        spent_cents: u32,
        /// The configured daily limit.
        limit_cents: u32,
    },

    /// The pipeline was cancelled mid-flight.
    #[error("generation cancelled")]
    Cancelled,
}
