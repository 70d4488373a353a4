//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`LumeqError`]
//! via `#[from]` (adapter crates provide their own `From` impls for their
//! local error types).

/// Top-level error shared by services, ports, and adapters.
#[derive(Debug, thiserror::Error)]
pub enum LumeqError {
    /// A domain invariant was violated (malformed abstract command, bad
    /// mapping entry, …). Never retried automatically.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A vendor bridge call failed.
    #[error("vendor error")]
    Vendor(#[from] VendorError),

    /// The backing store failed; handled with backoff-and-retry at the
    /// loop level, never recorded as a command failure.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Brightness values must fall in `1..=100`.
    #[error("brightness out of range: {0}")]
    BrightnessOutOfRange(i64),

    /// `toggle` is a mapping template; the resolver must synthesize a
    /// concrete `turn` or `brightness` command before enqueueing.
    #[error("toggle must be resolved before dispatch")]
    UnresolvedToggle,

    /// A brand string in the store or configuration is not part of the
    /// vocabulary.
    #[error("unknown brand: {0}")]
    UnknownBrand(String),

    /// A status string in the store is not part of the lifecycle.
    #[error("unknown status: {0}")]
    UnknownStatus(String),

    /// A button mapping entry must target exactly one device or one group.
    #[error("button mapping must target exactly one device or group")]
    AmbiguousButtonTarget,
}

/// A referenced record does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Human-readable kind (`"Device"`, `"DeviceGroup"`, …).
    pub entity: &'static str,
    /// The identifier that was looked up.
    pub id: String,
}

/// A vendor bridge call failed.
///
/// Both variants carry a human-readable message that ends up in the queue
/// row's `error_message` column for operator inspection.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum VendorError {
    /// The HTTP exchange itself failed (connect error, timeout, non-success
    /// status).
    #[error("transport error: {0}")]
    Transport(String),

    /// The bridge answered with a success status but embedded an error
    /// envelope in the body.
    #[error("vendor protocol error: {0}")]
    Protocol(String),
}
