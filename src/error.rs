//! Error types.
//!
//! Gameplay actions never fail loudly: they return `false` and leave the
//! state untouched. [`Blocked`] is what `Engine::check` hands back so a UI
//! can say *why* an action did nothing.

use thiserror::Error;

use crate::clicker::notify::format_number;

/// Reason an action would be (or was) ignored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Blocked {
    #[error("unknown item `{0}`")]
    UnknownItem(String),

    #[error("need {} roses, have {}", roses(.cost), roses(.available))]
    InsufficientFunds { cost: f64, available: f64 },

    #[error("a pack is already being opened")]
    DrawInProgress,

    #[error("the card pool is empty")]
    EmptyCardPool,

    #[error("need {} roses or {cards} cards", roses(.currency))]
    PrestigeLocked { currency: f64, cards: u32 },

    #[error("frenzy is already running")]
    FrenzyActive,

    #[error("no golden rose to claim")]
    NoGoldenRose,
}

fn roses(amount: &f64) -> String {
    format_number(*amount)
}

/// Persistence failure. Always swallowed by the session; surfaced here so
/// stores can be tested in isolation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("corrupt snapshot: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("snapshot version {saved} is older than the minimum compatible {min}")]
    Incompatible { saved: u32, min: u32 },

    #[error("storage is unavailable")]
    Unavailable,

    #[error("snapshot is {len} bytes, store limit is {limit}")]
    TooLarge { len: usize, limit: usize },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Malformed configuration input.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid card data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate id `{0}`")]
    DuplicateId(String),

    #[error("`{0}` is not a known automation")]
    UnknownAutomation(String),

    #[error("tuning value `{field}` = {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
}
