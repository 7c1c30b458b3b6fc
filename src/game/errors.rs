use thiserror::Error;

/// Errors produced by the game engine and its storage layer.
///
/// Business-rule variants are precondition failures detected before any
/// mutation; they never leave partial state behind. The wrapper variants
/// (`Storage`, `Encoding`, `Io`, `SchemaMismatch`) are the transient
/// class: callers may retry those, never the business ones.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Storage(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Encoding(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Malformed request input (blank name, non-positive price).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No player registered under the given id.
    #[error("player not found: {0}")]
    PlayerNotFound(String),

    /// A referenced catalog/quest/achievement template is missing.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Feeding a pet whose hunger gauge is already full.
    #[error("pet is already satisfied")]
    AlreadySatisfied,

    /// Playing with a pet that lacks the energy for it.
    #[error("pet does not have enough energy to play")]
    InsufficientEnergy,

    /// Healing a pet whose health gauge is already full.
    #[error("pet is already at full health")]
    AlreadyHealthy,

    /// Coin balance too low for a purchase or trade.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// The item is not currently owned by that player.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// No trade offer exists under the given id.
    #[error("offer not found: {0}")]
    OfferNotFound(String),

    /// The offer already left the open state (sold or cancelled).
    #[error("offer already closed: {0}")]
    OfferAlreadyClosed(String),

    /// A buyer attempted to purchase their own offer.
    #[error("cannot buy your own offer")]
    SelfTrade,

    /// Only the original seller may cancel an offer.
    #[error("offer belongs to a different seller")]
    NotOwner,
}

impl GameError {
    /// Stable machine-readable kind, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::Encoding(_) => "encoding",
            Self::Io(_) => "io",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::InvalidRequest(_) => "invalid_request",
            Self::PlayerNotFound(_) => "player_not_found",
            Self::TemplateNotFound(_) => "template_not_found",
            Self::AlreadySatisfied => "already_satisfied",
            Self::InsufficientEnergy => "insufficient_energy",
            Self::AlreadyHealthy => "already_healthy",
            Self::InsufficientFunds => "insufficient_funds",
            Self::ItemNotFound(_) => "item_not_found",
            Self::OfferNotFound(_) => "offer_not_found",
            Self::OfferAlreadyClosed(_) => "offer_already_closed",
            Self::SelfTrade => "self_trade",
            Self::NotOwner => "not_owner",
        }
    }

    /// True for infrastructure failures a caller may reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Encoding(_) | Self::Io(_) | Self::SchemaMismatch { .. }
        )
    }
}
