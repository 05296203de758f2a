use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KurosawaError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("warehouse directory not found: {0}")]
    WarehouseNotFound(String),

    #[error("no warehouse visit registered yet")]
    NoVisits,

    #[error("visit ordering violation: left visit {left} is not before right visit {right}")]
    VisitOrder {
        left: DateTime<Utc>,
        right: DateTime<Utc>,
    },
}
