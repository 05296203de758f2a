use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped enumeration of the warehouse contents.
///
/// The timestamp is both identity and ordering key: no two visits share
/// one, and "closest visit" / "last two visits" operations rely on the
/// total order. A visit is an immutable snapshot; a rip that disappears
/// from the warehouse keeps its historical record and simply stops
/// appearing in later visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Local database id.
    pub id: i64,
    pub visit_date_time: DateTime<Utc>,
}
