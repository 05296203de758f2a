use serde::{Deserialize, Serialize};

use kurosawa_parse::ParsedRip;

/// A single rip file found on the warehouse, identified by file name.
///
/// The parsed fields are derived once at registration and never mutated;
/// a name the parser could not split keeps the record with every parsed
/// field unset. `movie_id` is set exclusively by the linker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRip {
    /// Local database id.
    pub id: i64,
    /// Unique identity of the rip.
    pub file_name: String,
    pub parsed_title: Option<String>,
    /// 4-digit year string, when parsed.
    pub parsed_release_date: Option<String>,
    pub parsed_rip_quality: Option<String>,
    pub parsed_rip_info: Option<String>,
    pub parsed_rip_group: Option<String>,
    /// Linked canonical movie; `None` means unlinked.
    pub movie_id: Option<i64>,
}

impl MovieRip {
    /// Build an unlinked rip from a parsed file name.
    pub fn from_parsed(file_name: &str, parsed: ParsedRip) -> Self {
        Self {
            id: 0,
            file_name: file_name.to_string(),
            parsed_title: parsed.title,
            parsed_release_date: parsed.release_date,
            parsed_rip_quality: parsed.rip_quality,
            parsed_rip_info: parsed.rip_info,
            parsed_rip_group: parsed.rip_group,
            movie_id: None,
        }
    }
}
