use serde::{Deserialize, Serialize};

/// Parsed elements extracted from a movie rip file name.
///
/// Every field is optional: the parser keeps whatever it could place and
/// leaves the rest unset. A name it cannot split at all yields only a title
/// (or nothing, for empty input).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRip {
    /// Movie title with separators converted to spaces, original casing kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Release year as a 4-digit string (e.g. "1978").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Rip quality marker (e.g. "1080p", "DVDRip").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rip_quality: Option<String>,
    /// Encode details between the quality marker and the group (e.g.
    /// "BluRay.x264.DTS-HD.MA.5.1").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rip_info: Option<String>,
    /// Release group, kept verbatim including bracket suffixes
    /// (e.g. "GHOULS[rarbg]").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rip_group: Option<String>,
}
