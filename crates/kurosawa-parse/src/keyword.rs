use phf::phf_map;

/// The category a rip-quality vocabulary entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    /// Vertical-resolution markers ("1080p", "720p").
    Resolution,
    /// Source-media markers ("BluRay", "DVDRip", "WEB-DL").
    Source,
}

/// Compile-time rip-quality vocabulary.
/// All keys are UPPERCASE for case-insensitive matching.
pub static KEYWORDS: phf::Map<&'static str, KeywordKind> = phf_map! {
    // ── Resolutions ──────────────────────────────────────────────
    "2160P" => KeywordKind::Resolution,
    "1440P" => KeywordKind::Resolution,
    "1080P" => KeywordKind::Resolution,
    "1080I" => KeywordKind::Resolution,
    "720P" => KeywordKind::Resolution,
    "576P" => KeywordKind::Resolution,
    "480P" => KeywordKind::Resolution,

    // ── Sources ──────────────────────────────────────────────────
    "BLURAY" => KeywordKind::Source,
    "BLU-RAY" => KeywordKind::Source,
    "BDRIP" => KeywordKind::Source,
    "BRRIP" => KeywordKind::Source,
    "DVDRIP" => KeywordKind::Source,
    "DVDSCR" => KeywordKind::Source,
    "WEB-DL" => KeywordKind::Source,
    "WEBDL" => KeywordKind::Source,
    "WEBRIP" => KeywordKind::Source,
    "HDRIP" => KeywordKind::Source,
    "HDTV" => KeywordKind::Source,
    "SDTV" => KeywordKind::Source,
    "REMUX" => KeywordKind::Source,
};

/// Whether a token belongs to the rip-quality vocabulary.
pub fn is_quality(token: &str) -> bool {
    lookup(token).is_some()
}

/// Look up the vocabulary kind of a token, case-insensitively.
pub fn lookup(token: &str) -> Option<KeywordKind> {
    KEYWORDS.get(token.to_ascii_uppercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("BluRay"), Some(KeywordKind::Source));
        assert_eq!(lookup("bluray"), Some(KeywordKind::Source));
        assert_eq!(lookup("1080p"), Some(KeywordKind::Resolution));
    }

    #[test]
    fn unknown_tokens_are_not_quality() {
        assert!(!is_quality("REMASTERED"));
        assert!(!is_quality("x264"));
        assert!(!is_quality(""));
    }
}
