use std::sync::OnceLock;

use regex::Regex;

use crate::elements::ParsedRip;
use crate::keyword;

/// Characters that separate segments of a rip name. Hyphens are not
/// separators: they carry meaning for the info/group split and appear
/// inside tokens like "WEB-DL".
const SEPARATORS: &[char] = &['.', '_', ' ', '\t'];

/// A release-year token: 4 digits in 1900–2099, optionally parenthesized.
fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(?((?:19|20)\d{2})\)?$").expect("valid year regex"))
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

/// Split the input into separator-delimited tokens with byte offsets.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in input.char_indices() {
        if SEPARATORS.contains(&c) {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: &input[s..i],
                    start: s,
                    end: i,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &input[s..],
            start: s,
            end: input.len(),
        });
    }
    tokens
}

/// Find the first token usable as the title/year split point.
///
/// The year must not be the first token (a title is never empty) and must
/// not sit right after a rip-quality marker; candidates failing either
/// check are skipped and the scan continues rightward.
fn locate_year(tokens: &[Token<'_>]) -> Option<(usize, String)> {
    for (i, tok) in tokens.iter().enumerate().skip(1) {
        let Some(caps) = year_regex().captures(tok.text) else {
            continue;
        };
        // "\(?" and "\)?" are independently optional; require balance.
        if tok.text.starts_with('(') != tok.text.ends_with(')') {
            continue;
        }
        if keyword::is_quality(tokens[i - 1].text) {
            continue;
        }
        return Some((i, caps[1].to_string()));
    }
    None
}

/// Convert separators to single spaces, preserving the original casing.
fn normalize_title(raw: &str) -> String {
    raw.split(SEPARATORS)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split the leading title from the first plausible release-year token.
///
/// Returns `None` when the input holds no usable year.
pub fn split_title_and_release_date(text: &str) -> Option<(String, String)> {
    let tokens = tokenize(text);
    let (idx, year) = locate_year(&tokens)?;
    Some((normalize_title(&text[..tokens[idx].start]), year))
}

/// Split a rip-info tail into `(rip_info, rip_group)` at the LAST hyphen.
///
/// Splitting at the last hyphen keeps interior hyphens on the info side:
/// `"BluRay.x264.DTS-HD.MA.5.1-FGT"` yields info
/// `"BluRay.x264.DTS-HD.MA.5.1"` and group `"FGT"`. Without a hyphen the
/// whole tail is info and the group is unset.
pub fn split_rip_info_and_group(text: &str) -> (Option<String>, Option<String>) {
    let text = text.trim_matches(|c: char| SEPARATORS.contains(&c));
    if text.is_empty() {
        return (None, None);
    }

    match text.rfind('-') {
        Some(idx) => {
            let info = text[..idx].trim_matches(|c: char| SEPARATORS.contains(&c));
            let group = text[idx + 1..].trim_matches(|c: char| SEPARATORS.contains(&c));
            (
                (!info.is_empty()).then(|| info.to_string()),
                (!group.is_empty()).then(|| group.to_string()),
            )
        }
        None => (Some(text.to_string()), None),
    }
}

/// Parse a rip file name into its typed elements.
///
/// Never fails: a name without a recognizable year becomes all title, and
/// an empty name yields no fields at all. Quality is the first
/// vocabulary token after the year; tags between year and quality
/// (REMASTERED, iNTERNAL, ...) are discarded; the remaining tail is split
/// into info and group.
pub fn parse(file_name: &str) -> ParsedRip {
    let tokens = tokenize(file_name);

    let Some((year_idx, year)) = locate_year(&tokens) else {
        let title = normalize_title(file_name);
        if title.is_empty() {
            tracing::trace!(file_name, "nothing to parse");
            return ParsedRip::default();
        }
        tracing::trace!(file_name, "no release year found, keeping whole name as title");
        return ParsedRip {
            title: Some(title),
            ..Default::default()
        };
    };

    let title = normalize_title(&file_name[..tokens[year_idx].start]);
    let rest = &tokens[year_idx + 1..];

    let quality_idx = rest.iter().position(|t| keyword::is_quality(t.text));
    let rip_quality = quality_idx.map(|i| rest[i].text.to_string());

    let tail_start = match quality_idx {
        Some(i) => rest[i].end,
        None => tokens[year_idx].end,
    };
    let (rip_info, rip_group) = split_rip_info_and_group(&file_name[tail_start..]);

    ParsedRip {
        title: Some(title),
        release_date: Some(year),
        rip_quality,
        rip_info,
        rip_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_parsed(
        file_name: &str,
        title: &str,
        release_date: &str,
        rip_quality: Option<&str>,
        rip_info: Option<&str>,
        rip_group: Option<&str>,
    ) {
        let parsed = parse(file_name);
        assert_eq!(parsed.title.as_deref(), Some(title), "title of {file_name}");
        assert_eq!(
            parsed.release_date.as_deref(),
            Some(release_date),
            "release date of {file_name}"
        );
        assert_eq!(
            parsed.rip_quality.as_deref(),
            rip_quality,
            "rip quality of {file_name}"
        );
        assert_eq!(parsed.rip_info.as_deref(), rip_info, "rip info of {file_name}");
        assert_eq!(
            parsed.rip_group.as_deref(),
            rip_group,
            "rip group of {file_name}"
        );
    }

    #[test]
    fn parse_full_release_name() {
        assert_parsed(
            "The.Deer.Hunter.1978.REMASTERED.1080p.BluRay.x264.DTS-HD.MA.5.1-FGT",
            "The Deer Hunter",
            "1978",
            Some("1080p"),
            Some("BluRay.x264.DTS-HD.MA.5.1"),
            Some("FGT"),
        );
    }

    #[test]
    fn parse_bracketed_group_suffix_is_kept_verbatim() {
        assert_parsed(
            "Khrustalyov.My.Car.1998.720p.BluRay.x264-GHOULS[rarbg]",
            "Khrustalyov My Car",
            "1998",
            Some("720p"),
            Some("BluRay.x264"),
            Some("GHOULS[rarbg]"),
        );
    }

    #[test]
    fn parse_space_separated_name() {
        assert_parsed(
            "Sicario 2015 1080p BluRay x264 AC3-JYK",
            "Sicario",
            "2015",
            Some("1080p"),
            Some("BluRay x264 AC3"),
            Some("JYK"),
        );
    }

    #[test]
    fn parse_discards_tags_between_year_and_quality() {
        assert_parsed(
            "The.Lives.of.Others.2006.GERMAN.REMASTERED.1080p.BluRay.x264.DTS-NOGRP",
            "The Lives of Others",
            "2006",
            Some("1080p"),
            Some("BluRay.x264.DTS"),
            Some("NOGRP"),
        );
    }

    #[test]
    fn parse_digit_token_in_title_is_not_a_year() {
        assert_parsed(
            "Terminator.2.Judgement.Day.1991.Extended.REMASTERED.1080p.BluRay.H264.AAC.READ.NFO-RARBG",
            "Terminator 2 Judgement Day",
            "1991",
            Some("1080p"),
            Some("BluRay.H264.AAC.READ.NFO"),
            Some("RARBG"),
        );
    }

    #[test]
    fn parse_webrip_release() {
        assert_parsed(
            "A.Hero.2021.1080p.AMZN.WEBRip.DDP5.1.x264-TEPES",
            "A Hero",
            "2021",
            Some("1080p"),
            Some("AMZN.WEBRip.DDP5.1.x264"),
            Some("TEPES"),
        );
    }

    #[test]
    fn parse_dvdrip_release() {
        assert_parsed(
            "Better.Things.2008.FESTiVAL.DVDRip.XviD-NODLABS",
            "Better Things",
            "2008",
            Some("DVDRip"),
            Some("XviD"),
            Some("NODLABS"),
        );
    }

    #[test]
    fn parse_parenthesized_year_without_rip_segments() {
        assert_parsed("Ex Drummer (2007)", "Ex Drummer", "2007", None, None, None);
    }

    #[test]
    fn parse_first_vocabulary_token_wins_as_quality() {
        // WEB-DL precedes 1080p, so it is the quality; the tail has no
        // hyphen, so everything after it is info and the group is unset.
        assert_parsed(
            "Idiocracy.2006.WEB-DL.1080p.x264.anoXmous",
            "Idiocracy",
            "2006",
            Some("WEB-DL"),
            Some("1080p.x264.anoXmous"),
            None,
        );
    }

    #[test]
    fn parse_numeric_title_takes_later_year() {
        assert_parsed(
            "1917.2019.1080p.BluRay.x264-GRP",
            "1917",
            "2019",
            Some("1080p"),
            Some("BluRay.x264"),
            Some("GRP"),
        );
    }

    #[test]
    fn parse_without_year_keeps_whole_name_as_title() {
        let parsed = parse("Some Movie Without A Date");
        assert_eq!(parsed.title.as_deref(), Some("Some Movie Without A Date"));
        assert_eq!(parsed.release_date, None);
        assert_eq!(parsed.rip_quality, None);
        assert_eq!(parsed.rip_info, None);
        assert_eq!(parsed.rip_group, None);
    }

    #[test]
    fn parse_empty_input_yields_nothing() {
        assert_eq!(parse(""), ParsedRip::default());
        assert_eq!(parse("  .  "), ParsedRip::default());
    }

    #[test]
    fn year_after_quality_marker_is_not_a_split_point() {
        // "2001" sits right after "720p", so it cannot start the split; no
        // other year exists and the whole name stays a title.
        let parsed = parse("Some.Show.720p.2001");
        assert_eq!(parsed.title.as_deref(), Some("Some Show 720p 2001"));
        assert_eq!(parsed.release_date, None);
    }

    #[test]
    fn split_title_and_release_date_cases() {
        let cases = [
            ("The Tragedy Of Macbeth (2021)", "The Tragedy Of Macbeth", "2021"),
            ("Cop Car 2015 ", "Cop Car", "2015"),
            ("  Khrustalyov.My.Car.1998", "Khrustalyov My Car", "1998"),
        ];
        for (input, title, date) in cases {
            let (actual_title, actual_date) =
                split_title_and_release_date(input).expect(input);
            assert_eq!(actual_title, title, "title of {input}");
            assert_eq!(actual_date, date, "date of {input}");
        }
    }

    #[test]
    fn split_rip_info_and_group_cases() {
        let cases = [
            ("BluRay.x264-GECKOS", Some("BluRay.x264"), Some("GECKOS")),
            ("BluRay.H264.AAC-VXT", Some("BluRay.H264.AAC"), Some("VXT")),
            ("BluRay x264 DTS-JYK", Some("BluRay x264 DTS"), Some("JYK")),
            (
                "BluRay.x264.DTS-HD.MA.5.1-FGT",
                Some("BluRay.x264.DTS-HD.MA.5.1"),
                Some("FGT"),
            ),
            (
                "BluRay x264 Mayan AAC - Ozlem",
                Some("BluRay x264 Mayan AAC"),
                Some("Ozlem"),
            ),
            ("BDRip.XviD-Larceny", Some("BDRip.XviD"), Some("Larceny")),
            (
                "[DvdRip] [Xvid] {1337x}-Noir",
                Some("[DvdRip] [Xvid] {1337x}"),
                Some("Noir"),
            ),
            // No hyphen: the whole tail is info, group stays unset.
            ("BluRay.x264.anoXmous", Some("BluRay.x264.anoXmous"), None),
            ("", None, None),
        ];
        for (input, info, group) in cases {
            let (actual_info, actual_group) = split_rip_info_and_group(input);
            assert_eq!(actual_info.as_deref(), info, "info of {input:?}");
            assert_eq!(actual_group.as_deref(), group, "group of {input:?}");
        }
    }
}
