//! Rip-release filename parsing.
//!
//! Decomposes free-form movie rip names like
//! `The.Deer.Hunter.1978.REMASTERED.1080p.BluRay.x264.DTS-HD.MA.5.1-FGT`
//! into typed fields: title, release year, rip quality, rip info and
//! release group. The grammar is heuristic and degrades gracefully:
//! fields it cannot place are left unset, never errored.

pub mod elements;
pub mod keyword;
mod parser;

pub use elements::ParsedRip;
pub use parser::{parse, split_rip_info_and_group, split_title_and_release_date};
