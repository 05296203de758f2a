//! Rip-level reporting over warehouse visits.
//!
//! Counts and diffs computed from the rips' parsed fields, never from
//! the linked movies.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::error::KurosawaError;
use crate::storage::Storage;

/// Bucket for rips whose name carried no parseable release year.
const UNKNOWN_RELEASE_DATE: &str = "unknown";

/// Rip-level reports computed from visit snapshots.
pub struct ScanRipsManager<'a> {
    storage: &'a Storage,
}

impl<'a> ScanRipsManager<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Rip count of the latest visit, grouped by parsed release year.
    /// Rips without one are counted under `"unknown"`.
    pub fn rip_count_by_release_date(&self) -> Result<HashMap<String, usize>, KurosawaError> {
        let visit = self.storage.closest_visit()?.ok_or(KurosawaError::NoVisits)?;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for rip in self.storage.rips_in_visit(&visit)? {
            let key = rip
                .parsed_release_date
                .unwrap_or_else(|| UNKNOWN_RELEASE_DATE.to_string());
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// File names of the latest visit's rips with the given parsed year.
    pub fn rips_with_release_date(
        &self,
        release_date: &str,
    ) -> Result<Vec<String>, KurosawaError> {
        let visit = self.storage.closest_visit()?.ok_or(KurosawaError::NoVisits)?;
        Ok(self
            .storage
            .rips_in_visit(&visit)?
            .into_iter()
            .filter(|rip| rip.parsed_release_date.as_deref() == Some(release_date))
            .map(|rip| rip.file_name)
            .collect())
    }

    /// Rip count per visit, in chronological order.
    pub fn rip_count_by_visit(
        &self,
    ) -> Result<BTreeMap<DateTime<Utc>, usize>, KurosawaError> {
        let mut counts = BTreeMap::new();
        for visit in self.storage.all_visits()? {
            let count = self.storage.rips_in_visit(&visit)?.len();
            counts.insert(visit.visit_date_time, count);
        }
        Ok(counts)
    }

    /// File-name diff of the last two visits.
    ///
    /// With a single visit registered everything counts as added. Keys
    /// are `"added"` and `"removed"`.
    pub fn last_visit_diff(&self) -> Result<HashMap<String, Vec<String>>, KurosawaError> {
        let visits = self.storage.all_visits()?;
        let Some(right) = visits.last() else {
            return Err(KurosawaError::NoVisits);
        };
        let left = visits.len().checked_sub(2).map(|i| &visits[i]);

        let right_names: Vec<String> = self
            .storage
            .rips_in_visit(right)?
            .into_iter()
            .map(|rip| rip.file_name)
            .collect();
        let left_names: Vec<String> = match left {
            Some(visit) => self
                .storage
                .rips_in_visit(visit)?
                .into_iter()
                .map(|rip| rip.file_name)
                .collect(),
            None => Vec::new(),
        };

        let added = right_names
            .iter()
            .filter(|name| !left_names.contains(name))
            .cloned()
            .collect();
        let removed = left_names
            .iter()
            .filter(|name| !right_names.contains(name))
            .cloned()
            .collect();

        Ok(HashMap::from([
            ("added".to_string(), added),
            ("removed".to_string(), removed),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieRip;
    use crate::warehouse::register_visit;
    use chrono::TimeZone;
    use kurosawa_parse::parse;

    fn visit_at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn count_by_release_date_groups_parsed_years() {
        let storage = Storage::open_memory().unwrap();
        let entries = vec![
            "Face.Off.1997.iNTERNAL.1080p.BluRay.x264-MARS[rarbg]".to_string(),
            "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
            "Magnolia.1999.1080p.BluRay.x264-GRP".to_string(),
        ];
        register_visit(&storage, &entries, visit_at(1)).unwrap();

        let manager = ScanRipsManager::new(&storage);
        let counts = manager.rip_count_by_release_date().unwrap();
        assert_eq!(counts.get("1997"), Some(&2));
        assert_eq!(counts.get("1999"), Some(&1));
    }

    #[test]
    fn rips_without_a_year_count_as_unknown() {
        let storage = Storage::open_memory().unwrap();
        let entries = vec![
            "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
            "Some Movie Without A Date".to_string(),
        ];
        register_visit(&storage, &entries, visit_at(1)).unwrap();

        let manager = ScanRipsManager::new(&storage);
        let counts = manager.rip_count_by_release_date().unwrap();
        assert_eq!(counts.get("1997"), Some(&1));
        assert_eq!(counts.get("unknown"), Some(&1));
    }

    #[test]
    fn count_by_release_date_without_visits_fails() {
        let storage = Storage::open_memory().unwrap();
        let manager = ScanRipsManager::new(&storage);
        assert!(matches!(
            manager.rip_count_by_release_date(),
            Err(KurosawaError::NoVisits)
        ));
    }

    #[test]
    fn rips_with_release_date_returns_matching_file_names() {
        let storage = Storage::open_memory().unwrap();
        let entries = vec![
            "Face.Off.1997.iNTERNAL.1080p.BluRay.x264-MARS[rarbg]".to_string(),
            "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
            "Magnolia.1999.1080p.BluRay.x264-GRP".to_string(),
        ];
        register_visit(&storage, &entries, visit_at(1)).unwrap();

        let manager = ScanRipsManager::new(&storage);
        let mut names = manager.rips_with_release_date("1997").unwrap();
        names.sort();
        assert_eq!(
            names,
            vec![
                "Face.Off.1997.iNTERNAL.1080p.BluRay.x264-MARS[rarbg]".to_string(),
                "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
            ]
        );
    }

    #[test]
    fn count_by_visit_follows_visit_order() {
        let storage = Storage::open_memory().unwrap();
        register_visit(
            &storage,
            &[
                "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
                "Ex Drummer (2007)".to_string(),
            ],
            visit_at(1),
        )
        .unwrap();
        register_visit(
            &storage,
            &[
                "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
                "Ex Drummer (2007)".to_string(),
                "Papillon.1973.1080p.BluRay.X264-AMIABLE".to_string(),
                "Magnolia.1999.1080p.BluRay.x264-GRP".to_string(),
            ],
            visit_at(2),
        )
        .unwrap();

        let manager = ScanRipsManager::new(&storage);
        let counts = manager.rip_count_by_visit().unwrap();
        assert_eq!(counts.get(&visit_at(1)), Some(&2));
        assert_eq!(counts.get(&visit_at(2)), Some(&4));
    }

    #[test]
    fn last_visit_diff_reports_added_and_removed_file_names() {
        let storage = Storage::open_memory().unwrap();
        register_visit(
            &storage,
            &[
                "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
                "Papillon.1973.1080p.BluRay.X264-AMIABLE".to_string(),
            ],
            visit_at(1),
        )
        .unwrap();
        register_visit(
            &storage,
            &[
                "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
                "Ex Drummer (2007)".to_string(),
            ],
            visit_at(2),
        )
        .unwrap();

        let manager = ScanRipsManager::new(&storage);
        let diff = manager.last_visit_diff().unwrap();
        assert_eq!(diff["added"], vec!["Ex Drummer (2007)".to_string()]);
        assert_eq!(
            diff["removed"],
            vec!["Papillon.1973.1080p.BluRay.X264-AMIABLE".to_string()]
        );
    }

    #[test]
    fn last_visit_diff_with_one_visit_adds_everything() {
        let storage = Storage::open_memory().unwrap();
        register_visit(
            &storage,
            &["Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string()],
            visit_at(1),
        )
        .unwrap();

        let manager = ScanRipsManager::new(&storage);
        let diff = manager.last_visit_diff().unwrap();
        assert_eq!(diff["added"].len(), 1);
        assert!(diff["removed"].is_empty());
    }

    #[test]
    fn parse_failures_still_appear_in_visits() {
        let storage = Storage::open_memory().unwrap();
        let registration = register_visit(
            &storage,
            &["...".to_string(), "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string()],
            visit_at(1),
        )
        .unwrap();
        assert_eq!(registration.parse_failures, 1);

        // The unparseable entry is kept as a rip with no parsed fields.
        let rip = storage.find_rip_by_file_name("...").unwrap().unwrap();
        assert_eq!(rip.parsed_title, None);
        assert_eq!(
            MovieRip::from_parsed("...", parse("...")).parsed_title,
            None
        );
    }
}
