//! Warehouse enumeration and visit registration.
//!
//! A visit is one timestamped snapshot of the warehouse's top-level
//! entries. Enumeration writes the entry names to a dated dump file;
//! registration parses each name once, reuses rips already known by file
//! name, and records the snapshot.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use walkdir::WalkDir;

use kurosawa_parse::parse;

use crate::error::KurosawaError;
use crate::models::{MovieRip, Visit};
use crate::storage::Storage;

/// Result of registering one warehouse visit.
#[derive(Debug, Clone, Default)]
pub struct VisitRegistration {
    pub visit: Option<Visit>,
    pub entries_total: u32,
    pub rips_new: u32,
    pub rips_reused: u32,
    pub parse_failures: u32,
}

/// Names of the top-level entries of the warehouse directory.
pub fn list_warehouse_contents(path: &Path) -> Result<Vec<String>, KurosawaError> {
    if !path.is_dir() {
        return Err(KurosawaError::WarehouseNotFound(
            path.display().to_string(),
        ));
    }

    let mut entries: Vec<String> = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    entries.sort();

    tracing::info!(path = %path.display(), count = entries.len(), "Listed warehouse contents");
    Ok(entries)
}

/// Write the warehouse listing to `movie_dump_YYYYMMDD.txt` in the dump
/// directory, one entry per line. Returns the dump file path.
pub fn dump_warehouse_contents(
    warehouse: &Path,
    dump_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, KurosawaError> {
    if !dump_dir.is_dir() {
        return Err(KurosawaError::WarehouseNotFound(
            dump_dir.display().to_string(),
        ));
    }

    let entries = list_warehouse_contents(warehouse)?;
    let dump_path = dump_dir.join(format!("movie_dump_{}.txt", date.format("%Y%m%d")));
    std::fs::write(&dump_path, entries.join("\n"))?;

    tracing::info!(path = %dump_path.display(), "Wrote warehouse dump");
    Ok(dump_path)
}

/// Read a dump file back into entry names, dropping blank lines.
pub fn read_dump(path: &Path) -> Result<Vec<String>, KurosawaError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Extract the visit date from a dump file name like
/// `movie_dump_20220101.txt`.
pub fn dump_file_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(".txt")?;
    let digits = stem.strip_prefix("movie_dump_")?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

/// Register a visit from the given entry names.
///
/// Rips already known by file name are reused untouched (their parsed
/// fields and any link are immutable once created); new names are parsed
/// and inserted. Names the parser cannot split are still kept, with all
/// parsed fields unset.
pub fn register_visit(
    storage: &Storage,
    entries: &[String],
    visit_date_time: DateTime<Utc>,
) -> Result<VisitRegistration, KurosawaError> {
    let visit_id = storage.insert_visit(visit_date_time)?;
    let mut registration = VisitRegistration {
        entries_total: entries.len() as u32,
        ..Default::default()
    };

    for entry in entries {
        let rip_id = match storage.find_rip_by_file_name(entry)? {
            Some(existing) => {
                registration.rips_reused += 1;
                existing.id
            }
            None => {
                let parsed = parse(entry);
                if parsed.title.is_none() {
                    tracing::warn!(file_name = %entry, "Could not parse rip name");
                    registration.parse_failures += 1;
                }
                registration.rips_new += 1;
                storage.insert_rip(&MovieRip::from_parsed(entry, parsed))?
            }
        };
        storage.add_rip_to_visit(visit_id, rip_id)?;
    }

    tracing::info!(
        visit = %visit_date_time,
        total = registration.entries_total,
        new = registration.rips_new,
        reused = registration.rips_reused,
        failures = registration.parse_failures,
        "Registered warehouse visit"
    );

    registration.visit = Some(Visit {
        id: visit_id,
        visit_date_time,
    });
    Ok(registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn listing_a_missing_directory_fails() {
        let result = list_warehouse_contents(Path::new("/does/not/exist"));
        assert!(matches!(result, Err(KurosawaError::WarehouseNotFound(_))));
    }

    #[test]
    fn listing_returns_sorted_entry_names() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Gummo.1997.DVDRip.XviD-DiSSOLVE")).unwrap();
        std::fs::write(dir.path().join("Ex Drummer (2007)"), b"").unwrap();

        let entries = list_warehouse_contents(dir.path()).unwrap();
        assert_eq!(
            entries,
            vec![
                "Ex Drummer (2007)".to_string(),
                "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
            ]
        );
    }

    #[test]
    fn dump_round_trip() {
        let warehouse = TempDir::new().unwrap();
        let dumps = TempDir::new().unwrap();
        std::fs::create_dir(warehouse.path().join("Papillon.1973.1080p.BluRay.X264-AMIABLE"))
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let dump_path = dump_warehouse_contents(warehouse.path(), dumps.path(), date).unwrap();
        assert!(dump_path.ends_with("movie_dump_20220101.txt"));

        let entries = read_dump(&dump_path).unwrap();
        assert_eq!(entries, vec!["Papillon.1973.1080p.BluRay.X264-AMIABLE"]);
    }

    #[test]
    fn dump_file_date_parses_the_stamp() {
        assert_eq!(
            dump_file_date("movie_dump_20220101.txt"),
            NaiveDate::from_ymd_opt(2022, 1, 1)
        );
        assert_eq!(dump_file_date("something_else.txt"), None);
        assert_eq!(dump_file_date("movie_dump_2022.txt"), None);
    }

    #[test]
    fn registration_parses_new_and_reuses_known_rips() {
        let storage = Storage::open_memory().unwrap();
        let first_visit = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let second_visit = Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap();

        let entries = vec![
            "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
            "Papillon.1973.1080p.BluRay.X264-AMIABLE".to_string(),
        ];
        let first = register_visit(&storage, &entries, first_visit).unwrap();
        assert_eq!(first.rips_new, 2);
        assert_eq!(first.rips_reused, 0);

        let rip = storage
            .find_rip_by_file_name("Gummo.1997.DVDRip.XviD-DiSSOLVE")
            .unwrap()
            .unwrap();
        assert_eq!(rip.parsed_title.as_deref(), Some("Gummo"));
        assert_eq!(rip.parsed_release_date.as_deref(), Some("1997"));

        // Second visit: one entry persists, one is new.
        let entries = vec![
            "Gummo.1997.DVDRip.XviD-DiSSOLVE".to_string(),
            "Ex Drummer (2007)".to_string(),
        ];
        let second = register_visit(&storage, &entries, second_visit).unwrap();
        assert_eq!(second.rips_new, 1);
        assert_eq!(second.rips_reused, 1);

        let visits = storage.all_visits().unwrap();
        assert_eq!(visits.len(), 2);
        assert_eq!(storage.rips_in_visit(&visits[0]).unwrap().len(), 2);
        assert_eq!(storage.rips_in_visit(&visits[1]).unwrap().len(), 2);
    }

    #[test]
    fn duplicate_visit_timestamp_is_rejected() {
        let storage = Storage::open_memory().unwrap();
        let when = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        register_visit(&storage, &[], when).unwrap();
        assert!(register_visit(&storage, &[], when).is_err());
    }
}
