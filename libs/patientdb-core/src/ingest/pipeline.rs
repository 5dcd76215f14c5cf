//! Directory scanning and file-level ingestion driver (spec.md §4),
//! grounded on `original_source/master.c`'s `update_recordfiles` and
//! `parse_recordfiles`: each country has its own directory under the
//! input root, and each file inside it is parsed exactly once, in
//! ascending date order, across however many rescans the Worker performs.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use patientdb_proto::Date;
use tracing::warn;

use super::parse::ingest_line;
use super::stats::generate_stats;
use super::types::RecordFile;
use crate::index::PatientIndex;

/// Discover files under `<input_dir>/<country>` not already present in
/// `known`, appending them as unparsed. Files whose name isn't a valid
/// date are skipped with a warning rather than aborting the scan.
pub fn discover_record_files(input_dir: &Path, country: &str, known: &mut Vec<RecordFile>) {
    let country_dir = input_dir.join(country);

    let entries = match fs::read_dir(&country_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(country, ?country_dir, %err, "failed to read country directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if known.iter().any(|r| r.path == path) {
            continue;
        }

        match RecordFile::new(path) {
            Ok(record) => known.push(record),
            Err(err) => warn!(%err, "skipping record file with an unparseable name"),
        }
    }
}

/// Parse every not-yet-parsed file in `known`, in ascending date order,
/// and return the concatenated per-file statistics blocks for files that
/// added at least one patient.
pub fn ingest_known_files(country: &str, known: &mut [RecordFile], index: &mut PatientIndex) -> String {
    known.sort_by_key(|r| r.date);

    let mut stats_total = String::new();

    for record in known.iter_mut() {
        if record.parsed {
            continue;
        }

        ingest_file(&record.path, country, record.date, index);
        record.parsed = true;

        let admitted = index.by_country_and_date(country, record.date);
        if let Some(stats) = generate_stats(country, record.date, &admitted) {
            stats_total.push_str(&stats);
        }
    }

    stats_total
}

fn ingest_file(path: &Path, country: &str, date: Date, index: &mut PatientIndex) {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(err) => {
            warn!(?path, %err, "failed to open record file");
            return;
        }
    };

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(err) => {
                warn!(?path, lineno, %err, "failed to read line");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Err(err) = ingest_line(&line, country, date, index) {
            warn!(?path, lineno, %err, "rejected record line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn discovers_and_ingests_a_single_country_file() {
        let dir = tempfile::tempdir().unwrap();
        let country_dir = dir.path().join("Greece");
        fs::create_dir_all(&country_dir).unwrap();

        let file_path = country_dir.join("01-01-2020");
        let mut f = fs::File::create(&file_path).unwrap();
        writeln!(f, "p1 ENTRY Alice Doe FluA 30").unwrap();
        writeln!(f, "p2 ENTRY Bob Smith FluA 70").unwrap();

        let mut known = Vec::new();
        discover_record_files(dir.path(), "Greece", &mut known);
        assert_eq!(known.len(), 1);

        let mut index = PatientIndex::new();
        let stats = ingest_known_files("Greece", &mut known, &mut index);

        assert!(known[0].parsed);
        assert!(index.find("Greece", "p1").is_some());
        assert!(stats.contains("FluA"));
        assert!(stats.contains("01-01-2020"));
    }

    #[test]
    fn rescanning_does_not_reparse_known_files() {
        let dir = tempfile::tempdir().unwrap();
        let country_dir = dir.path().join("Italy");
        fs::create_dir_all(&country_dir).unwrap();
        let file_path = country_dir.join("01-01-2020");
        let mut f = fs::File::create(&file_path).unwrap();
        writeln!(f, "p1 ENTRY Alice Doe FluA 30").unwrap();
        drop(f);

        let mut known = Vec::new();
        discover_record_files(dir.path(), "Italy", &mut known);
        let mut index = PatientIndex::new();
        ingest_known_files("Italy", &mut known, &mut index);

        // Second pass over the same directory finds nothing new.
        discover_record_files(dir.path(), "Italy", &mut known);
        assert_eq!(known.len(), 1);
        let stats = ingest_known_files("Italy", &mut known, &mut index);
        assert!(stats.is_empty());
    }

    #[test]
    fn files_are_ingested_in_ascending_date_order() {
        let dir = tempfile::tempdir().unwrap();
        let country_dir = dir.path().join("Spain");
        fs::create_dir_all(&country_dir).unwrap();

        writeln!(
            fs::File::create(country_dir.join("05-01-2020")).unwrap(),
            "p2 ENTRY B B FluA 40"
        )
        .unwrap();
        writeln!(
            fs::File::create(country_dir.join("01-01-2020")).unwrap(),
            "p1 ENTRY A A FluA 40"
        )
        .unwrap();

        let mut known = Vec::new();
        discover_record_files(dir.path(), "Spain", &mut known);
        let mut index = PatientIndex::new();
        ingest_known_files("Spain", &mut known, &mut index);

        let p1 = index.find("Spain", "p1").unwrap();
        let p2 = index.find("Spain", "p2").unwrap();
        assert_eq!(p1.borrow().entry_date, d("01-01-2020"));
        assert_eq!(p2.borrow().entry_date, d("05-01-2020"));
    }
}
