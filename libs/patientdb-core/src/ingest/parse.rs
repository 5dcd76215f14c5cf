//! Per-line record parsing (spec.md §4), grounded on the row-handling
//! branches of `original_source/patient.c`'s `patient_parse_file`: each
//! line is either a fresh admission (6 whitespace-separated fields ending
//! in an action token that is not `EXIT`) or a discharge (`EXIT`) for an
//! already-known id.

use thiserror::Error;

use patientdb_proto::Date;

use crate::index::PatientIndex;
use crate::patient::{Patient, PatientError};

const EXIT_ACTION: &str = "EXIT";

/// The five line-level failure classes the original logs as
/// `PATIENT_ELINE`/`EEXIT`/`EDUPID`/`EINVID`/`ERECDAT`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestLineError {
    #[error("erroneous line: {0}")]
    MalformedLine(String),
    #[error("exit date comes before entry date (id: {0})")]
    ExitBeforeEntry(String),
    #[error("duplicate record id: {0}")]
    DuplicateId(String),
    #[error("invalid record id: {0}")]
    InvalidId(String),
    #[error("erroneous record data: {0}")]
    ErroneousRecordData(String),
}

/// Ingest one line of a record file into `index`. `country` and `date` come
/// from the file's path (directory name and file name respectively), not
/// from the line itself.
pub fn ingest_line(
    line: &str,
    country: &str,
    date: Date,
    index: &mut PatientIndex,
) -> Result<(), IngestLineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return Err(IngestLineError::MalformedLine(line.to_string()));
    }

    let id = fields[0];
    let action = fields[1];
    let first_name = fields[2];
    let last_name = fields[3];
    let virus = fields[4];
    let age = fields[5];

    match index.find(country, id) {
        Some(handle) => {
            if action == EXIT_ACTION {
                handle
                    .borrow_mut()
                    .set_exit(date)
                    .map_err(|_: PatientError| IngestLineError::ExitBeforeEntry(id.to_string()))
            } else {
                Err(IngestLineError::DuplicateId(id.to_string()))
            }
        }
        None => {
            if action == EXIT_ACTION {
                return Err(IngestLineError::InvalidId(id.to_string()));
            }

            let age: i32 = age
                .parse()
                .map_err(|_| IngestLineError::ErroneousRecordData(line.to_string()))?;

            let patient = Patient::new(id, first_name, last_name, virus, country, age, date)
                .map_err(|_| IngestLineError::ErroneousRecordData(line.to_string()))?;

            index.insert(patient);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn admits_a_new_patient() {
        let mut idx = PatientIndex::new();
        ingest_line("p1 ENTRY Alice Doe FluA 30", "Greece", d("01-01-2020"), &mut idx).unwrap();
        assert!(idx.find("Greece", "p1").is_some());
    }

    #[test]
    fn rejects_a_line_with_too_few_fields() {
        let mut idx = PatientIndex::new();
        let err = ingest_line("p1 ENTRY Alice", "Greece", d("01-01-2020"), &mut idx).unwrap_err();
        assert!(matches!(err, IngestLineError::MalformedLine(_)));
    }

    #[test]
    fn records_an_exit_for_a_known_patient() {
        let mut idx = PatientIndex::new();
        ingest_line("p1 ENTRY Alice Doe FluA 30", "Greece", d("01-01-2020"), &mut idx).unwrap();
        ingest_line("p1 EXIT Alice Doe FluA 30", "Greece", d("05-01-2020"), &mut idx).unwrap();
        let p = idx.find("Greece", "p1").unwrap();
        assert_eq!(p.borrow().exit_date, d("05-01-2020"));
    }

    #[test]
    fn rejects_an_exit_before_entry() {
        let mut idx = PatientIndex::new();
        ingest_line("p1 ENTRY Alice Doe FluA 30", "Greece", d("10-01-2020"), &mut idx).unwrap();
        let err =
            ingest_line("p1 EXIT Alice Doe FluA 30", "Greece", d("01-01-2020"), &mut idx)
                .unwrap_err();
        assert!(matches!(err, IngestLineError::ExitBeforeEntry(_)));
    }

    #[test]
    fn rejects_a_duplicate_admission() {
        let mut idx = PatientIndex::new();
        ingest_line("p1 ENTRY Alice Doe FluA 30", "Greece", d("01-01-2020"), &mut idx).unwrap();
        let err =
            ingest_line("p1 ENTRY Alice Doe FluA 30", "Greece", d("02-01-2020"), &mut idx)
                .unwrap_err();
        assert!(matches!(err, IngestLineError::DuplicateId(_)));
    }

    #[test]
    fn rejects_an_exit_for_an_unknown_id() {
        let mut idx = PatientIndex::new();
        let err =
            ingest_line("nope EXIT Alice Doe FluA 30", "Greece", d("01-01-2020"), &mut idx)
                .unwrap_err();
        assert!(matches!(err, IngestLineError::InvalidId(_)));
    }

    #[test]
    fn rejects_an_out_of_range_age() {
        let mut idx = PatientIndex::new();
        let err =
            ingest_line("p1 ENTRY Alice Doe FluA 200", "Greece", d("01-01-2020"), &mut idx)
                .unwrap_err();
        assert!(matches!(err, IngestLineError::ErroneousRecordData(_)));
    }
}
