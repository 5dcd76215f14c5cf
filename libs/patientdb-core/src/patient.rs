//! The `Patient` record and the case-insensitive string key used to index
//! patients by country and by virus (spec.md §3, §9).
//!
//! Grounded on `original_source/patient.c`'s `patient_init`/`patient_set_exit`:
//! age must be in `1..=120`, and an exit date is only accepted once it is
//! known to be defined and not earlier than the entry date. Comparisons
//! against the `Undefined` sentinel are done explicitly with `is_defined()`
//! rather than through `Date`'s `Ord` impl, sidestepping the ordering
//! discrepancy recorded in SPEC_FULL.md's Open Question resolution #1: a
//! fresh record's exit date is always `Undefined`, which must never be
//! treated as "earlier" or "later" than the entry date, only as "not yet
//! set".

use std::hash::{Hash, Hasher};

use thiserror::Error;

use patientdb_proto::Date;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatientError {
    #[error("age {0} is out of range 1-120")]
    AgeOutOfRange(i32),
    #[error("exit date {exit} precedes entry date {entry}")]
    ExitBeforeEntry { entry: Date, exit: Date },
}

/// A case-insensitive string key: hashes and compares by lowercased form
/// while `as_str()` returns the original casing, used for the `country`
/// and `virus` index keys which the original queries by `strcasecmp`.
#[derive(Debug, Clone)]
pub struct CiKey {
    original: String,
    lower: String,
}

impl CiKey {
    pub fn new(s: impl Into<String>) -> Self {
        let original = s.into();
        let lower = original.to_lowercase();
        CiKey { original, lower }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl PartialEq for CiKey {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower
    }
}
impl Eq for CiKey {}

impl Hash for CiKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower.hash(state)
    }
}

impl std::borrow::Borrow<str> for CiKey {
    fn borrow(&self) -> &str {
        &self.lower
    }
}

impl From<&str> for CiKey {
    fn from(s: &str) -> Self {
        CiKey::new(s)
    }
}

/// A single patient admission record.
#[derive(Debug, Clone)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub virus: String,
    pub country: String,
    pub age: u8,
    pub entry_date: Date,
    pub exit_date: Date,
}

impl Patient {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        virus: impl Into<String>,
        country: impl Into<String>,
        age: i32,
        entry_date: Date,
    ) -> Result<Self, PatientError> {
        if !(1..=120).contains(&age) {
            return Err(PatientError::AgeOutOfRange(age));
        }

        Ok(Patient {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            virus: virus.into(),
            country: country.into(),
            age: age as u8,
            entry_date,
            exit_date: Date::Undefined,
        })
    }

    /// Record a discharge date. Rejects (leaving the existing exit date
    /// untouched) when `exit` is not chronologically at or after the entry
    /// date.
    pub fn set_exit(&mut self, exit: Date) -> Result<(), PatientError> {
        if exit.is_defined() && exit < self.entry_date {
            return Err(PatientError::ExitBeforeEntry {
                entry: self.entry_date,
                exit,
            });
        }
        self.exit_date = exit;
        Ok(())
    }

    pub fn matches_virus(&self, virus: &str) -> bool {
        self.virus.eq_ignore_ascii_case(virus)
    }

    pub fn matches_country(&self, country: &str) -> bool {
        self.country.eq_ignore_ascii_case(country)
    }

    pub fn age_bucket(&self) -> AgeBucket {
        match self.age {
            0..=20 => AgeBucket::Upto20,
            21..=40 => AgeBucket::Upto40,
            41..=60 => AgeBucket::Upto60,
            _ => AgeBucket::Plus60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    Upto20,
    Upto40,
    Upto60,
    Plus60,
}

impl AgeBucket {
    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Upto20 => "0-20",
            AgeBucket::Upto40 => "0-40",
            AgeBucket::Upto60 => "0-60",
            AgeBucket::Plus60 => "60+",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(d: &str) -> Date {
        d.parse().unwrap()
    }

    #[test]
    fn rejects_age_out_of_range() {
        let err = Patient::new("1", "a", "b", "flu", "gr", 0, entry("01-01-2020")).unwrap_err();
        assert_eq!(err, PatientError::AgeOutOfRange(0));

        let err = Patient::new("1", "a", "b", "flu", "gr", 121, entry("01-01-2020")).unwrap_err();
        assert_eq!(err, PatientError::AgeOutOfRange(121));
    }

    #[test]
    fn fresh_patient_has_an_undefined_exit_date() {
        let p = Patient::new("1", "a", "b", "flu", "gr", 30, entry("01-01-2020")).unwrap();
        assert_eq!(p.exit_date, Date::Undefined);
    }

    #[test]
    fn set_exit_rejects_a_date_before_entry() {
        let mut p = Patient::new("1", "a", "b", "flu", "gr", 30, entry("10-01-2020")).unwrap();
        let err = p.set_exit(entry("01-01-2020")).unwrap_err();
        assert!(matches!(err, PatientError::ExitBeforeEntry { .. }));
        assert_eq!(p.exit_date, Date::Undefined);
    }

    #[test]
    fn set_exit_accepts_a_date_on_or_after_entry() {
        let mut p = Patient::new("1", "a", "b", "flu", "gr", 30, entry("10-01-2020")).unwrap();
        p.set_exit(entry("10-01-2020")).unwrap();
        assert_eq!(p.exit_date, entry("10-01-2020"));
    }

    #[test]
    fn ci_key_ignores_case_but_keeps_original_casing() {
        let a = CiKey::new("Greece");
        let b = CiKey::new("GREECE");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Greece");
    }

    #[test]
    fn age_buckets_match_the_four_ranges() {
        assert_eq!(
            Patient::new("1", "a", "b", "flu", "gr", 20, entry("01-01-2020"))
                .unwrap()
                .age_bucket(),
            AgeBucket::Upto20
        );
        assert_eq!(
            Patient::new("1", "a", "b", "flu", "gr", 61, entry("01-01-2020"))
                .unwrap()
                .age_bucket(),
            AgeBucket::Plus60
        );
    }
}
