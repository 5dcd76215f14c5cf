//! The per-Worker patient index: three maps built over a single owning
//! store, mirroring `original_source/patient.c`'s `PatientDB` (`cntrid`,
//! `cntree`, `virtree`).
//!
//! `by_country_id` is the sole owner of every `Patient` (`Rc<RefCell<_>>`);
//! `by_country_date` and `by_virus_date` are AVL trees of `Weak` back
//! references keyed by entry date, used only for ordered range scans. A
//! single-threaded Worker never shares this structure across threads, so
//! `Rc`/`RefCell`/`Weak` are used in place of `Arc`/`Mutex` — there is
//! nothing here an atomic refcount or a lock would buy.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use patientdb_proto::Date;

use crate::patient::{AgeBucket, CiKey, Patient};
use crate::tree::{Order, Tree};

pub type PatientHandle = Rc<RefCell<Patient>>;

/// Result of [`PatientIndex::top_k_age_ranges`]: the top-`k` buckets by
/// count, plus the total across all four buckets each percentage is
/// computed against (`patientDB_topkAgeRanges`'s `freq_sum`).
pub struct AgeRangeReport {
    pub ranked: Vec<(AgeBucket, u32)>,
    pub total: u32,
}

impl AgeRangeReport {
    /// Whole-percent share of `count` within `self.total`, 0 when the
    /// total is 0.
    pub fn percent_of(&self, count: u32) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (count as f64 / self.total as f64 * 100.0).round()
        }
    }
}

#[derive(Default)]
pub struct PatientIndex {
    by_country_id: HashMap<CiKey, HashMap<String, PatientHandle>>,
    by_country_date: HashMap<CiKey, Tree<Date, Weak<RefCell<Patient>>>>,
    by_virus_date: HashMap<CiKey, Tree<Date, Weak<RefCell<Patient>>>>,
}

impl PatientIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new patient. Does not check for an existing id under the
    /// same country — the ingestion pipeline does that check upfront
    /// (spec.md §4's duplicate-id handling) because only it knows whether
    /// to treat a repeat as an `EXIT` update instead.
    pub fn insert(&mut self, patient: Patient) -> PatientHandle {
        let country_key = CiKey::new(&patient.country);
        let virus_key = CiKey::new(&patient.virus);
        let entry_date = patient.entry_date;
        let id = patient.id.clone();

        let handle = Rc::new(RefCell::new(patient));

        self.by_country_id
            .entry(country_key.clone())
            .or_default()
            .insert(id, Rc::clone(&handle));

        self.by_country_date
            .entry(country_key)
            .or_default()
            .insert(entry_date, Rc::downgrade(&handle));

        self.by_virus_date
            .entry(virus_key)
            .or_default()
            .insert(entry_date, Rc::downgrade(&handle));

        handle
    }

    pub fn find(&self, country: &str, id: &str) -> Option<PatientHandle> {
        self.by_country_id.get(country)?.get(id).cloned()
    }

    /// All patients admitted to `country` on exactly `date`.
    pub fn by_country_and_date(&self, country: &str, date: Date) -> Vec<PatientHandle> {
        self.by_country_date
            .get(country)
            .and_then(|t| t.locate(&date))
            .map(|bag| bag.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    /// Total admissions of `virus` between `start` and `end` (inclusive),
    /// optionally restricted to `country`. `None` means the virus has no
    /// admissions recorded at all — the wire-level sentinel for this is -1,
    /// assigned by the caller, not here.
    pub fn disease_frequency(
        &self,
        virus: &str,
        start: Date,
        end: Date,
        country: Option<&str>,
    ) -> Option<u32> {
        let tree = self.by_virus_date.get(virus)?;
        let mut freq = 0u32;

        tree.traverse_range(Order::Pre, &start, &end, |_date, bag| {
            for weak in bag {
                let Some(p) = weak.upgrade() else { continue };
                let matches = match country {
                    Some(c) => p.borrow().matches_country(c),
                    None => true,
                };
                if matches {
                    freq += 1;
                }
            }
            std::ops::ControlFlow::<()>::Continue(())
        });

        Some(freq)
    }

    fn virus_age_frequency(
        &self,
        country: &str,
        virus: &str,
        start: Date,
        end: Date,
    ) -> Option<[u32; 4]> {
        let tree = self.by_country_date.get(country)?;
        let mut buckets = [0u32; 4];

        tree.traverse_range(Order::Pre, &start, &end, |_date, bag| {
            for weak in bag {
                let Some(p) = weak.upgrade() else { continue };
                let p = p.borrow();
                if p.matches_virus(virus) {
                    let idx = match p.age_bucket() {
                        AgeBucket::Upto20 => 0,
                        AgeBucket::Upto40 => 1,
                        AgeBucket::Upto60 => 2,
                        AgeBucket::Plus60 => 3,
                    };
                    buckets[idx] += 1;
                }
            }
            std::ops::ControlFlow::<()>::Continue(())
        });

        Some(buckets)
    }

    /// Breakdown of `virus` admissions in `country` between `start` and
    /// `end` into the four age ranges, ranked by count descending and
    /// truncated to the top `k`. `None` when `country` has no admissions
    /// recorded at all. The caller renders each entry's percentage of
    /// `total` (not of the top-`k` subset) via [`AgeRangeReport::percent_of`].
    pub fn top_k_age_ranges(
        &self,
        k: usize,
        country: &str,
        virus: &str,
        start: Date,
        end: Date,
    ) -> Option<AgeRangeReport> {
        let buckets = self.virus_age_frequency(country, virus, start, end)?;
        let total: u32 = buckets.iter().sum();

        let labels = [
            AgeBucket::Upto20,
            AgeBucket::Upto40,
            AgeBucket::Upto60,
            AgeBucket::Plus60,
        ];
        let mut ranked: Vec<(AgeBucket, u32)> =
            labels.into_iter().zip(buckets).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k.min(ranked.len()));

        Some(AgeRangeReport { ranked, total })
    }

    /// Count of `virus` admissions in `country` between `start` and `end`.
    pub fn admissions(&self, country: &str, virus: &str, start: Date, end: Date) -> Option<u32> {
        let tree = self.by_country_date.get(country)?;
        let mut n = 0u32;

        tree.traverse_range(Order::Pre, &start, &end, |_date, bag| {
            for weak in bag {
                let Some(p) = weak.upgrade() else { continue };
                if p.borrow().matches_virus(virus) {
                    n += 1;
                }
            }
            std::ops::ControlFlow::<()>::Continue(())
        });

        Some(n)
    }

    /// Count of `virus` patients in `country` whose *exit* date falls
    /// within `[start, end]`. Scans the whole per-country tree (keyed by
    /// entry date, not exit date) rather than a range, matching
    /// `patientDB_discharges`'s use of `tree_traverse` over
    /// `tree_traverse_range`.
    pub fn discharges(&self, country: &str, virus: &str, start: Date, end: Date) -> Option<u32> {
        let tree = self.by_country_date.get(country)?;
        let mut n = 0u32;

        tree.traverse(Order::Pre, |_date, bag| {
            for weak in bag {
                let Some(p) = weak.upgrade() else { continue };
                let p = p.borrow();
                if p.matches_virus(virus)
                    && p.exit_date.is_defined()
                    && p.exit_date >= start
                    && p.exit_date <= end
                {
                    n += 1;
                }
            }
            std::ops::ControlFlow::<()>::Continue(())
        });

        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn seed() -> PatientIndex {
        let mut idx = PatientIndex::new();
        idx.insert(Patient::new("1", "a", "b", "FluA", "Greece", 15, d("01-01-2020")).unwrap());
        idx.insert(Patient::new("2", "a", "b", "FluA", "Greece", 35, d("02-01-2020")).unwrap());
        idx.insert(Patient::new("3", "a", "b", "FluA", "Greece", 70, d("03-01-2020")).unwrap());
        idx.insert(Patient::new("4", "a", "b", "COVID", "Greece", 50, d("04-01-2020")).unwrap());
        idx.insert(Patient::new("5", "a", "b", "FluA", "Italy", 22, d("02-01-2020")).unwrap());
        idx
    }

    #[test]
    fn find_looks_up_by_country_and_id() {
        let idx = seed();
        let p = idx.find("Greece", "2").unwrap();
        assert_eq!(p.borrow().age, 35);
        assert!(idx.find("Greece", "missing").is_none());
        assert!(idx.find("Unknown", "1").is_none());
    }

    #[test]
    fn find_is_case_insensitive_on_country() {
        let idx = seed();
        assert!(idx.find("GREECE", "1").is_some());
    }

    #[test]
    fn disease_frequency_counts_virus_within_date_range() {
        let idx = seed();
        let freq = idx
            .disease_frequency("FluA", d("01-01-2020"), d("02-01-2020"), None)
            .unwrap();
        assert_eq!(freq, 2);
    }

    #[test]
    fn disease_frequency_filters_by_country_when_given() {
        let idx = seed();
        let freq = idx
            .disease_frequency("FluA", d("01-01-2020"), d("03-01-2020"), Some("Italy"))
            .unwrap();
        assert_eq!(freq, 1);
    }

    #[test]
    fn disease_frequency_is_none_for_an_unknown_virus() {
        let idx = seed();
        assert!(idx
            .disease_frequency("Ebola", d("01-01-2020"), d("31-12-2020"), None)
            .is_none());
    }

    #[test]
    fn top_k_age_ranges_ranks_by_count_descending() {
        let idx = seed();
        let report = idx
            .top_k_age_ranges(2, "Greece", "FluA", d("01-01-2020"), d("31-12-2020"))
            .unwrap();
        assert_eq!(report.ranked.len(), 2);
        assert!(report.ranked[0].1 >= report.ranked[1].1);
        assert_eq!(report.total, 3);
    }

    #[test]
    fn admissions_counts_matching_virus_in_range() {
        let idx = seed();
        let n = idx
            .admissions("Greece", "FluA", d("01-01-2020"), d("31-12-2020"))
            .unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn discharges_counts_only_patients_with_a_defined_exit_in_range() {
        let mut idx = PatientIndex::new();
        let p1 = idx.insert(Patient::new("1", "a", "b", "FluA", "Greece", 30, d("01-01-2020")).unwrap());
        p1.borrow_mut().set_exit(d("10-01-2020")).unwrap();
        idx.insert(Patient::new("2", "a", "b", "FluA", "Greece", 30, d("01-01-2020")).unwrap());

        let n = idx
            .discharges("Greece", "FluA", d("01-01-2020"), d("31-01-2020"))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn by_country_and_date_returns_every_patient_admitted_that_day() {
        let idx = seed();
        let hits = idx.by_country_and_date("Greece", d("02-01-2020"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].borrow().id, "2");
    }
}
