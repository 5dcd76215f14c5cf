//! Per-file statistics text, generated once a record file has been fully
//! ingested, grounded on `original_source/master.c`'s
//! `worker_generate_stats`. The block always starts with the date and
//! country, followed by one paragraph per virus seen among that day's
//! newly admitted patients.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use patientdb_proto::Date;

use crate::index::PatientHandle;
use crate::patient::AgeBucket;

#[derive(Default, Clone, Copy)]
struct VirusFrequency {
    upto20: u32,
    upto40: u32,
    upto60: u32,
    plus60: u32,
}

/// Render the statistics block for one day's newly admitted patients in a
/// country. Returns `None` when `patients` is empty — the original only
/// emits a stats message when the file actually added admissions.
pub fn generate_stats(country: &str, date: Date, patients: &[PatientHandle]) -> Option<String> {
    if patients.is_empty() {
        return None;
    }

    let mut by_virus: BTreeMap<String, VirusFrequency> = BTreeMap::new();

    for p in patients {
        let p = p.borrow();
        let entry = by_virus.entry(p.virus.clone()).or_default();
        match p.age_bucket() {
            AgeBucket::Upto20 => entry.upto20 += 1,
            AgeBucket::Upto40 => entry.upto40 += 1,
            AgeBucket::Upto60 => entry.upto60 += 1,
            AgeBucket::Plus60 => entry.plus60 += 1,
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{date}");
    let _ = writeln!(out, "{country}");

    for (virus, freq) in &by_virus {
        let _ = writeln!(out, "{virus}");
        let _ = writeln!(out, "Age range 0-20 years: {} cases", freq.upto20);
        let _ = writeln!(out, "Age range 21-40 years: {} cases", freq.upto40);
        let _ = writeln!(out, "Age range 41-60 years: {} cases", freq.upto60);
        let _ = writeln!(out, "Age range 60+ years: {} cases\n", freq.plus60);
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PatientIndex;
    use crate::patient::Patient;

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn empty_patient_list_yields_no_stats() {
        assert_eq!(generate_stats("Greece", d("01-01-2020"), &[]), None);
    }

    #[test]
    fn groups_counts_by_virus_and_age_bucket() {
        let mut idx = PatientIndex::new();
        let a = idx.insert(Patient::new("1", "a", "b", "FluA", "Greece", 10, d("01-01-2020")).unwrap());
        let b = idx.insert(Patient::new("2", "a", "b", "FluA", "Greece", 70, d("01-01-2020")).unwrap());
        let c = idx.insert(Patient::new("3", "a", "b", "COVID", "Greece", 30, d("01-01-2020")).unwrap());

        let stats = generate_stats("Greece", d("01-01-2020"), &[a, b, c]).unwrap();
        assert!(stats.contains("01-01-2020"));
        assert!(stats.contains("Greece"));
        assert!(stats.contains("COVID"));
        assert!(stats.contains("FluA"));
        assert!(stats.contains("Age range 0-20 years: 1 cases"));
        assert!(stats.contains("Age range 60+ years: 1 cases"));
        assert!(stats.contains("Age range 21-40 years: 1 cases"));
    }
}
