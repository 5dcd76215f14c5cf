//! Command-table dispatch (spec.md §4.6, §6): translates one parsed query
//! line into a `PatientIndex` operation (or, when no country is given,
//! several — one per assigned country, combined) and renders a single
//! reply string.

use patientdb_proto::{CommandKind, Date, ParsedQuery};

use crate::bootstrap::WorkerState;

pub fn handle(query: &ParsedQuery, state: &WorkerState) -> String {
    match query.kind {
        CommandKind::DiseaseFrequency => disease_frequency(query, state),
        CommandKind::TopkAgeRanges => topk_age_ranges(query, state),
        CommandKind::SearchPatientRecord => search_patient_record(query, state),
        CommandKind::NumPatientAdmissions => num_admissions(query, state),
        CommandKind::NumPatientDischarges => num_discharges(query, state),
    }
}

fn parse_date(s: &str) -> Option<Date> {
    s.parse().ok()
}

fn disease_frequency(query: &ParsedQuery, state: &WorkerState) -> String {
    let virus = &query.args[0];
    let (Some(start), Some(end)) = (parse_date(&query.args[1]), parse_date(&query.args[2])) else {
        return "0".to_string();
    };
    let country = query.country_arg();

    if let Some(c) = country {
        if !state.is_assigned(c) {
            return "0".to_string();
        }
    }

    state
        .index
        .disease_frequency(virus, start, end, country)
        .unwrap_or(0)
        .to_string()
}

fn topk_age_ranges(query: &ParsedQuery, state: &WorkerState) -> String {
    let Ok(k) = query.args[0].parse::<usize>() else {
        return String::new();
    };
    let country = &query.args[1];
    let virus = &query.args[2];
    let (Some(start), Some(end)) = (parse_date(&query.args[3]), parse_date(&query.args[4])) else {
        return String::new();
    };

    if !state.is_assigned(country) {
        return String::new();
    }

    let Some(report) = state.index.top_k_age_ranges(k, country, virus, start, end) else {
        return String::new();
    };

    let mut out = String::new();
    for (bucket, count) in &report.ranked {
        out.push_str(&format!(
            "Age range {} years: {}%\n",
            bucket.label(),
            report.percent_of(*count)
        ));
    }
    out
}

fn search_patient_record(query: &ParsedQuery, state: &WorkerState) -> String {
    let id = &query.args[0];
    for country in &state.assigned_countries {
        if let Some(handle) = state.index.find(country, id) {
            let p = handle.borrow();
            return format!(
                "{} {} {} {} {} {} {} {}\n",
                p.id, p.first_name, p.last_name, p.virus, p.country, p.age, p.entry_date, p.exit_date
            );
        }
    }
    String::new()
}

fn num_admissions(query: &ParsedQuery, state: &WorkerState) -> String {
    count_over_countries(query, state, |index, country, virus, start, end| {
        index.admissions(country, virus, start, end)
    })
}

fn num_discharges(query: &ParsedQuery, state: &WorkerState) -> String {
    count_over_countries(query, state, |index, country, virus, start, end| {
        index.discharges(country, virus, start, end)
    })
}

/// Shared shape for `numPatientAdmissions`/`numPatientDischarges`: both
/// take `<virus> <start> <end> [country]` and, absent a country, sum the
/// per-country count across every country this Worker is assigned (spec.md
/// §4.6: "If the command supplies no country, iterate the worker's
/// assigned countries and combine").
fn count_over_countries(
    query: &ParsedQuery,
    state: &WorkerState,
    op: impl Fn(&patientdb_core::PatientIndex, &str, &str, Date, Date) -> Option<u32>,
) -> String {
    let virus = &query.args[0];
    let (Some(start), Some(end)) = (parse_date(&query.args[1]), parse_date(&query.args[2])) else {
        return "0".to_string();
    };

    match query.country_arg() {
        Some(country) => {
            if !state.is_assigned(country) {
                return String::new();
            }
            op(&state.index, country, virus, start, end)
                .unwrap_or(0)
                .to_string()
        }
        None => {
            let total: u32 = state
                .assigned_countries
                .iter()
                .map(|c| op(&state.index, c, virus, start, end).unwrap_or(0))
                .sum();
            total.to_string()
        }
    }
}
