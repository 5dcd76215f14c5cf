//! Query command grammar (spec.md §6): command table plus a line tokenizer.
//!
//! The table only enforces minimum token count and the source command
//! name; it deliberately does not validate date formats or numeric
//! arguments itself — each component (Worker for execution, Aggregator for
//! the disease-frequency aggregation split) interprets `ParsedQuery::args`
//! the way the original `command.c` table's `cntrarg_pos` column intends.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown command\n")]
    UnknownCommand,
    #[error("Please provide all the necessary arguments\n")]
    MissingArguments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    DiseaseFrequency,
    TopkAgeRanges,
    SearchPatientRecord,
    NumPatientAdmissions,
    NumPatientDischarges,
}

struct CommandSpec {
    kind: CommandKind,
    name: &'static str,
    /// Minimum number of whitespace-separated tokens, the command name
    /// itself excluded.
    mandatory_args: usize,
    /// 0-indexed position of the optional country argument within `args`
    /// (name excluded), or `None` when the command takes no country.
    country_arg_pos: Option<usize>,
}

const COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        kind: CommandKind::DiseaseFrequency,
        name: "/diseaseFrequency",
        mandatory_args: 3,
        country_arg_pos: Some(3),
    },
    CommandSpec {
        kind: CommandKind::TopkAgeRanges,
        name: "/topk-AgeRanges",
        mandatory_args: 5,
        country_arg_pos: Some(1),
    },
    CommandSpec {
        kind: CommandKind::SearchPatientRecord,
        name: "/searchPatientRecord",
        mandatory_args: 1,
        country_arg_pos: None,
    },
    CommandSpec {
        kind: CommandKind::NumPatientAdmissions,
        name: "/numPatientAdmissions",
        mandatory_args: 3,
        country_arg_pos: Some(3),
    },
    CommandSpec {
        kind: CommandKind::NumPatientDischarges,
        name: "/numPatientDischarges",
        mandatory_args: 3,
        country_arg_pos: Some(3),
    },
];

fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_TABLE.iter().find(|c| c.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub kind: CommandKind,
    /// Tokens after the command name, in wire order.
    pub args: Vec<String>,
}

impl ParsedQuery {
    pub fn country_arg(&self) -> Option<&str> {
        let pos = COMMAND_TABLE
            .iter()
            .find(|c| c.kind == self.kind)
            .and_then(|c| c.country_arg_pos)?;
        self.args.get(pos).map(String::as_str)
    }
}

/// Tokenize and validate a raw query line against the command table. Does
/// not interpret date/numeric fields — only command-name lookup and
/// minimum-argument-count checks, matching spec.md §7's two user-visible
/// failure modes for this stage.
pub fn parse_query(line: &str) -> Result<ParsedQuery, ProtocolError> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next().ok_or(ProtocolError::UnknownCommand)?;
    let spec = lookup(name).ok_or(ProtocolError::UnknownCommand)?;
    let args: Vec<String> = tokens.map(str::to_owned).collect();

    if args.len() < spec.mandatory_args {
        return Err(ProtocolError::MissingArguments);
    }

    Ok(ParsedQuery {
        kind: spec.kind,
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disease_frequency_without_country_is_valid() {
        let q = parse_query("/diseaseFrequency FluA 01-01-2020 31-01-2020").unwrap();
        assert_eq!(q.kind, CommandKind::DiseaseFrequency);
        assert_eq!(q.country_arg(), None);
    }

    #[test]
    fn disease_frequency_with_country_reads_it_back() {
        let q = parse_query("/diseaseFrequency FluA 01-01-2020 31-01-2020 UK").unwrap();
        assert_eq!(q.country_arg(), Some("UK"));
    }

    #[test]
    fn topk_age_ranges_requires_all_six_tokens() {
        assert_eq!(
            parse_query("/topk-AgeRanges 4 UK FluA 01-01-2020"),
            Err(ProtocolError::MissingArguments)
        );
        let q = parse_query("/topk-AgeRanges 4 UK FluA 01-01-2020 31-12-2020").unwrap();
        assert_eq!(q.country_arg(), Some("UK"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert_eq!(
            parse_query("/bogusCommand a b c"),
            Err(ProtocolError::UnknownCommand)
        );
    }

    #[test]
    fn empty_line_is_unknown_command() {
        assert_eq!(parse_query(""), Err(ProtocolError::UnknownCommand));
    }

    #[test]
    fn search_patient_record_takes_no_country() {
        let q = parse_query("/searchPatientRecord p1").unwrap();
        assert_eq!(q.country_arg(), None);
    }
}
