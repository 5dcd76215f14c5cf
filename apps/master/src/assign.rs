//! Country discovery and round-robin assignment (spec.md §4.4 steps 1 & 4).

use std::fs;
use std::io::Write;
use std::net::SocketAddrV4;
use std::path::Path;

use anyhow::{Context, Result};
use patientdb_proto::{write_raw, write_string, WireAddr};

/// Enumerate `input_dir`'s immediate subdirectories as the country list.
/// Order is whatever `read_dir` yields, then sorted for deterministic
/// round-robin assignment across runs.
pub fn discover_countries(input_dir: &Path) -> Result<Vec<String>> {
    let mut countries = Vec::new();
    for entry in fs::read_dir(input_dir)
        .with_context(|| format!("failed to read input directory {input_dir:?}"))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                countries.push(name.to_string());
            }
        }
    }
    countries.sort();
    Ok(countries)
}

/// The subset of `countries` assigned to worker slot `pos` out of `workers`
/// total slots, via `i mod workers` round robin (spec.md §4.4 step 4).
pub fn countries_for_slot(countries: &[String], workers: usize, pos: usize) -> Vec<String> {
    countries
        .iter()
        .enumerate()
        .filter(|(i, _)| i % workers == pos)
        .map(|(_, c)| c.clone())
        .collect()
}

/// Write the country list for one slot, terminated by an empty-string
/// frame, over `pipe`. Does not write the Aggregator address — callers
/// append that separately (initial assignment only, per spec.md §4.4's
/// runtime rule that respawn resends only the country subset).
pub fn send_countries<W: Write>(pipe: &mut W, countries: &[String]) -> Result<()> {
    for country in countries {
        write_string(pipe, country).context("failed to write assigned country frame")?;
    }
    write_string(pipe, "").context("failed to write country-list terminator")?;
    Ok(())
}

/// Append the one-shot Aggregator address frame (spec.md §4.4 step 4,
/// initial assignment only).
pub fn send_aggregator_addr<W: Write>(pipe: &mut W, addr: SocketAddrV4) -> Result<()> {
    let wire = WireAddr::from(addr);
    write_raw(pipe, &wire.to_bytes()).context("failed to write aggregator address frame")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robins_countries_across_slots() {
        let countries: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(countries_for_slot(&countries, 2, 0), vec!["A", "C"]);
        assert_eq!(countries_for_slot(&countries, 2, 1), vec!["B", "D"]);
    }

    #[test]
    fn discover_countries_lists_only_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("UK")).unwrap();
        std::fs::create_dir(dir.path().join("Greece")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let countries = discover_countries(dir.path()).unwrap();
        assert_eq!(countries, vec!["Greece".to_string(), "UK".to_string()]);
    }

    #[test]
    fn country_frames_round_trip_through_the_wire_codec() {
        let mut buf = Vec::new();
        send_countries(&mut buf, &["UK".to_string(), "Greece".to_string()]).unwrap();

        let mut cur = std::io::Cursor::new(buf);
        assert_eq!(patientdb_proto::read_string(&mut cur).unwrap(), "UK");
        assert_eq!(patientdb_proto::read_string(&mut cur).unwrap(), "Greece");
        assert_eq!(patientdb_proto::read_string(&mut cur).unwrap(), "");
    }
}
