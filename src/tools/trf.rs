// trf.rs - Tandem Repeats Finder adapter and report parser

use super::{find_executable, Workspace};
use crate::error::{Result, TreError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// One tandem repeat reported by the repeat finder.
///
/// Start and end are 1-based, inclusive, local to the searched sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatHit {
    pub start: i64,
    pub end: i64,
    pub period: u32,
    pub copies: f64,
    pub consensus_size: u32,
    pub pct_match: f64,
    pub pct_indel: f64,
    pub score: f64,
    pub composition: [u32; 4],
    pub entropy: f64,
    pub motif: String,
    pub repeat_seq: String,
}

impl RepeatHit {
    /// Length of the repeat tract itself, as sequenced
    pub fn repeat_len(&self) -> usize {
        self.repeat_seq.len()
    }

    pub fn span(&self) -> (i64, i64) {
        (self.start, self.end)
    }

    /// Homopolymer motifs carry no usable periodicity
    pub fn is_degenerate(&self) -> bool {
        is_degenerate_motif(&self.motif)
    }

    /// Parse one whitespace-split report line with exactly 15 fields
    fn from_fields(cols: &[&str]) -> std::result::Result<Self, String> {
        fn num<T: std::str::FromStr>(s: &str, name: &str) -> std::result::Result<T, String> {
            s.parse::<T>()
                .map_err(|_| format!("cannot parse {} from '{}'", name, s))
        }
        // trf writes integers for percentages and counts, accept either form
        fn count(s: &str, name: &str) -> std::result::Result<u32, String> {
            num::<f64>(s, name).map(|v| v.round() as u32)
        }

        Ok(Self {
            start: num(cols[0], "start")?,
            end: num(cols[1], "end")?,
            period: count(cols[2], "period")?,
            copies: num(cols[3], "copy number")?,
            consensus_size: count(cols[4], "consensus size")?,
            pct_match: num(cols[5], "percent match")?,
            pct_indel: num(cols[6], "percent indel")?,
            score: num(cols[7], "score")?,
            composition: [
                count(cols[8], "A")?,
                count(cols[9], "C")?,
                count(cols[10], "G")?,
                count(cols[11], "T")?,
            ],
            entropy: num(cols[12], "entropy")?,
            motif: cols[13].to_string(),
            repeat_seq: cols[14].to_string(),
        })
    }
}

/// True for single-base motifs and homopolymer runs such as "AAAA"
pub fn is_degenerate_motif(motif: &str) -> bool {
    let mut bases = motif.bytes();
    match bases.next() {
        None => true,
        Some(first) => bases.all(|b| b == first),
    }
}

/// Inclusive motif length window for eligible hits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotifLengthRange {
    pub min: usize,
    pub max: usize,
}

impl MotifLengthRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, motif: &str) -> bool {
        motif.len() >= self.min && motif.len() <= self.max
    }
}

/// Repeat finder output grouped by sequence id
#[derive(Debug, Clone, Default)]
pub struct RepeatReport {
    pub hits: BTreeMap<String, Vec<RepeatHit>>,
    /// Sequence ids in the order the report listed them
    pub order: Vec<String>,
}

impl RepeatReport {
    /// Parse a `.dat` report (`-d -h` mode).
    ///
    /// Lines are either `Sequence: <id>` markers or 15-field hit records.
    /// Everything else (headers, parameter lines, blank lines) is ignored.
    /// Hits with a motif outside `range` are dropped.
    pub fn parse(text: &str, range: MotifLengthRange) -> Result<Self> {
        let mut report = RepeatReport::default();
        let mut current: Option<String> = None;

        for (line_num, line) in text.lines().enumerate() {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.is_empty() {
                continue;
            }
            if cols[0] == "Sequence:" {
                if let Some(id) = cols.get(1) {
                    current = Some(id.to_string());
                    report.hits.entry(id.to_string()).or_default();
                    report.order.push(id.to_string());
                }
            } else if cols.len() == 15 {
                let seq_id = match &current {
                    Some(id) => id,
                    None => continue,
                };
                let hit = RepeatHit::from_fields(&cols)
                    .map_err(|e| TreError::parse("repeat finder report", line_num + 1, e))?;
                if range.contains(&hit.motif) {
                    report.hits.entry(seq_id.clone()).or_default().push(hit);
                }
            }
        }

        Ok(report)
    }

    pub fn get(&self, seq_id: &str) -> &[RepeatHit] {
        self.hits.get(seq_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Iterate sequences in report order, skipping those without hits
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RepeatHit])> {
        self.order.iter().filter_map(move |id| {
            let hits = self.get(id);
            if hits.is_empty() {
                None
            } else {
                Some((id.as_str(), hits))
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.hits.values().all(|v| v.is_empty())
    }
}

/// Interface to a tandem repeat finder
pub trait RepeatFinder: Send + Sync {
    /// Search every record of a multi-FASTA text for tandem repeats
    fn find_repeats(
        &self,
        fasta: &str,
        range: MotifLengthRange,
        workspace: &mut Workspace,
    ) -> Result<RepeatReport>;
}

/// Tandem Repeats Finder (`trf`) invoked as an external binary
#[derive(Debug, Clone)]
pub struct Trf {
    pub binary: String,
    pub args: Vec<String>,
}

impl Trf {
    /// Locate `trf` on PATH; absence aborts the run
    pub fn new(args: &str) -> Result<Self> {
        find_executable("trf")?;
        Ok(Self::with_binary("trf", args))
    }

    pub fn with_binary(binary: &str, args: &str) -> Self {
        Self {
            binary: binary.to_string(),
            args: args.split_whitespace().map(|s| s.to_string()).collect(),
        }
    }

    /// Name of the `.dat` file trf derives from its input and numeric parameters
    pub fn output_name(&self, input: &Path) -> String {
        let numeric: Vec<&str> = self
            .args
            .iter()
            .map(|s| s.as_str())
            .take_while(|s| !s.starts_with('-'))
            .collect();
        let base = input
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{}.{}.dat", base, numeric.join("."))
    }
}

impl RepeatFinder for Trf {
    fn find_repeats(
        &self,
        fasta: &str,
        range: MotifLengthRange,
        workspace: &mut Workspace,
    ) -> Result<RepeatReport> {
        let input = workspace.write_file("trf", "fa", fasta)?;
        debug!("trf input {}", input.display());

        // trf encodes the number of repeats in its exit status, so it is not checked
        Command::new(&self.binary)
            .arg(&input)
            .args(&self.args)
            .current_dir(workspace.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| TreError::ToolLaunch {
                tool: self.binary.clone(),
                source,
            })?;

        let output = workspace.path().join(self.output_name(&input));
        if !output.exists() {
            return Err(TreError::MissingOutput {
                tool: self.binary.clone(),
                path: output,
            });
        }
        workspace.track(output.clone());

        let text = fs::read_to_string(&output)?;
        RepeatReport::parse(&text, range)
    }
}
