// blast.rs - Local aligner adapter (blastn) and tabular hit parser

use super::{find_executable, Workspace};
use crate::error::{Result, TreError};
use log::debug;
use std::fs;
use std::process::{Command, Stdio};

/// One HSP from tabular (outfmt 6) output
#[derive(Debug, Clone, PartialEq)]
pub struct LocalHit {
    pub query_id: String,
    pub subject_id: String,
    pub pct_identity: f64,
    pub align_len: usize,
    pub evalue: f64,
    pub q_start: usize,
    pub q_end: usize,
    pub s_start: usize,
    pub s_end: usize,
}

/// Search parameters handed to the local aligner
#[derive(Debug, Clone, PartialEq)]
pub struct AlignParams {
    pub word_size: usize,
    pub evalue: Option<f64>,
    pub perc_identity: Option<f64>,
    pub qcov_hsp_perc: Option<f64>,
}

impl AlignParams {
    /// Motif-vs-motif comparison used to build equivalence indexes
    pub fn motif_search() -> Self {
        Self {
            word_size: 4,
            evalue: None,
            perc_identity: Some(80.0),
            qcov_hsp_perc: Some(80.0),
        }
    }

    /// Probe-vs-clipped-tail search used by the rescue path
    pub fn probe_search() -> Self {
        Self {
            word_size: 6,
            evalue: Some(1e-10),
            perc_identity: None,
            qcov_hsp_perc: None,
        }
    }
}

/// Interface to a local sequence aligner
pub trait LocalAligner: Send + Sync {
    /// Align every query record against every subject record.
    /// Hits come back sorted ascending by e-value.
    fn align(
        &self,
        query_fasta: &str,
        subject_fasta: &str,
        params: &AlignParams,
        workspace: &mut Workspace,
    ) -> Result<Vec<LocalHit>>;
}

/// Parse tabular output:
/// qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore
pub fn parse_tabular(text: &str) -> Result<Vec<LocalHit>> {
    let mut hits = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 11 {
            return Err(TreError::parse(
                "aligner output",
                line_num + 1,
                format!("expected at least 11 columns, found {}", cols.len()),
            ));
        }
        let bad = |field: &str| TreError::parse("aligner output", line_num + 1, format!("bad {}", field));
        hits.push(LocalHit {
            query_id: cols[0].to_string(),
            subject_id: cols[1].to_string(),
            pct_identity: cols[2].parse().map_err(|_| bad("pident"))?,
            align_len: cols[3].parse().map_err(|_| bad("length"))?,
            q_start: cols[6].parse().map_err(|_| bad("qstart"))?,
            q_end: cols[7].parse().map_err(|_| bad("qend"))?,
            s_start: cols[8].parse().map_err(|_| bad("sstart"))?,
            s_end: cols[9].parse().map_err(|_| bad("send"))?,
            evalue: cols[10].parse().map_err(|_| bad("evalue"))?,
        });
    }

    hits.sort_by(|a, b| a.evalue.total_cmp(&b.evalue));
    Ok(hits)
}

/// NCBI blastn invoked as an external binary
#[derive(Debug, Clone)]
pub struct Blastn {
    pub binary: String,
}

impl Blastn {
    pub fn new() -> Result<Self> {
        find_executable("blastn")?;
        Ok(Self::with_binary("blastn"))
    }

    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    fn build_args(&self, query: &str, subject: &str, out: &str, params: &AlignParams) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-query".into(),
            query.into(),
            "-subject".into(),
            subject.into(),
            "-task".into(),
            "blastn".into(),
            "-word_size".into(),
            params.word_size.to_string(),
        ];
        if let Some(evalue) = params.evalue {
            args.push("-evalue".into());
            args.push(format!("{:e}", evalue));
        }
        args.push("-outfmt".into());
        args.push("6".into());
        if let Some(pid) = params.perc_identity {
            args.push("-perc_identity".into());
            args.push(pid.to_string());
        }
        if let Some(qcov) = params.qcov_hsp_perc {
            args.push("-qcov_hsp_perc".into());
            args.push(qcov.to_string());
        }
        args.push("-out".into());
        args.push(out.into());
        args
    }
}

impl LocalAligner for Blastn {
    fn align(
        &self,
        query_fasta: &str,
        subject_fasta: &str,
        params: &AlignParams,
        workspace: &mut Workspace,
    ) -> Result<Vec<LocalHit>> {
        let query = workspace.write_file("blastn.query", "fa", query_fasta)?;
        let subject = workspace.write_file("blastn.subject", "fa", subject_fasta)?;
        let out = workspace.file_name("blastn", "tsv");

        let args = self.build_args(
            &query.to_string_lossy(),
            &subject.to_string_lossy(),
            &out.to_string_lossy(),
            params,
        );
        debug!("{} {}", self.binary, args.join(" "));

        Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| TreError::ToolLaunch {
                tool: self.binary.clone(),
                source,
            })?;

        if !out.exists() {
            return Err(TreError::MissingOutput {
                tool: self.binary.clone(),
                path: out,
            });
        }

        parse_tabular(&fs::read_to_string(&out)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tabular_sorted_by_evalue() {
        let text = "\
m1\tm1\t95.00\t90\t4\t0\t1\t90\t11\t100\t1e-20\t150
m0\tm0\t100.00\t100\t0\t0\t1\t100\t1\t100\t1e-40\t180
";
        let hits = parse_tabular(text).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].query_id, "m0");
        assert_eq!(hits[1].s_start, 11);
        assert_eq!(hits[1].s_end, 100);
        assert_eq!(hits[1].align_len, 90);
    }

    #[test]
    fn test_parse_tabular_rejects_short_lines() {
        assert!(parse_tabular("a\tb\t99\n").is_err());
    }

    #[test]
    fn test_build_args() {
        let blastn = Blastn::with_binary("blastn");
        let args = blastn.build_args("q.fa", "s.fa", "o.tsv", &AlignParams::probe_search());
        assert_eq!(args[0], "-query");
        assert!(args.windows(2).any(|w| w[0] == "-word_size" && w[1] == "6"));
        assert!(args.windows(2).any(|w| w[0] == "-evalue" && w[1] == "1e-10"));
        assert!(!args.contains(&"-perc_identity".to_string()));
        assert_eq!(args.last().unwrap(), "o.tsv");
    }
}
