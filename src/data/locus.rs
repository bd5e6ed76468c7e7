// locus.rs - Genomic loci under investigation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a locus came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocusOrigin {
    /// Consolidated from TRE-flagged insertion candidates
    Insertion,
    /// Read from a user locus file (directed genotyping)
    UserSupplied,
}

/// A genomic interval associated with a repeat.
///
/// `motif` is the expected repeat unit, a comma-separated list of
/// alternatives, or a pattern where `*` matches any base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locus {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub motif: String,
    pub origin: LocusOrigin,
    pub label: Option<String>,
    pub variant_id: Option<String>,
}

/// Identity of a locus for grouping and de-duplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocusKey {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
}

impl Locus {
    pub fn new(chrom: &str, start: i64, end: i64, motif: &str, origin: LocusOrigin) -> Self {
        Self {
            chrom: chrom.to_string(),
            start,
            end,
            motif: motif.to_string(),
            origin,
            label: None,
            variant_id: None,
        }
    }

    pub fn key(&self) -> LocusKey {
        LocusKey {
            chrom: self.chrom.clone(),
            start: self.start,
            end: self.end,
        }
    }

    /// The alternative motifs listed for this locus
    pub fn expected_motifs(&self) -> Vec<&str> {
        self.motif.split(',').filter(|m| !m.is_empty()).collect()
    }

    /// Loci whose motif is a pattern are genotyped by pattern matching
    pub fn is_wildcard(&self) -> bool {
        self.motif.contains('*')
    }

    pub fn span(&self) -> i64 {
        self.end - self.start
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}
