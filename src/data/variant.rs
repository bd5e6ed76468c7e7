// variant.rs - Evidence, per-read alleles and per-locus variants

use crate::data::locus::Locus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read orientation relative to the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_reverse(is_reverse: bool) -> Self {
        if is_reverse {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, Strand::Reverse)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// What part of a read or genome an evidence sequence represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceKind {
    /// Inserted sequence of a candidate insertion
    Insertion,
    /// Read sequence flanking the insertion
    QueryFlank,
    /// Genome sequence around the insertion breakpoint
    TargetFlank,
    /// Read segment spanning a locus plus flanks (genotyping)
    LocusSpan,
}

impl EvidenceKind {
    /// One-letter tag used in repeat finder sequence ids
    pub fn tag(&self) -> char {
        match self {
            EvidenceKind::Insertion => 'i',
            EvidenceKind::QueryFlank => 'q',
            EvidenceKind::TargetFlank => 't',
            EvidenceKind::LocusSpan => 's',
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "i" => Some(EvidenceKind::Insertion),
            "q" => Some(EvidenceKind::QueryFlank),
            "t" => Some(EvidenceKind::TargetFlank),
            "s" => Some(EvidenceKind::LocusSpan),
            _ => None,
        }
    }
}

/// A nucleotide sequence handed to the repeat finder, with the anchors
/// needed to map repeat coordinates back to the read and the genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSequence {
    pub kind: EvidenceKind,
    pub seq: String,
    pub read: String,
    /// Read-local position of the first base of `seq`
    pub read_offset: i64,
    pub strand: Strand,
    pub read_len: i64,
    /// Genome positions anchoring the first and last base
    pub genome_bounds: Option<(i64, i64)>,
}

impl EvidenceSequence {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Map a read-local start into the read's own orientation.
///
/// Reverse-strand reads are stored reverse complemented, so their start is
/// reflected through the read length.
pub fn reflect_read_start(read_start: i64, size: i64, read_len: i64, strand: Strand) -> i64 {
    match strand {
        Strand::Forward => read_start,
        Strand::Reverse => read_len - read_start - size + 1,
    }
}

/// One read's repeat observation at one locus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlleleObservation {
    pub read: String,
    pub read_start: i64,
    /// Motifs of the longest matching repeats, in report order
    pub motifs: Vec<String>,
    pub size: i64,
    pub genome_start: i64,
    pub genome_end: i64,
    pub strand: Strand,
    /// Size in units of the variant's canonical motif
    pub copy_number: f64,
}

/// One genotype cluster reported by a genotyper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenotypeCluster {
    pub value: f64,
    pub support: usize,
    pub ci: (f64, f64),
}

/// A locus with its supporting reads and genotype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub locus: Locus,
    pub alleles: Vec<AlleleObservation>,
    pub motif: String,
    pub genotype: Vec<GenotypeCluster>,
}

impl Variant {
    pub fn support(&self) -> usize {
        self.alleles.len()
    }

    /// Genotype as `value(support)` pairs joined by `;`
    pub fn genotype_summary(&self) -> String {
        if self.genotype.is_empty() {
            return "-".to_string();
        }
        self.genotype
            .iter()
            .map(|c| format!("{:.1}({})", c.value, c.support))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Move the locus to the median genome bounds of its alleles
    pub fn update_coords(&mut self) {
        if self.alleles.is_empty() {
            return;
        }
        let mut starts: Vec<i64> = self.alleles.iter().map(|a| a.genome_start).collect();
        let mut ends: Vec<i64> = self.alleles.iter().map(|a| a.genome_end).collect();
        starts.sort_unstable();
        ends.sort_unstable();
        let start = starts[starts.len() / 2];
        let end = ends[ends.len() / 2];
        if start < end {
            self.locus.start = start;
            self.locus.end = end;
        }
    }

    /// Some well-supported cluster exceeds the reference span by `min_expansion` bp
    pub fn above_min_expansion(&self, min_expansion: i64, min_support: usize, in_size: bool) -> bool {
        let reference = self.locus.span() as f64;
        let unit = self.motif.len().max(1) as f64;
        self.genotype.iter().any(|c| {
            let size = if in_size { c.value } else { c.value * unit };
            c.support >= min_support && size - reference >= min_expansion as f64
        })
    }
}
