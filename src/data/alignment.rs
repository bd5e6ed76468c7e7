// alignment.rs - Read alignment records and indexed BAM access

use crate::error::{Result, TreError};
use log::debug;
use rust_htslib::bam::record::{Cigar, CigarString, CigarStringView};
use rust_htslib::bam::{self, Read as BamRead};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which end of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipEnd {
    Start,
    End,
}

/// Direction to walk when searching for an aligned base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Left,
    Right,
}

/// Position pair of an aligned base: (query, reference)
pub type AlignedPair = (i64, i64);

const SA_TAG: &[u8] = b"SA";

/// A read alignment against the reference.
///
/// `reference_start` is 0-based. Query coordinates exclude hard clips and
/// follow alignment orientation.
#[derive(Debug, Clone)]
pub struct AlignmentRecord {
    pub query_name: String,
    pub chrom: String,
    pub reference_start: i64,
    pub cigar: CigarStringView,
    pub query_sequence: Option<String>,
    pub is_reverse: bool,
    pub is_supplementary: bool,
    /// Read has other alignments recorded in an SA tag
    pub has_supplementary: bool,
}

impl AlignmentRecord {
    /// Build a record from a SAM text CIGAR
    pub fn new(query_name: &str, chrom: &str, reference_start: i64, cigar: &str) -> Result<Self> {
        let cigar = CigarString::try_from(cigar)
            .map_err(|e| TreError::InvalidInput(format!("{}: {}", query_name, e)))?;
        Ok(Self {
            query_name: query_name.to_string(),
            chrom: chrom.to_string(),
            reference_start,
            cigar: CigarStringView::new(cigar, reference_start),
            query_sequence: None,
            is_reverse: false,
            is_supplementary: false,
            has_supplementary: false,
        })
    }

    pub fn from_bam(chrom: &str, record: &bam::Record) -> Self {
        let seq = record.seq().as_bytes();
        Self {
            query_name: String::from_utf8_lossy(record.qname()).into_owned(),
            chrom: chrom.to_string(),
            reference_start: record.pos(),
            cigar: record.cigar(),
            query_sequence: (!seq.is_empty()).then(|| String::from_utf8_lossy(&seq).into_owned()),
            is_reverse: record.is_reverse(),
            is_supplementary: record.is_supplementary(),
            has_supplementary: record.aux(SA_TAG).is_ok(),
        }
    }

    pub fn ops(&self) -> &[Cigar] {
        &self.cigar
    }

    /// 0-based exclusive end on the reference
    pub fn reference_end(&self) -> i64 {
        self.cigar.end_pos()
    }

    /// Read length including hard clips
    pub fn infer_read_length(&self) -> i64 {
        self.ops()
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    Cigar::Match(_)
                        | Cigar::Ins(_)
                        | Cigar::SoftClip(_)
                        | Cigar::Equal(_)
                        | Cigar::Diff(_)
                        | Cigar::HardClip(_)
                )
            })
            .map(|op| op.len() as i64)
            .sum()
    }

    pub fn leading_hard_clip(&self) -> i64 {
        self.cigar.leading_hardclips()
    }

    /// Index of the first aligned query base
    pub fn query_alignment_start(&self) -> i64 {
        self.cigar.leading_softclips()
    }

    /// Index past the last aligned query base
    pub fn query_alignment_end(&self) -> i64 {
        self.infer_read_length()
            - self.cigar.leading_hardclips()
            - self.cigar.trailing_hardclips()
            - self.cigar.trailing_softclips()
    }

    pub fn query_alignment_length(&self) -> i64 {
        self.query_alignment_end() - self.query_alignment_start()
    }

    /// Clip length at one end, soft or hard
    pub fn clip_len(&self, end: ClipEnd) -> Option<u32> {
        let op = match end {
            ClipEnd::Start => self.ops().first(),
            ClipEnd::End => self.ops().last(),
        };
        match op {
            Some(Cigar::SoftClip(n)) | Some(Cigar::HardClip(n)) => Some(*n),
            _ => None,
        }
    }

    /// Query position aligned to a reference position, if any
    pub fn query_position_at(&self, ref_pos: i64) -> Option<i64> {
        if ref_pos < self.reference_start || ref_pos >= self.reference_end() {
            return None;
        }
        let ref_pos = u32::try_from(ref_pos).ok()?;
        self.cigar
            .read_pos(ref_pos, false, false)
            .ok()
            .flatten()
            .map(i64::from)
    }

    /// The aligned pair at `ref_pos`, or the nearest one found walking up
    /// to `max_extend` bases in `walk` direction.
    pub fn find_aligned_pair(&self, ref_pos: i64, walk: Walk, max_extend: i64) -> Option<AlignedPair> {
        for step in 0..=max_extend {
            let pos = match walk {
                Walk::Left => ref_pos - step,
                Walk::Right => ref_pos + step,
            };
            if let Some(q) = self.query_position_at(pos) {
                return Some((q, pos));
            }
        }
        None
    }
}

/// Region queries over read alignments
pub trait AlignmentSource {
    /// Alignments on `chrom` overlapping the 0-based half-open `[start, end)`
    fn fetch(&mut self, chrom: &str, start: i64, end: i64) -> Result<Vec<AlignmentRecord>>;
}

/// Coordinate-sorted BAM file with its `.bai`/`.csi` index
pub struct BamAlignments {
    reader: bam::IndexedReader,
}

impl BamAlignments {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = bam::IndexedReader::from_path(path).map_err(|e| {
            TreError::InvalidInput(format!("cannot open indexed BAM {}: {}", path.display(), e))
        })?;
        debug!("Opened {} ({} references)", path.display(), reader.header().target_count());
        Ok(Self { reader })
    }
}

impl AlignmentSource for BamAlignments {
    fn fetch(&mut self, chrom: &str, start: i64, end: i64) -> Result<Vec<AlignmentRecord>> {
        let tid = match self.reader.header().tid(chrom.as_bytes()) {
            Some(tid) => tid,
            None => {
                debug!("{} not in alignment header", chrom);
                return Ok(Vec::new());
            }
        };
        self.reader.fetch((tid, start.max(0), end))?;

        let mut records = Vec::new();
        for result in self.reader.records() {
            let record = result?;
            if record.is_unmapped() {
                continue;
            }
            records.push(AlignmentRecord::from_bam(chrom, &record));
        }
        Ok(records)
    }
}

/// Alignments held in memory, sorted by start per chromosome
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct AlignmentStore {
    by_chrom: std::collections::HashMap<String, Vec<AlignmentRecord>>,
}

#[cfg(test)]
impl AlignmentStore {
    pub fn new(records: Vec<AlignmentRecord>) -> Self {
        let mut by_chrom: std::collections::HashMap<String, Vec<AlignmentRecord>> = Default::default();
        for record in records {
            by_chrom.entry(record.chrom.clone()).or_default().push(record);
        }
        for records in by_chrom.values_mut() {
            records.sort_by_key(|r| r.reference_start);
        }
        Self { by_chrom }
    }
}

#[cfg(test)]
impl AlignmentSource for AlignmentStore {
    fn fetch(&mut self, chrom: &str, start: i64, end: i64) -> Result<Vec<AlignmentRecord>> {
        let records = match self.by_chrom.get(chrom) {
            Some(records) => records,
            None => return Ok(Vec::new()),
        };
        Ok(records
            .iter()
            .take_while(|r| r.reference_start < end)
            .filter(|r| r.reference_end() > start)
            .cloned()
            .collect())
    }
}
