// evidence.rs - Collecting locus-spanning read segments for genotyping

use crate::core::config::AnalysisConfig;
use crate::core::rescue::{extract_missed_clipped, MissedClip};
use crate::data::{
    read_segment, AlignmentRecord, AlignmentSource, ClipEnd, EvidenceKind, EvidenceSequence, Locus, SequenceSource,
    Strand, Walk,
};
use crate::error::{Result, TreError};
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Window around a locus searched for alignments and split ends
pub const SPLIT_WINDOW: i64 = 500;
/// Margin a single alignment must extend past the locus on both sides
pub const SPAN_MARGIN: i64 = 100;
/// Clip length marking an alignment end as a split
pub const MIN_SPLIT_CLIP: u32 = 400;
const SPLIT_ANCHOR_EXTEND: i64 = 200;
const SPAN_ANCHOR_EXTEND: i64 = 50;

/// An evidence sequence tied to the locus it was collected for
#[derive(Debug, Clone, PartialEq)]
pub struct LocusEvidence {
    /// Index into the batch's loci
    pub locus: usize,
    pub evidence: EvidenceSequence,
}

/// Everything gathered from the alignments of one batch
#[derive(Debug, Clone, Default)]
pub struct CollectedEvidence {
    pub sequences: Vec<LocusEvidence>,
    pub missed: Vec<MissedClip>,
    /// Whole read sequences, kept for pattern loci
    pub read_seqs: HashMap<String, String>,
}

/// `<prefix><index>` identifiers handed to external tools
pub fn parse_evidence_id(id: &str, prefix: &str) -> Option<usize> {
    id.strip_prefix(prefix)?.parse().ok()
}

/// Slices reads either from alignment records or from read FASTA files
pub struct ReadFetcher<'a> {
    reads: Option<&'a mut dyn SequenceSource>,
}

impl<'a> ReadFetcher<'a> {
    pub fn new(reads: Option<&'a mut dyn SequenceSource>) -> Self {
        Self { reads }
    }

    pub fn has_reads(&self) -> bool {
        self.reads.is_some()
    }

    /// Read bases `[start, end)` in full-read coordinates (leading hard
    /// clip included). `None` when the read cannot supply them.
    pub fn slice(&mut self, aln: &AlignmentRecord, start: i64, end: i64) -> Result<Option<String>> {
        if let Some(reads) = self.reads.as_deref_mut() {
            return match read_segment(reads, &aln.query_name, aln.is_reverse, start, end) {
                Ok(seq) if !seq.is_empty() => Ok(Some(seq)),
                Ok(_) => Ok(None),
                Err(TreError::MissingSequence(name)) => {
                    debug!("Read {} not found in read sequences", name);
                    Ok(None)
                }
                Err(e) => Err(e),
            };
        }

        let seq = match &aln.query_sequence {
            Some(seq) => seq,
            None => return Ok(None),
        };
        let hard_clip = aln.leading_hard_clip();
        let start = start - hard_clip;
        let end = (end - hard_clip).min(seq.len() as i64);
        if start < 0 || start >= end {
            return Ok(None);
        }
        Ok(seq.get(start as usize..end as usize).map(|s| s.to_string()))
    }
}

/// Alignment end clipped by a long split at a locus
pub fn is_split_candidate(aln: &AlignmentRecord, end: ClipEnd) -> bool {
    aln.has_supplementary && aln.clip_len(end).is_some_and(|n| n >= MIN_SPLIT_CLIP)
}

/// Which end of an alignment to test for a split, when exactly one falls in the window
fn split_end_in_window(aln: &AlignmentRecord, lo: i64, hi: i64) -> Option<ClipEnd> {
    let in_window = |p: i64| p >= lo && p <= hi;
    match (in_window(aln.reference_start), in_window(aln.reference_end())) {
        (true, false) => Some(ClipEnd::Start),
        (false, true) => Some(ClipEnd::End),
        _ => None,
    }
}

fn locus_evidence(locus: usize, aln: &AlignmentRecord, seq: String, read_start: i64, bounds: (i64, i64)) -> LocusEvidence {
    LocusEvidence {
        locus,
        evidence: EvidenceSequence {
            kind: EvidenceKind::LocusSpan,
            seq,
            read: aln.query_name.clone(),
            read_offset: read_start,
            strand: Strand::from_reverse(aln.is_reverse),
            read_len: aln.infer_read_length(),
            genome_bounds: Some(bounds),
        },
    }
}

/// Segment of one alignment between two reference positions
fn extract_subseq(
    aln: &AlignmentRecord,
    target_start: i64,
    target_end: i64,
    reads: &mut ReadFetcher<'_>,
) -> Result<Option<(String, i64, (i64, i64))>> {
    let covers = |p: i64| p >= aln.reference_start && p <= aln.reference_end();
    let start = if covers(target_start) {
        aln.find_aligned_pair(target_start, Walk::Left, SPAN_ANCHOR_EXTEND)
    } else {
        None
    };
    let end = if covers(target_end) {
        aln.find_aligned_pair(target_end, Walk::Right, SPAN_ANCHOR_EXTEND)
    } else {
        None
    };

    let ((qstart, tstart), (qend, tend)) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        _ => return Ok(None),
    };
    let hard_clip = aln.leading_hard_clip();
    let (qstart, qend) = (qstart + hard_clip, qend + hard_clip);
    Ok(reads.slice(aln, qstart, qend)?.map(|seq| (seq, qstart, (tstart, tend))))
}

#[derive(Default)]
struct SplitPieces<'a> {
    /// Piece whose start is clipped (downstream of the insertion)
    start: Option<&'a AlignmentRecord>,
    /// Piece whose end is clipped (upstream of the insertion)
    end: Option<&'a AlignmentRecord>,
}

/// Gather evidence for every locus of a batch
pub fn collect_evidence(
    loci: &[Locus],
    alignments: &mut dyn AlignmentSource,
    reads: &mut ReadFetcher<'_>,
    config: &AnalysisConfig,
) -> Result<CollectedEvidence> {
    let mut collected = CollectedEvidence::default();
    for (idx, locus) in loci.iter().enumerate() {
        collect_locus(idx, locus, alignments, reads, config, &mut collected)?;
    }
    debug!(
        "Collected {} evidence sequences, {} clipped reads for rescue",
        collected.sequences.len(),
        collected.missed.len()
    );
    Ok(collected)
}

fn collect_locus(
    idx: usize,
    locus: &Locus,
    alignments: &mut dyn AlignmentSource,
    reads: &mut ReadFetcher<'_>,
    config: &AnalysisConfig,
    out: &mut CollectedEvidence,
) -> Result<()> {
    let flank = config.flank_size;
    let (lo, hi) = (locus.start - SPLIT_WINDOW, locus.end + SPLIT_WINDOW);
    let alns: Vec<AlignmentRecord> = alignments
        .fetch(&locus.chrom, lo, hi)?
        .into_iter()
        .filter(|a| reads.has_reads() || a.query_sequence.is_some())
        .collect();

    if locus.is_wildcard() {
        for aln in &alns {
            if let Some(seq) = &aln.query_sequence {
                out.read_seqs.insert(aln.query_name.clone(), seq.clone());
            }
        }
    }

    let mut splits: BTreeMap<&str, SplitPieces<'_>> = BTreeMap::new();
    if config.check_split {
        for aln in &alns {
            if let Some(end) = split_end_in_window(aln, lo, hi) {
                if is_split_candidate(aln, end) {
                    let pieces = splits.entry(aln.query_name.as_str()).or_default();
                    match end {
                        ClipEnd::Start => pieces.start = Some(aln),
                        ClipEnd::End => pieces.end = Some(aln),
                    }
                }
            }
        }
    }

    let mut out_of_order: HashSet<&str> = HashSet::new();
    for (read, pieces) in &splits {
        match (pieces.end, pieces.start) {
            (Some(up), Some(down)) => {
                if up.is_reverse != down.is_reverse {
                    continue;
                }
                if !reads.has_reads() && up.query_alignment_end() >= down.query_alignment_start() {
                    out_of_order.insert(*read);
                    continue;
                }
                let left = up.find_aligned_pair(locus.start - flank, Walk::Left, SPLIT_ANCHOR_EXTEND);
                let right = down.find_aligned_pair(locus.end + flank, Walk::Right, SPLIT_ANCHOR_EXTEND);
                match (left, right) {
                    (Some((q1, t1)), Some((q2, t2))) => {
                        let qstart = q1 + up.leading_hard_clip();
                        let qend = q2 + down.leading_hard_clip();
                        match reads.slice(up, qstart, qend)? {
                            Some(seq) => out.sequences.push(locus_evidence(idx, up, seq, qstart, (t1, t2))),
                            None => debug!("No bridged sequence for {} at {}", read, locus),
                        }
                    }
                    _ => {
                        let (aln, end) = if up.query_alignment_length() > down.query_alignment_length() {
                            (up, ClipEnd::End)
                        } else {
                            (down, ClipEnd::Start)
                        };
                        if let Some(missed) = extract_missed_clipped(idx, locus, aln, end, flank, reads)? {
                            out.missed.push(missed);
                        }
                    }
                }
            }
            (Some(aln), None) => {
                if let Some(missed) = extract_missed_clipped(idx, locus, aln, ClipEnd::End, flank, reads)? {
                    out.missed.push(missed);
                }
            }
            (None, Some(aln)) => {
                if let Some(missed) = extract_missed_clipped(idx, locus, aln, ClipEnd::Start, flank, reads)? {
                    out.missed.push(missed);
                }
            }
            (None, None) => {}
        }
    }

    // out-of-order split pieces do not block the read from spanning evidence
    let split_reads: HashSet<&str> = splits
        .keys()
        .copied()
        .filter(|read| !out_of_order.contains(read))
        .collect();

    for aln in &alns {
        if aln.reference_start > locus.start - SPAN_MARGIN || aln.reference_end() < locus.end + SPAN_MARGIN {
            continue;
        }
        if split_reads.contains(aln.query_name.as_str()) {
            continue;
        }
        match extract_subseq(aln, locus.start - flank, locus.end + flank, reads)? {
            Some((seq, qstart, bounds)) => out.sequences.push(locus_evidence(idx, aln, seq, qstart, bounds)),
            None => debug!("No spanning sequence for {} at {}", aln.query_name, locus),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AlignmentStore, LocusOrigin, SequenceMap};

    fn aln(name: &str, start: i64, cigar: &str, seq_len: usize) -> AlignmentRecord {
        let mut a = AlignmentRecord::new(name, "chr1", start, cigar).unwrap();
        a.query_sequence = Some("ACGT".repeat(seq_len / 4 + 1)[..seq_len].to_string());
        a
    }

    fn locus() -> Locus {
        Locus::new("chr1", 1000, 1060, "CAG", LocusOrigin::UserSupplied)
    }

    #[test]
    fn test_parse_evidence_id() {
        assert_eq!(parse_evidence_id("e12", "e"), Some(12));
        assert_eq!(parse_evidence_id("m3", "e"), None);
        assert_eq!(parse_evidence_id("e", "e"), None);
        assert_eq!(parse_evidence_id("ex", "e"), None);
    }

    #[test]
    fn test_spanning_alignment_evidence() {
        let mut store = AlignmentStore::new(vec![aln("r1", 500, "1000M", 1000), aln("short", 950, "200M", 200)]);
        let mut reads = ReadFetcher::new(None);
        let config = AnalysisConfig::default();
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &config).unwrap();

        assert_eq!(collected.sequences.len(), 1);
        let ev = &collected.sequences[0].evidence;
        assert_eq!(ev.read, "r1");
        assert_eq!(ev.read_offset, 400);
        assert_eq!(ev.genome_bounds, Some((900, 1160)));
        assert_eq!(ev.seq.len(), 260);
        assert!(collected.missed.is_empty());
    }

    #[test]
    fn test_hard_clip_offsets_read_start() {
        let mut a = aln("r1", 500, "100H1000M", 1000);
        a.is_reverse = true;
        let mut store = AlignmentStore::new(vec![a]);
        let mut reads = ReadFetcher::new(None);
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();
        let ev = &collected.sequences[0].evidence;
        assert_eq!(ev.read_offset, 500);
        assert_eq!(ev.read_len, 1100);
        assert_eq!(ev.strand, Strand::Reverse);
        assert_eq!(ev.seq.len(), 260);
    }

    #[test]
    fn test_split_pair_is_bridged() {
        // upstream piece: ref 400..1030, query 0..630, tail clipped
        let mut up = aln("r1", 400, "630M900S", 1530);
        up.has_supplementary = true;
        // downstream piece: query 1000..1530 maps to ref 1040..1570
        let mut down = aln("r1", 1040, "1000S530M", 1530);
        down.has_supplementary = true;
        let mut store = AlignmentStore::new(vec![up, down]);
        let mut reads = ReadFetcher::new(None);
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();

        assert_eq!(collected.sequences.len(), 1);
        let ev = &collected.sequences[0].evidence;
        // ref 900 -> query 500 on the upstream piece, ref 1160 -> query 1120 downstream
        assert_eq!(ev.read_offset, 500);
        assert_eq!(ev.genome_bounds, Some((900, 1160)));
        assert_eq!(ev.seq.len(), 620);
    }

    #[test]
    fn test_out_of_order_split_still_spans() {
        // downstream piece starts at query 500, before the upstream piece ends at 630
        let mut up = aln("r1", 400, "630M900S", 1530);
        up.has_supplementary = true;
        let mut down = aln("r1", 1040, "500S530M", 1030);
        down.has_supplementary = true;
        let spanning = aln("r1", 500, "1000M", 1000);
        let mut store = AlignmentStore::new(vec![up, down, spanning]);
        let mut reads = ReadFetcher::new(None);
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();

        assert_eq!(collected.sequences.len(), 1);
        let ev = &collected.sequences[0].evidence;
        assert_eq!(ev.read, "r1");
        assert_eq!(ev.read_offset, 400);
        assert_eq!(ev.genome_bounds, Some((900, 1160)));
        assert_eq!(ev.seq.len(), 260);
        assert!(collected.missed.is_empty());
    }

    #[test]
    fn test_bridged_read_skips_its_spanning_alignment() {
        let mut up = aln("r1", 400, "630M900S", 1530);
        up.has_supplementary = true;
        let mut down = aln("r1", 1040, "1000S530M", 1530);
        down.has_supplementary = true;
        let spanning = aln("r1", 500, "1000M", 1000);
        let mut store = AlignmentStore::new(vec![up, down, spanning]);
        let mut reads = ReadFetcher::new(None);
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();

        assert_eq!(collected.sequences.len(), 1);
        assert_eq!(collected.sequences[0].evidence.seq.len(), 620);
    }

    #[test]
    fn test_single_split_becomes_missed_clip() {
        let mut up = aln("r1", 400, "630M900S", 1530);
        up.has_supplementary = true;
        let mut store = AlignmentStore::new(vec![up]);
        let mut reads = ReadFetcher::new(None);
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();
        assert!(collected.sequences.is_empty());
        assert_eq!(collected.missed.len(), 1);
        assert_eq!(collected.missed[0].clipped_end, ClipEnd::End);
        assert_eq!(collected.missed[0].read_start, 500);
    }

    #[test]
    fn test_split_without_supplementary_is_ignored() {
        let up = aln("r1", 400, "630M900S", 1530);
        let mut store = AlignmentStore::new(vec![up]);
        let mut reads = ReadFetcher::new(None);
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();
        assert!(collected.sequences.is_empty());
        assert!(collected.missed.is_empty());
    }

    #[test]
    fn test_read_fasta_used_when_given() {
        let mut a = AlignmentRecord::new("r1", "chr1", 500, "1000M").unwrap();
        a.query_sequence = None;
        let mut store = AlignmentStore::new(vec![a]);
        let mut map = SequenceMap::new();
        map.insert("r1", &"T".repeat(1000));
        let mut reads = ReadFetcher::new(Some(&mut map));
        let collected = collect_evidence(&[locus()], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();
        assert_eq!(collected.sequences[0].evidence.seq, "T".repeat(260));
    }

    #[test]
    fn test_wildcard_locus_keeps_read_sequences() {
        let mut store = AlignmentStore::new(vec![aln("r1", 500, "1000M", 1000)]);
        let mut reads = ReadFetcher::new(None);
        let generic = Locus::new("chr1", 1000, 1060, "GGC*", LocusOrigin::UserSupplied);
        let collected = collect_evidence(&[generic], &mut store, &mut reads, &AnalysisConfig::default()).unwrap();
        assert_eq!(collected.read_seqs.get("r1").map(|s| s.len()), Some(1000));
    }
}
