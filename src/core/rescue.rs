// rescue.rs - Recovering repeat evidence from clipped alignments

use crate::core::config::AnalysisConfig;
use crate::core::evidence::{parse_evidence_id, ReadFetcher};
use crate::data::{AlignmentRecord, ClipEnd, EvidenceKind, EvidenceSequence, Locus, SequenceSource, Strand, Walk};
use crate::error::{Result, TreError};
use crate::tools::{AlignParams, LocalAligner, LocalHit, Workspace};
use log::debug;
use std::collections::BTreeMap;

/// Fraction of the probe a hit must cover
pub const MIN_MAPPED: f64 = 0.7;
/// Largest accepted e-value for a probe hit
pub const MAX_EVALUE: f64 = 1e-10;
/// How far to walk for an aligned anchor base
const ANCHOR_EXTEND: i64 = 200;
const ID_PREFIX: &str = "m";

/// Read tail of an alignment clipped at a locus, kept for rescue
#[derive(Debug, Clone, PartialEq)]
pub struct MissedClip {
    pub locus: usize,
    pub clipped_end: ClipEnd,
    pub read: String,
    /// Full-read coordinates of `seq`
    pub read_start: i64,
    pub read_end: i64,
    /// Reference position of the anchor base
    pub anchor_ref: i64,
    pub seq: String,
    pub read_len: i64,
    pub strand: Strand,
    pub aln_start: i64,
    pub aln_end: i64,
}

/// Part of a missed clip confirmed by probe alignment
#[derive(Debug, Clone, PartialEq)]
pub struct RescuedSegment {
    /// Index into the missed clips the segment came from
    pub missed: usize,
    pub read_start: i64,
    pub read_end: i64,
    pub genome_start: i64,
    pub genome_end: i64,
    pub seq: String,
}

impl RescuedSegment {
    pub fn to_evidence(&self, clip: &MissedClip) -> EvidenceSequence {
        EvidenceSequence {
            kind: EvidenceKind::LocusSpan,
            seq: self.seq.clone(),
            read: clip.read.clone(),
            read_offset: self.read_start,
            strand: clip.strand,
            read_len: clip.read_len,
            genome_bounds: Some((self.genome_start, self.genome_end)),
        }
    }
}

/// Read sequence from the anchor before the locus to the end of the read.
///
/// Only alignments clipped at their end are rescued; pieces clipped at
/// their start return `None`.
pub fn extract_missed_clipped(
    locus_idx: usize,
    locus: &Locus,
    aln: &AlignmentRecord,
    clipped_end: ClipEnd,
    flank: i64,
    reads: &mut ReadFetcher<'_>,
) -> Result<Option<MissedClip>> {
    if aln.clip_len(clipped_end).is_none() {
        return Ok(None);
    }
    if clipped_end == ClipEnd::Start {
        return Ok(None);
    }

    let (q, anchor_ref) = match aln.find_aligned_pair(locus.start - flank, Walk::Left, ANCHOR_EXTEND) {
        Some(pair) => pair,
        None => return Ok(None),
    };
    let read_len = aln.infer_read_length();
    let read_start = q + aln.leading_hard_clip();
    let seq = match reads.slice(aln, read_start, read_len)? {
        Some(seq) => seq,
        None => return Ok(None),
    };

    Ok(Some(MissedClip {
        locus: locus_idx,
        clipped_end,
        read: aln.query_name.clone(),
        read_start,
        read_end: read_len,
        anchor_ref,
        seq,
        read_len,
        strand: Strand::from_reverse(aln.is_reverse),
        aln_start: aln.reference_start,
        aln_end: aln.reference_end(),
    }))
}

/// Genome interval probed on the clipped side of a locus
pub fn probe_coords(locus: &Locus, clipped_end: ClipEnd, flank: i64) -> (i64, i64) {
    match clipped_end {
        ClipEnd::Start => {
            let end = locus.start - 1;
            (end - flank, end)
        }
        ClipEnd::End => (locus.end, locus.end + flank),
    }
}

/// Whether the clipped alignment ends far enough from the repeat to trust
pub fn clear_of_locus(clip: &MissedClip, locus: &Locus, closeness: i64) -> bool {
    clip.aln_start + closeness <= locus.start || clip.aln_end - closeness >= locus.end
}

struct Probe {
    start: i64,
    end: i64,
    len: usize,
}

/// Align genome probes against clipped read tails and cut each tail at
/// the best acceptable probe hit.
pub fn rescue_missed_clipped(
    missed: &[MissedClip],
    loci: &[Locus],
    genome: &mut dyn SequenceSource,
    aligner: &dyn LocalAligner,
    workspace: &mut Workspace,
    config: &AnalysisConfig,
) -> Result<Vec<RescuedSegment>> {
    let mut query_fa = String::new();
    let mut target_fa = String::new();
    let mut probes: Vec<Option<Probe>> = Vec::with_capacity(missed.len());

    for (i, clip) in missed.iter().enumerate() {
        let locus = &loci[clip.locus];
        let (start, end) = probe_coords(locus, clip.clipped_end, config.flank_size);
        let pseq = match genome.fetch(&locus.chrom, start.max(0), end) {
            Ok(seq) => seq,
            Err(TreError::MissingSequence(name)) => {
                debug!("No genome sequence {} for probe at {}", name, locus);
                probes.push(None);
                continue;
            }
            Err(e) => return Err(e),
        };
        if pseq.is_empty() {
            probes.push(None);
            continue;
        }
        target_fa.push_str(&format!(">{}{}\n{}\n", ID_PREFIX, i, clip.seq));
        query_fa.push_str(&format!(">{}{}\n{}\n", ID_PREFIX, i, pseq));
        probes.push(Some(Probe {
            start,
            end,
            len: pseq.len(),
        }));
    }

    if query_fa.is_empty() {
        return Ok(Vec::new());
    }

    let hits = aligner.align(&query_fa, &target_fa, &AlignParams::probe_search(), workspace)?;

    let mut by_clip: BTreeMap<usize, Vec<&LocalHit>> = BTreeMap::new();
    for hit in &hits {
        if hit.query_id != hit.subject_id {
            continue;
        }
        match parse_evidence_id(&hit.query_id, ID_PREFIX) {
            Some(i) if i < missed.len() => by_clip.entry(i).or_default().push(hit),
            _ => debug!("Skipping probe hit with unexpected id {}", hit.query_id),
        }
    }

    let mut rescued = Vec::new();
    for (i, group) in by_clip {
        let probe = match &probes[i] {
            Some(probe) => probe,
            None => continue,
        };
        let clip = &missed[i];
        let best = group
            .iter()
            .find(|h| h.align_len as f64 / probe.len as f64 >= MIN_MAPPED && h.evalue <= MAX_EVALUE);
        let best = match best {
            Some(best) => best,
            None => {
                debug!("Rescue rejected for {} at {}", clip.read, loci[clip.locus]);
                continue;
            }
        };

        let segment = match clip.clipped_end {
            ClipEnd::Start => clip.seq.get(best.s_start..).map(|seq| RescuedSegment {
                missed: i,
                read_start: clip.read_start + best.s_start as i64,
                read_end: clip.read_end,
                genome_start: probe.start,
                genome_end: clip.anchor_ref,
                seq: seq.to_string(),
            }),
            ClipEnd::End => clip.seq.get(..best.s_end).map(|seq| RescuedSegment {
                missed: i,
                read_start: clip.read_start,
                read_end: clip.read_start + best.s_end as i64,
                genome_start: clip.anchor_ref,
                genome_end: probe.end,
                seq: seq.to_string(),
            }),
        };
        if let Some(segment) = segment {
            rescued.push(segment);
        }
    }

    debug!("Rescued {}/{} clipped reads", rescued.len(), missed.len());
    Ok(rescued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LocusOrigin, SequenceMap};
    use std::sync::Mutex;

    /// Aligner returning canned hits and recording its inputs
    struct FakeAligner {
        hits: Vec<LocalHit>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl LocalAligner for FakeAligner {
        fn align(
            &self,
            query_fasta: &str,
            subject_fasta: &str,
            _params: &AlignParams,
            _workspace: &mut Workspace,
        ) -> Result<Vec<LocalHit>> {
            self.seen
                .lock()
                .unwrap()
                .push((query_fasta.to_string(), subject_fasta.to_string()));
            Ok(self.hits.clone())
        }
    }

    fn probe_hit(id: &str, alen: usize, evalue: f64, s_start: usize, s_end: usize) -> LocalHit {
        LocalHit {
            query_id: id.to_string(),
            subject_id: id.to_string(),
            pct_identity: 99.0,
            align_len: alen,
            evalue,
            q_start: 1,
            q_end: alen,
            s_start,
            s_end,
        }
    }

    fn clip(locus: usize) -> MissedClip {
        MissedClip {
            locus,
            clipped_end: ClipEnd::End,
            read: "r1".to_string(),
            read_start: 500,
            read_end: 2000,
            anchor_ref: 900,
            seq: "A".repeat(1500),
            read_len: 2000,
            strand: Strand::Forward,
            aln_start: 100,
            aln_end: 980,
        }
    }

    fn genome() -> SequenceMap {
        let mut genome = SequenceMap::new();
        genome.insert("chr1", &"ACGT".repeat(1000));
        genome
    }

    #[test]
    fn test_probe_coords() {
        let locus = Locus::new("chr1", 1000, 1100, "CAG", LocusOrigin::UserSupplied);
        assert_eq!(probe_coords(&locus, ClipEnd::End, 100), (1100, 1200));
        assert_eq!(probe_coords(&locus, ClipEnd::Start, 100), (899, 999));
    }

    #[test]
    fn test_rescue_end_clip() {
        let loci = vec![Locus::new("chr1", 1000, 1100, "CAG", LocusOrigin::UserSupplied)];
        let aligner = FakeAligner {
            hits: vec![
                probe_hit("m0", 50, 1e-20, 300, 350),
                probe_hit("m0", 95, 1e-15, 310, 400),
                probe_hit("m0", 99, 1e-12, 320, 410),
            ],
            seen: Mutex::new(Vec::new()),
        };
        let mut ws = Workspace::new(false).unwrap();
        let mut genome = genome();
        let rescued = rescue_missed_clipped(
            &[clip(0)],
            &loci,
            &mut genome,
            &aligner,
            &mut ws,
            &AnalysisConfig::default(),
        )
        .unwrap();

        // first hit maps only half the probe
        assert_eq!(rescued.len(), 1);
        let seg = &rescued[0];
        assert_eq!(seg.read_start, 500);
        assert_eq!(seg.read_end, 900);
        assert_eq!((seg.genome_start, seg.genome_end), (900, 1200));
        assert_eq!(seg.seq.len(), 400);

        let seen = aligner.seen.lock().unwrap();
        assert!(seen[0].0.starts_with(">m0\n"));
        assert_eq!(seen[0].0.lines().nth(1).unwrap().len(), 100);
    }

    #[test]
    fn test_rescue_rejects_weak_hits() {
        let loci = vec![Locus::new("chr1", 1000, 1100, "CAG", LocusOrigin::UserSupplied)];
        let aligner = FakeAligner {
            hits: vec![
                probe_hit("m0", 95, 1e-5, 300, 400),
                probe_hit("m0", 40, 1e-30, 300, 340),
                probe_hit("junk", 95, 1e-30, 300, 400),
            ],
            seen: Mutex::new(Vec::new()),
        };
        let mut ws = Workspace::new(false).unwrap();
        let mut genome = genome();
        let rescued = rescue_missed_clipped(
            &[clip(0)],
            &loci,
            &mut genome,
            &aligner,
            &mut ws,
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert!(rescued.is_empty());
    }

    #[test]
    fn test_clear_of_locus() {
        let locus = Locus::new("chr1", 1000, 1100, "CAG", LocusOrigin::UserSupplied);
        let mut c = clip(0);
        assert!(clear_of_locus(&c, &locus, 50));
        c.aln_start = 980;
        c.aln_end = 1120;
        assert!(!clear_of_locus(&c, &locus, 50));
        c.aln_end = 1150;
        assert!(clear_of_locus(&c, &locus, 50));
    }

    #[test]
    fn test_extract_end_clipped_tail() {
        let locus = Locus::new("chr1", 1000, 1100, "CAG", LocusOrigin::UserSupplied);
        let mut aln = AlignmentRecord::new("r1", "chr1", 500, "520M600S").unwrap();
        aln.query_sequence = Some("C".repeat(1120));
        let mut reads = ReadFetcher::new(None);

        let missed = extract_missed_clipped(0, &locus, &aln, ClipEnd::End, 100, &mut reads)
            .unwrap()
            .unwrap();
        // reference 900 aligns to query 400
        assert_eq!(missed.anchor_ref, 900);
        assert_eq!(missed.read_start, 400);
        assert_eq!(missed.read_end, 1120);
        assert_eq!(missed.seq.len(), 720);
        assert_eq!(missed.aln_end, 1020);

        let start = extract_missed_clipped(0, &locus, &aln, ClipEnd::Start, 100, &mut reads).unwrap();
        assert!(start.is_none());
    }
}
