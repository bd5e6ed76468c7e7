// loci.rs - Turning resolved insertions into loci

use crate::core::resolver::Resolution;
use crate::data::{InsertionCandidate, Locus, LocusKey, LocusOrigin, Variant, TRE_LABEL};
use crate::tools::MotifLengthRange;
use log::debug;
use std::collections::{BTreeSet, HashSet};

/// Label a candidate as a repeat expansion and move it to the resolved span
pub fn annotate_candidate(candidate: &mut InsertionCandidate, resolution: &Resolution, range: MotifLengthRange) {
    candidate.label = Some(TRE_LABEL.to_string());
    let mut motifs: Vec<String> = Vec::new();
    for motif in &resolution.motifs {
        if range.contains(motif) && !motifs.contains(motif) {
            motifs.push(motif.clone());
        }
    }
    candidate.motifs = motifs;
    if let (Some(start), Some(end)) = (resolution.genome_start, resolution.genome_end) {
        candidate.pos = start;
        candidate.end = end;
    }
}

struct MergedLocus {
    chrom: String,
    start: i64,
    end: i64,
    motifs: BTreeSet<String>,
}

/// Merge repeat-labelled candidates lying within `merge_distance` of each
/// other into loci.
///
/// Each merged locus carries the distinct motifs of its members, comma
/// joined. Loci whose shortest motif is below `min_motif_len` are dropped
/// and exact duplicates collapse to the first.
pub fn consolidate_loci(candidates: &[InsertionCandidate], merge_distance: i64, min_motif_len: usize) -> Vec<Locus> {
    let mut records: Vec<(&str, i64, i64, &str)> = candidates
        .iter()
        .filter(|c| c.is_tre())
        .flat_map(|c| c.motifs.iter().map(move |m| (c.chrom.as_str(), c.pos, c.end, m.as_str())))
        .collect();
    records.sort();

    let mut merged: Vec<MergedLocus> = Vec::new();
    for (chrom, start, end, motif) in records {
        match merged.last_mut() {
            Some(cur) if cur.chrom == chrom && start <= cur.end + merge_distance => {
                cur.end = cur.end.max(end);
                cur.motifs.insert(motif.to_string());
            }
            _ => merged.push(MergedLocus {
                chrom: chrom.to_string(),
                start,
                end,
                motifs: [motif.to_string()].into_iter().collect(),
            }),
        }
    }

    let mut seen: HashSet<(LocusKey, String)> = HashSet::new();
    let mut loci = Vec::new();
    for m in merged {
        let shortest = m.motifs.iter().map(|s| s.len()).min().unwrap_or(0);
        if shortest < min_motif_len {
            debug!("Dropping {}:{}-{} with motif of length {}", m.chrom, m.start, m.end, shortest);
            continue;
        }
        let motif = m.motifs.iter().cloned().collect::<Vec<_>>().join(",");
        let locus = Locus::new(&m.chrom, m.start, m.end, &motif, LocusOrigin::Insertion);
        if seen.insert((locus.key(), motif)) {
            loci.push(locus);
        }
    }
    loci
}

/// Keep the first variant of each (chrom, start, end)
pub fn remove_redundants(variants: Vec<Variant>) -> Vec<Variant> {
    let mut seen: HashSet<LocusKey> = HashSet::new();
    variants.into_iter().filter(|v| seen.insert(v.locus.key())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tre(chrom: &str, pos: i64, end: i64, motifs: &[&str]) -> InsertionCandidate {
        let mut c = InsertionCandidate::new(chrom, pos, end, "r", "ACGT", "ACGT");
        c.label = Some(TRE_LABEL.to_string());
        c.motifs = motifs.iter().map(|m| m.to_string()).collect();
        c
    }

    fn variant(chrom: &str, start: i64, end: i64, motif: &str) -> Variant {
        Variant {
            locus: Locus::new(chrom, start, end, motif, LocusOrigin::Insertion),
            alleles: Vec::new(),
            motif: motif.to_string(),
            genotype: Vec::new(),
        }
    }

    #[test]
    fn test_annotate_candidate() {
        let mut c = InsertionCandidate::new("chr1", 500, 501, "r1", "CAGCAG", "NNN");
        let res = Resolution {
            motifs: vec!["CAG".into(), "A".into(), "CAG".into(), "AGC".into()],
            genome_start: Some(480),
            genome_end: Some(530),
        };
        annotate_candidate(&mut c, &res, MotifLengthRange::new(2, 50));
        assert!(c.is_tre());
        assert_eq!(c.motifs, vec!["CAG", "AGC"]);
        assert_eq!((c.pos, c.end), (480, 530));

        let mut c = InsertionCandidate::new("chr1", 500, 501, "r1", "CAGCAG", "NNN");
        let res = Resolution {
            motifs: vec!["CAG".into()],
            genome_start: Some(480),
            genome_end: None,
        };
        annotate_candidate(&mut c, &res, MotifLengthRange::new(2, 50));
        assert_eq!((c.pos, c.end), (500, 501));
    }

    #[test]
    fn test_nearby_candidates_merge() {
        let candidates = vec![
            tre("chr1", 1000, 1050, &["CAG"]),
            tre("chr1", 1150, 1200, &["AGC"]),
            tre("chr1", 1301, 1400, &["CAG"]),
            tre("chr2", 1000, 1050, &["CAG"]),
        ];
        let loci = consolidate_loci(&candidates, 100, 2);
        assert_eq!(loci.len(), 3);
        assert_eq!((loci[0].start, loci[0].end), (1000, 1200));
        assert_eq!(loci[0].motif, "AGC,CAG");
        assert_eq!((loci[1].start, loci[1].end), (1301, 1400));
        assert_eq!(loci[2].chrom, "chr2");
        assert!(loci.iter().all(|l| l.origin == LocusOrigin::Insertion));
    }

    #[test]
    fn test_short_motif_drops_locus() {
        let candidates = vec![tre("chr1", 1000, 1050, &["CAG"]), tre("chr1", 1020, 1060, &["CA"])];
        assert!(consolidate_loci(&candidates, 100, 3).is_empty());
        assert_eq!(consolidate_loci(&candidates, 100, 2).len(), 1);
    }

    #[test]
    fn test_unlabelled_candidates_ignored() {
        let mut plain = tre("chr1", 1000, 1050, &["CAG"]);
        plain.label = None;
        assert!(consolidate_loci(&[plain], 100, 2).is_empty());
    }

    #[test]
    fn test_remove_redundants_keeps_first() {
        let variants = vec![
            variant("chr1", 100, 200, "CAG"),
            variant("chr1", 100, 200, "AGC"),
            variant("chr1", 100, 201, "CAG"),
        ];
        let kept = remove_redundants(variants);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].motif, "CAG");
        assert_eq!(kept[1].locus.end, 201);
    }
}
