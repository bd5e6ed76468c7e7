// alleles.rs - Per-read repeat alleles and per-locus variants

use crate::core::config::AnalysisConfig;
use crate::core::evidence::{parse_evidence_id, LocusEvidence};
use crate::core::intervals::{combine_repeat_coords, widest, Span};
use crate::core::motif::{same_repeat, MotifEquivalenceIndex};
use crate::data::{reflect_read_start, AlleleObservation, EvidenceSequence, Locus, Variant};
use crate::error::{Result, TreError};
use crate::tools::{LocalAligner, RepeatFinder, RepeatHit, RepeatReport, Workspace};
use log::debug;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Hit motifs at least this long are checked against the aligner index
pub const LONG_MOTIF_LEN: usize = 15;
/// Expected motifs shorter than the aligner word size are not indexed
pub const MIN_INDEXED_MOTIF_LEN: usize = 4;
/// Expected inserts below this size use the lenient span coverage
const SMALL_INSERT: i64 = 50;
/// Strict clamping only applies to repeats longer than this
const MIN_CLAMP_SIZE: i64 = 50;
/// Largest gap between chained pattern matches
const PATTERN_MAX_SEP: usize = 100;
/// Fraction of the flank-trimmed sequence pattern matches must span
const PATTERN_MIN_COV: f64 = 0.8;
const ID_PREFIX: &str = "e";

/// Alleles per locus, first observation per read wins
#[derive(Debug, Clone, Default)]
pub struct AlleleTable {
    order: Vec<usize>,
    alleles: HashMap<usize, Vec<AlleleObservation>>,
    reads: HashMap<usize, HashSet<String>>,
}

impl AlleleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allele; returns false when the read already has one here
    pub fn insert(&mut self, locus: usize, allele: AlleleObservation) -> bool {
        let reads = self.reads.entry(locus).or_default();
        if !reads.insert(allele.read.clone()) {
            return false;
        }
        if !self.alleles.contains_key(&locus) {
            self.order.push(locus);
        }
        self.alleles.entry(locus).or_default().push(allele);
        true
    }

    pub fn get(&self, locus: usize) -> &[AlleleObservation] {
        self.alleles.get(&locus).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Loci in order of their first allele
    pub fn loci(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Align each locus' long hit motifs against its expected motifs and
/// return the equivalences found, restricted per locus.
pub fn build_locus_indices(
    loci: &[Locus],
    evidence: &[LocusEvidence],
    report: &RepeatReport,
    aligner: &dyn LocalAligner,
    workspace: &mut Workspace,
    config: &AnalysisConfig,
) -> Result<HashMap<usize, MotifEquivalenceIndex>> {
    let mut queries: HashMap<usize, HashSet<String>> = HashMap::new();
    let mut targets: HashMap<usize, BTreeSet<String>> = HashMap::new();

    for (id, hits) in report.iter() {
        let ev = match parse_evidence_id(id, ID_PREFIX).and_then(|i| evidence.get(i)) {
            Some(ev) => ev,
            None => continue,
        };
        let pattern = &loci[ev.locus].motif;
        let insert_size = ev.evidence.len() as i64 - 2 * config.flank_size;
        targets.entry(ev.locus).or_default().extend(
            pattern
                .split(',')
                .filter(|m| m.len() >= MIN_INDEXED_MOTIF_LEN)
                .map(|m| m.to_string()),
        );
        let locus_queries = queries.entry(ev.locus).or_default();
        for hit in hits {
            let small_insert_match = insert_size < SMALL_INSERT
                && pattern.len() >= 6
                && hit.motif.len() as f64 >= 0.5 * pattern.len() as f64;
            if hit.motif.len() >= LONG_MOTIF_LEN || small_insert_match {
                locus_queries.insert(hit.motif.clone());
            }
        }
    }

    let all_queries: BTreeSet<String> = queries.values().flatten().cloned().collect();
    let all_targets: BTreeSet<String> = targets.values().flatten().cloned().collect();
    let index = MotifEquivalenceIndex::build(&all_queries, &all_targets, aligner, workspace)?;

    Ok(queries
        .iter()
        .map(|(locus, motifs)| (*locus, index.restrict_to(motifs)))
        .collect())
}

/// Turn the repeat hits of one evidence sequence into an allele.
///
/// Returns `None` when no hit matches the locus motifs, the reconciled
/// span sits too far inside the sequence, or it covers too little of
/// the expected insert.
pub fn assemble_allele(
    locus: &Locus,
    ev: &EvidenceSequence,
    hits: &[RepeatHit],
    index: Option<&MotifEquivalenceIndex>,
    config: &AnalysisConfig,
) -> Option<AlleleObservation> {
    let expected = locus.expected_motifs();
    let range = config.motif_range();
    let matched: Vec<&RepeatHit> = hits
        .iter()
        .filter(|r| !r.is_degenerate() && range.contains(&r.motif))
        .filter(|r| expected.iter().any(|p| same_repeat(&r.motif, p, index)))
        .collect();
    if matched.is_empty() {
        return None;
    }

    let flank = config.flank_size;
    let seq_len = ev.len() as i64;
    let bounds = (flank, seq_len - flank);
    let spans: Vec<Span> = matched.iter().map(|r| Span::new(r.start, r.end)).collect();
    let span = widest(&combine_repeat_coords(&spans, bounds, config.merge_params()))?;

    let tolerance = config.too_far_from_read_end;
    if span.start >= bounds.0 + tolerance || span.end <= bounds.1 - tolerance {
        debug!("{} at {}: repeat {}-{} too far from read end", ev.read, locus, span.start, span.end);
        return None;
    }
    let expected_size = (seq_len - 2 * flank).abs();
    let min_span = if expected_size < SMALL_INSERT { 0.2 } else { 0.5 };
    if expected_size == 0 || (span.len() as f64 / expected_size as f64) < min_span {
        debug!("{} at {}: span {} covers too little of {}", ev.read, locus, span.len(), expected_size);
        return None;
    }

    let (gstart, gend) = ev.genome_bounds?;
    let mut size = span.len();
    let mut read_start = ev.read_offset + span.start - 1;
    let mut genome_start = gstart + span.start;
    let mut genome_end = gend - (seq_len - span.end);

    let longest = matched.iter().map(|r| r.repeat_len()).max().unwrap_or(0);
    let mut motifs: Vec<String> = Vec::new();
    for r in matched.iter().filter(|r| r.repeat_len() == longest) {
        if !motifs.contains(&r.motif) {
            motifs.push(r.motif.clone());
        }
    }

    if config.strict && genome_start < genome_end && size > MIN_CLAMP_SIZE {
        if genome_start < locus.start {
            let diff = locus.start - genome_start;
            if diff < size {
                genome_start = locus.start;
                read_start += diff;
                size -= diff;
            }
        }
        if genome_end > locus.end {
            let diff = genome_end - locus.end;
            if diff < size {
                genome_end = locus.end;
                size -= diff;
            }
        }
    }

    let read_start = reflect_read_start(read_start, size, ev.read_len, ev.strand);
    let (genome_start, genome_end) = if genome_start < genome_end {
        (genome_start, genome_end)
    } else {
        (gstart, gend)
    };

    Some(AlleleObservation {
        read: ev.read.clone(),
        read_start,
        motifs,
        size,
        genome_start,
        genome_end,
        strand: ev.strand,
        copy_number: 0.0,
    })
}

/// Chain pattern matches and report their extent and most common match.
///
/// Returns `(start, end, motif)` with inclusive positions, or `None` when
/// the chain covers less than `PATTERN_MIN_COV` of `seq`.
pub fn examine_pattern(seq: &str, pattern: &str) -> Option<(usize, usize, String)> {
    let unit_len = pattern.len();
    let re = Regex::new(&regex::escape(&pattern.to_uppercase()).replace(r"\*", "[AGCT]")).ok()?;

    let mut coords: Vec<usize> = Vec::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for m in re.find_iter(seq) {
        let chained = match coords.last() {
            None => true,
            Some(&last) => m.start() <= last + 1 + PATTERN_MAX_SEP,
        };
        if !chained {
            continue;
        }
        coords.push(m.start());
        coords.push(m.start() + unit_len - 1);
        let matched = &seq[m.start()..(m.start() + unit_len).min(seq.len())];
        match counts.iter_mut().find(|(s, _)| s == matched) {
            Some((_, n)) => *n += 1,
            None => counts.push((matched.to_string(), 1)),
        }
    }

    let (lo, hi) = (*coords.iter().min()?, *coords.iter().max()?);
    if seq.is_empty() || ((hi - lo + 1) as f64 / seq.len() as f64) < PATTERN_MIN_COV {
        return None;
    }
    let top = counts.iter().map(|(_, n)| *n).max()?;
    let motif = counts.into_iter().find(|(_, n)| *n == top)?.0;
    Some((lo, hi, motif))
}

/// Allele from pattern matching for loci with wildcard motifs.
///
/// Genome bounds are the locus bounds; the read start is found by
/// locating the matched segment in the whole read.
pub fn pattern_allele(
    locus: &Locus,
    ev: &EvidenceSequence,
    read_seq: &str,
    config: &AnalysisConfig,
) -> Option<AlleleObservation> {
    let flank = config.flank_size.max(0) as usize;
    if ev.seq.len() <= 2 * flank {
        return None;
    }
    let inner = &ev.seq[flank..ev.seq.len() - flank];
    let (lo, hi, motif) = examine_pattern(inner, &locus.motif)?;
    let matched = &inner[lo..=hi.min(inner.len() - 1)];
    let pos = read_seq.find(matched)? as i64;
    let size = matched.len() as i64;

    Some(AlleleObservation {
        read: ev.read.clone(),
        read_start: reflect_read_start(pos, size, read_seq.len() as i64, ev.strand),
        motifs: [motif].into_iter().collect(),
        size,
        genome_start: locus.start,
        genome_end: locus.end,
        strand: ev.strand,
        copy_number: 0.0,
    })
}

/// Most frequent motif across alleles; ties go to the shortest, then to
/// the first seen.
pub fn canonical_motif(alleles: &[AlleleObservation]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for allele in alleles {
        for motif in &allele.motifs {
            match counts.iter_mut().find(|(m, _)| *m == motif) {
                Some((_, n)) => *n += 1,
                None => counts.push((motif, 1)),
            }
        }
    }
    let top = counts.iter().map(|(_, n)| *n).max()?;
    counts
        .into_iter()
        .filter(|(_, n)| *n == top)
        .map(|(m, _)| m)
        .fold(None, |best: Option<&str>, m| match best {
            Some(b) if b.len() <= m.len() => Some(b),
            _ => Some(m),
        })
        .map(|m| m.to_string())
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Build variants for loci with at least `min_support` alleles
pub fn alleles_to_variants(table: &AlleleTable, loci: &[Locus], min_support: usize) -> Vec<Variant> {
    let mut variants = Vec::new();
    for &locus in table.loci() {
        let alleles = table.get(locus);
        if alleles.len() < min_support {
            continue;
        }
        let motif = match canonical_motif(alleles) {
            Some(motif) => motif,
            None => continue,
        };
        let alleles = alleles
            .iter()
            .cloned()
            .map(|mut a| {
                a.copy_number = round1(a.size as f64 / motif.len() as f64);
                a
            })
            .collect();
        variants.push(Variant {
            locus: loci[locus].clone(),
            alleles,
            motif,
            genotype: Vec::new(),
        });
    }
    variants
}

/// Run the repeat finder over collected evidence and assemble variants
pub fn assemble_variants(
    loci: &[Locus],
    evidence: &[LocusEvidence],
    read_seqs: &HashMap<String, String>,
    finder: &dyn RepeatFinder,
    aligner: &dyn LocalAligner,
    workspace: &mut Workspace,
    config: &AnalysisConfig,
) -> Result<Vec<Variant>> {
    let mut table = AlleleTable::new();

    let mut fasta = String::new();
    for (i, ev) in evidence.iter().enumerate() {
        if !loci[ev.locus].is_wildcard() {
            fasta.push_str(&format!(">{}{}\n{}\n", ID_PREFIX, i, ev.evidence.seq));
        }
    }

    if !fasta.is_empty() {
        let report = finder.find_repeats(&fasta, config.motif_range(), workspace)?;
        let indices = build_locus_indices(loci, evidence, &report, aligner, workspace, config)?;
        for (id, hits) in report.iter() {
            let ev = match parse_evidence_id(id, ID_PREFIX).and_then(|i| evidence.get(i)) {
                Some(ev) => ev,
                None => {
                    debug!("Skipping unexpected sequence id {}", id);
                    continue;
                }
            };
            let locus = &loci[ev.locus];
            if let Some(allele) = assemble_allele(locus, &ev.evidence, hits, indices.get(&ev.locus), config) {
                table.insert(ev.locus, allele);
            }
        }
    }

    for ev in evidence.iter().filter(|ev| loci[ev.locus].is_wildcard()) {
        let read_seq = match read_seqs.get(&ev.evidence.read) {
            Some(seq) => seq,
            None => {
                debug!("Cannot get sequence of {}", ev.evidence.read);
                continue;
            }
        };
        if let Some(allele) = pattern_allele(&loci[ev.locus], &ev.evidence, read_seq, config) {
            table.insert(ev.locus, allele);
        }
    }

    Ok(alleles_to_variants(&table, loci, config.min_support))
}

/// Reject pattern strings the regex engine cannot compile
pub fn validate_pattern(pattern: &str) -> Result<()> {
    Regex::new(&regex::escape(&pattern.to_uppercase()).replace(r"\*", "[AGCT]"))
        .map(|_| ())
        .map_err(|e| TreError::InvalidInput(format!("bad motif pattern '{}': {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EvidenceKind, LocusOrigin, Strand};
    use crate::tools::{AlignParams, LocalHit, MotifLengthRange};
    use std::sync::Mutex;

    fn hit(start: i64, end: i64, motif: &str) -> RepeatHit {
        let len = (end - start + 1) as usize;
        RepeatHit {
            start,
            end,
            period: motif.len() as u32,
            copies: len as f64 / motif.len() as f64,
            consensus_size: motif.len() as u32,
            pct_match: 100.0,
            pct_indel: 0.0,
            score: 100.0,
            composition: [25, 25, 25, 25],
            entropy: 1.5,
            motif: motif.to_string(),
            repeat_seq: motif.repeat(len / motif.len() + 1)[..len].to_string(),
        }
    }

    fn evidence(read: &str, repeat: &str, flank: usize, strand: Strand) -> EvidenceSequence {
        let seq = format!("{}{}{}", "T".repeat(flank), repeat, "A".repeat(flank));
        let len = seq.len() as i64;
        EvidenceSequence {
            kind: EvidenceKind::LocusSpan,
            seq,
            read: read.to_string(),
            read_offset: 1000,
            strand,
            read_len: 5000,
            genome_bounds: Some((900, 900 + len - 1)),
        }
    }

    fn allele(read: &str, motifs: &[&str], size: i64) -> AlleleObservation {
        AlleleObservation {
            read: read.to_string(),
            read_start: 1,
            motifs: motifs.iter().map(|m| m.to_string()).collect(),
            size,
            genome_start: 1,
            genome_end: 2,
            strand: Strand::Forward,
            copy_number: 0.0,
        }
    }

    /// Reports one repeat per record covering everything between 100bp flanks
    struct FlankedRepeatFinder {
        motif: String,
    }

    impl RepeatFinder for FlankedRepeatFinder {
        fn find_repeats(
            &self,
            fasta: &str,
            range: MotifLengthRange,
            _workspace: &mut Workspace,
        ) -> Result<RepeatReport> {
            let mut text = String::new();
            let mut lines = fasta.lines();
            while let (Some(header), Some(seq)) = (lines.next(), lines.next()) {
                let inner = &seq[100..seq.len() - 100];
                text.push_str(&format!(
                    "Sequence: {}\n101 {} {} 10.0 {} 100 0 60 25 25 25 25 1.5 {} {}\n",
                    &header[1..],
                    100 + inner.len(),
                    self.motif.len(),
                    self.motif.len(),
                    self.motif,
                    inner
                ));
            }
            RepeatReport::parse(&text, range)
        }
    }

    struct NoAligner {
        calls: Mutex<usize>,
    }

    impl LocalAligner for NoAligner {
        fn align(&self, _q: &str, _s: &str, _p: &AlignParams, _w: &mut Workspace) -> Result<Vec<LocalHit>> {
            *self.calls.lock().unwrap() += 1;
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_canonical_motif_tie_break() {
        let alleles = vec![
            allele("r1", &["ATG"], 30),
            allele("r2", &["AT", "ATG"], 30),
            allele("r3", &["AT"], 30),
            allele("r4", &["AT", "ATGC"], 30),
            allele("r5", &["ATG"], 30),
        ];
        // AT: 3, ATG: 3, ATGC: 1
        assert_eq!(canonical_motif(&alleles).as_deref(), Some("AT"));
        assert_eq!(canonical_motif(&[]), None);
    }

    #[test]
    fn test_canonical_motif_first_seen_among_equal_length() {
        let alleles = vec![allele("r1", &["CAG"], 30), allele("r2", &["AGC"], 30)];
        assert_eq!(canonical_motif(&alleles).as_deref(), Some("CAG"));
    }

    #[test]
    fn test_equal_motifs_keep_report_order() {
        let locus = Locus::new("chr1", 1000, 1030, "CAG", LocusOrigin::UserSupplied);
        let ev = evidence("r1", &"CAG".repeat(10), 100, Strand::Forward);
        let hits = vec![hit(101, 130, "GCA"), hit(101, 130, "AGC"), hit(101, 130, "GCA")];

        let a = assemble_allele(&locus, &ev, &hits, None, &AnalysisConfig::default()).unwrap();
        assert_eq!(a.motifs, vec!["GCA", "AGC"]);
        // same count and length: the motif reported first wins
        assert_eq!(canonical_motif(&[a]).as_deref(), Some("GCA"));

        let alleles = vec![allele("r1", &["GCA", "AGC"], 30), allele("r2", &["AGC", "GCA"], 30)];
        assert_eq!(canonical_motif(&alleles).as_deref(), Some("GCA"));
    }

    #[test]
    fn test_assemble_allele_forward_and_reverse() {
        let locus = Locus::new("chr1", 1000, 1030, "CAG", LocusOrigin::UserSupplied);
        let config = AnalysisConfig::default();
        let ev = evidence("r1", &"CAG".repeat(10), 100, Strand::Forward);
        let hits = vec![hit(101, 130, "CAG")];

        let a = assemble_allele(&locus, &ev, &hits, None, &config).unwrap();
        assert_eq!(a.size, 30);
        assert_eq!(a.read_start, 1100);
        assert_eq!(a.genome_start, 1001);
        assert_eq!(a.genome_end, 1029);
        assert_eq!(a.motifs, vec!["CAG"]);

        let rev = evidence("r1", &"CAG".repeat(10), 100, Strand::Reverse);
        let a = assemble_allele(&locus, &rev, &hits, None, &config).unwrap();
        assert_eq!(a.read_start, 5000 - 1100 - 30 + 1);
    }

    #[test]
    fn test_assemble_allele_rejections() {
        let locus = Locus::new("chr1", 1000, 1300, "CAG", LocusOrigin::UserSupplied);
        let config = AnalysisConfig::default();
        let ev = evidence("r1", &"CAG".repeat(100), 100, Strand::Forward);

        // unrelated motif
        assert!(assemble_allele(&locus, &ev, &[hit(101, 400, "TTA")], None, &config).is_none());
        // covers 141 of 300 expected bases
        assert!(assemble_allele(&locus, &ev, &[hit(250, 390, "CAG")], None, &config).is_none());
        // ends more than 200bp short of the far flank
        assert!(assemble_allele(&locus, &ev, &[hit(101, 190, "CAG"), hit(130, 199, "CAG")], None, &config).is_none());
        // homopolymer hits never count
        assert!(assemble_allele(&locus, &ev, &[hit(101, 400, "AA")], None, &config).is_none());
    }

    #[test]
    fn test_strict_clamp_to_locus() {
        let locus = Locus::new("chr1", 1010, 1080, "CAG", LocusOrigin::UserSupplied);
        let config = AnalysisConfig::default().strict();
        // 80bp flanks in strict mode
        let mut ev = evidence("r1", &"CAG".repeat(30), 80, Strand::Forward);
        ev.genome_bounds = Some((920, 920 + ev.seq.len() as i64 - 1));
        let hits = vec![hit(81, 170, "CAG")];

        let a = assemble_allele(&locus, &ev, &hits, None, &config).unwrap();
        // unclamped: 1001..1089, size 90
        assert_eq!((a.genome_start, a.genome_end), (1010, 1080));
        assert_eq!(a.size, 90 - 9 - 9);
        assert_eq!(a.read_start, 1000 + 80 + 9);
    }

    #[test]
    fn test_allele_table_first_write_wins() {
        let mut table = AlleleTable::new();
        assert!(table.insert(0, allele("r1", &["CAG"], 30)));
        assert!(!table.insert(0, allele("r1", &["CAG"], 99)));
        assert!(table.insert(1, allele("r1", &["CAG"], 45)));
        assert_eq!(table.get(0).len(), 1);
        assert_eq!(table.get(0)[0].size, 30);
        assert_eq!(table.loci(), &[0, 1]);
    }

    #[test]
    fn test_min_support() {
        let loci = vec![
            Locus::new("chr1", 1000, 1030, "CAG", LocusOrigin::Insertion),
            Locus::new("chr2", 1000, 1030, "AT", LocusOrigin::Insertion),
        ];
        let mut table = AlleleTable::new();
        table.insert(0, allele("r1", &["CAG"], 30));
        table.insert(0, allele("r2", &["CAG"], 33));
        table.insert(1, allele("r1", &["AT"], 20));

        let variants = alleles_to_variants(&table, &loci, 2);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].locus.chrom, "chr1");
        assert_eq!(variants[0].alleles[1].copy_number, 11.0);
        assert!(alleles_to_variants(&table, &loci, 3).is_empty());
    }

    #[test]
    fn test_examine_pattern() {
        let seq = format!("{}GGGGCAGG", "GGGGCG".repeat(3));
        let (lo, hi, motif) = examine_pattern(&seq, "GGGGC*").unwrap();
        assert_eq!((lo, hi), (0, 23));
        assert_eq!(motif, "GGGGCG");
        assert!(examine_pattern("TTTTTTTTTTTTTTTTTTTT", "GGGGC*").is_none());
        // matches covering under 80% of the sequence
        assert!(examine_pattern(&format!("GGGGCA{}", "T".repeat(30)), "GGGGC*").is_none());
    }

    #[test]
    fn test_pattern_allele() {
        let locus = Locus::new("chr9", 5000, 5040, "GGGGC*", LocusOrigin::UserSupplied);
        let config = AnalysisConfig::default();
        let repeat = "GGGGCG".repeat(5);
        let ev = evidence("r1", &repeat, 100, Strand::Forward);
        let read_seq = format!("{}{}", "C".repeat(50), ev.seq);
        let a = pattern_allele(&locus, &ev, &read_seq, &config).unwrap();
        assert_eq!(a.size, 30);
        assert_eq!(a.read_start, 150);
        assert_eq!((a.genome_start, a.genome_end), (5000, 5040));
        assert!(a.motifs.iter().any(|m| m == "GGGGCG"));
    }

    #[test]
    fn test_cag_alleles_end_to_end() {
        let loci = vec![Locus::new("chr4", 1000, 1030, "CAG", LocusOrigin::UserSupplied)];
        let evidence: Vec<LocusEvidence> = [("r1", 10), ("r2", 11), ("r3", 12)]
            .iter()
            .map(|(read, n)| LocusEvidence {
                locus: 0,
                evidence: evidence(read, &"CAG".repeat(*n), 100, Strand::Forward),
            })
            .collect();
        let finder = FlankedRepeatFinder {
            motif: "CAG".to_string(),
        };
        let aligner = NoAligner { calls: Mutex::new(0) };
        let mut ws = Workspace::new(false).unwrap();
        let config = AnalysisConfig::default();

        let variants = assemble_variants(&loci, &evidence, &HashMap::new(), &finder, &aligner, &mut ws, &config).unwrap();
        assert_eq!(variants.len(), 1);
        let v = &variants[0];
        assert_eq!(v.motif, "CAG");
        let sizes: Vec<i64> = v.alleles.iter().map(|a| a.size).collect();
        assert_eq!(sizes, vec![30, 33, 36]);
        let copies: Vec<f64> = v.alleles.iter().map(|a| a.copy_number).collect();
        assert_eq!(copies, vec![10.0, 11.0, 12.0]);
        // short motifs never reach the aligner
        assert_eq!(*aligner.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("GGGGC*").is_ok());
        assert!(validate_pattern("CAG,CAA").is_ok());
    }
}
