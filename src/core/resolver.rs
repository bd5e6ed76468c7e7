// resolver.rs - Motif and genome span for one candidate insertion

use crate::core::motif::{same_repeat, same_repeat_with, MotifEquivalenceIndex};
use crate::tools::RepeatHit;

/// Repeat hits on the three evidence sequences of one insertion
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateHits<'a> {
    pub insertion: &'a [RepeatHit],
    pub query_flank: &'a [RepeatHit],
    pub target_flank: &'a [RepeatHit],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverParams {
    /// Fraction of the insertion a hit must cover
    pub full_cov: f64,
    /// Slack around the flank midpoint for breakpoint-spanning hits
    pub mid_pt_buf: i64,
    /// Half-width of the genome flank; its midpoint is the breakpoint
    pub target_flank: i64,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            full_cov: 0.7,
            mid_pt_buf: 50,
            target_flank: 3000,
        }
    }
}

/// Motifs explaining an insertion and, when found, the genome span of the
/// reference copy of the repeat
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub motifs: Vec<String>,
    pub genome_start: Option<i64>,
    pub genome_end: Option<i64>,
}

impl Resolution {
    pub fn has_span(&self) -> bool {
        self.genome_start.is_some() && self.genome_end.is_some()
    }
}

/// First hit with the longest repeat
fn longest<'a>(hits: impl IntoIterator<Item = &'a RepeatHit>) -> Option<&'a RepeatHit> {
    hits.into_iter().fold(None, |best, hit| match best {
        Some(b) if b.repeat_len() >= hit.repeat_len() => Some(b),
        _ => Some(hit),
    })
}

fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Pick the motif explaining an insertion and locate it in the genome.
///
/// `gstart` is the genome position of the first base of the target flank
/// and `gend` the insertion end. Returns `None` when no insertion hit
/// covers enough of the insertion, or when nothing matches the flanks but a
/// genome repeat straddles the breakpoint.
pub fn resolve(
    hits: CandidateHits<'_>,
    ins_len: usize,
    gstart: i64,
    gend: i64,
    index: Option<&MotifEquivalenceIndex>,
    params: ResolverParams,
) -> Option<Resolution> {
    if ins_len == 0 {
        return None;
    }
    let ins_hits: Vec<&RepeatHit> = hits
        .insertion
        .iter()
        .filter(|r| (r.end - r.start + 1) as f64 / ins_len as f64 >= params.full_cov)
        .collect();

    let tf = params.target_flank;
    let (lo, hi) = (tf + 1 - params.mid_pt_buf, tf + params.mid_pt_buf);
    let at_breakpoint = |r: &&RepeatHit| r.start <= hi && r.end >= lo;
    let t_hits: Vec<&RepeatHit> = hits.target_flank.iter().filter(at_breakpoint).collect();
    let q_hits: Vec<&RepeatHit> = hits.query_flank.iter().filter(at_breakpoint).collect();

    let mut by_motif_len = ins_hits.clone();
    by_motif_len.sort_by_key(|r| r.motif.len());

    let mut genome_start = None;
    let mut genome_end = None;
    let mut motifs: Option<Vec<String>> = None;

    for ih in by_motif_len {
        if ih.motif.len() == 1 || ih.is_degenerate() {
            continue;
        }
        let motif = ih.motif.as_str();
        let related = |r: &&RepeatHit| contains_either(motif, &r.motif) || same_repeat(motif, &r.motif, index);
        let t_match = t_hits.iter().any(related);
        let q_match = q_hits.iter().any(related);
        if !t_match && !q_match {
            continue;
        }

        let mut found = vec![motif.to_string()];
        if t_match {
            // exact equivalents first, looser matches only if none align
            let passes: [&dyn Fn(&RepeatHit) -> bool; 2] = [
                &|r: &RepeatHit| same_repeat_with(motif, &r.motif, None, 1.0),
                &|r: &RepeatHit| contains_either(motif, &r.motif) || same_repeat(motif, &r.motif, index),
            ];
            for accept in passes {
                let mut best_len = 0;
                for r in t_hits.iter().filter(|r| !r.is_degenerate() && accept(**r)) {
                    if r.repeat_len() > best_len {
                        best_len = r.repeat_len();
                        genome_start = Some(gstart + r.start - 1);
                        genome_end = Some(gstart + r.end - 1);
                        if !found.contains(&r.motif) {
                            found.push(r.motif.clone());
                        }
                    }
                }
                if genome_start.is_some() {
                    break;
                }
            }
        }
        motifs = Some(found);
        break;
    }

    if motifs.is_none() && !ins_hits.is_empty() {
        // an unmatched genome repeat straddling the breakpoint is not the inserted repeat
        if t_hits.iter().any(|r| r.start < tf && r.end > tf) {
            return None;
        }
        if let Some(r) = longest(ins_hits.iter().copied()) {
            let mid = (gstart + gend) as f64 / 2.0;
            genome_start = Some(mid.floor() as i64);
            genome_end = Some(mid.ceil() as i64);
            motifs = Some(vec![r.motif.clone()]);
        }
    }

    motifs.map(|motifs| Resolution {
        motifs,
        genome_start,
        genome_end,
    })
}
