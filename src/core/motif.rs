// motif.rs - Repeat unit equivalence

use crate::error::Result;
use crate::tools::{AlignParams, LocalAligner, LocalHit, Workspace};
use log::debug;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Default coverage a rotation or partial match must reach
pub const DEFAULT_MIN_FRACTION: f64 = 0.5;

/// Stride used when retrying index lookups on rotated motifs
const INDEX_ROTATION_STRIDE: usize = 5;

/// Minimum identity and aligned fraction for two motifs to be linked
const MIN_IDENTITY: f64 = 0.8;
const MIN_ALIGNED_FRACTION: f64 = 0.8;

/// All cyclic rotations of a motif, starting with the motif itself
pub fn rotations(motif: &str) -> impl Iterator<Item = String> + '_ {
    (0..motif.len()).map(move |i| rotate(motif, i))
}

pub fn rotate(motif: &str, k: usize) -> String {
    if motif.is_empty() {
        return String::new();
    }
    let k = k % motif.len();
    format!("{}{}", &motif[k..], &motif[..k])
}

/// Fraction of `outer` reconstructed by non-overlapping copies of `inner`
fn coverage(inner: &str, outer: &str) -> f64 {
    if inner.is_empty() || outer.is_empty() {
        return 0.0;
    }
    (outer.matches(inner).count() * inner.len()) as f64 / outer.len() as f64
}

/// Motif string -> motifs judged equivalent by sequence alignment.
///
/// Built once per batch and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotifEquivalenceIndex {
    links: HashMap<String, BTreeSet<String>>,
}

impl MotifEquivalenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symmetric link between two motifs
    pub fn link(&mut self, a: &str, b: &str) {
        self.links.entry(a.to_string()).or_default().insert(b.to_string());
        self.links.entry(b.to_string()).or_default().insert(a.to_string());
    }

    pub fn equivalents(&self, motif: &str) -> Option<&BTreeSet<String>> {
        self.links.get(motif)
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Align query motifs against self-concatenated target motifs and link
    /// the pairs that align well enough.
    ///
    /// Doubling the subjects lets a rotation of a motif align end to end.
    pub fn build(
        queries: &BTreeSet<String>,
        targets: &BTreeSet<String>,
        aligner: &dyn LocalAligner,
        workspace: &mut Workspace,
    ) -> Result<Self> {
        if queries.is_empty() || targets.is_empty() {
            return Ok(Self::new());
        }

        let mut query_fa = String::new();
        for seq in queries {
            query_fa.push_str(&format!(">{}\n{}\n", seq, seq));
        }
        let mut target_fa = String::new();
        for seq in targets {
            target_fa.push_str(&format!(">{}\n{}{}\n", seq, seq, seq));
        }

        let hits = aligner.align(&query_fa, &target_fa, &AlignParams::motif_search(), workspace)?;
        let index = Self::from_hits(&hits);
        debug!(
            "Motif index: {} queries, {} targets, {} linked motifs",
            queries.len(),
            targets.len(),
            index.len()
        );
        Ok(index)
    }

    /// Keep hits with identity >= 80% covering >= 80% of the shorter motif.
    /// Motif ids are the motif sequences themselves.
    pub fn from_hits(hits: &[LocalHit]) -> Self {
        let mut index = Self::new();
        for hit in hits {
            let shorter = hit.query_id.len().min(hit.subject_id.len());
            if shorter == 0 {
                continue;
            }
            let identity = hit.pct_identity / 100.0;
            let aligned = hit.align_len as f64 / shorter as f64;
            if identity >= MIN_IDENTITY && aligned >= MIN_ALIGNED_FRACTION {
                index.link(&hit.query_id, &hit.subject_id);
            }
        }
        index
    }

    /// Sub-index holding only the entries of the given motifs
    pub fn restrict_to(&self, motifs: &HashSet<String>) -> Self {
        let links = self
            .links
            .iter()
            .filter(|(motif, _)| motifs.contains(*motif))
            .map(|(motif, set)| (motif.clone(), set.clone()))
            .collect();
        Self { links }
    }

    /// Direct membership or partial containment between a member of
    /// `motif`'s set and `other`
    fn links_to(&self, motif: &str, other: &str, min_fraction: f64) -> bool {
        let members = match self.links.get(motif) {
            Some(members) => members,
            None => return false,
        };
        if members.contains(other) {
            return true;
        }
        members.iter().any(|member| {
            if member.contains(other) {
                coverage(other, member) >= min_fraction
            } else if other.contains(member.as_str()) {
                coverage(member, other) >= min_fraction
            } else {
                false
            }
        })
    }
}

/// Whether two motifs denote the same repeat unit
pub fn same_repeat(a: &str, b: &str, index: Option<&MotifEquivalenceIndex>) -> bool {
    same_repeat_with(a, b, index, DEFAULT_MIN_FRACTION)
}

/// [`same_repeat`] with an explicit coverage threshold.
///
/// Checks, in order: exact equality; any rotation of the shorter motif
/// reconstructing at least `min_fraction` of the doubled longer motif;
/// then, given an index, membership and partial containment in either
/// motif's equivalence set, retried on rotations taken every 5 bases.
pub fn same_repeat_with(
    a: &str,
    b: &str,
    index: Option<&MotifEquivalenceIndex>,
    min_fraction: f64,
) -> bool {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if shorter == longer {
        return true;
    }
    if shorter.is_empty() {
        return false;
    }

    let doubled = format!("{}{}", longer, longer);
    for rotated in rotations(shorter) {
        if doubled.contains(rotated.as_str()) && coverage(&rotated, &doubled) >= min_fraction {
            return true;
        }
    }

    let index = match index {
        Some(index) if !index.is_empty() => index,
        _ => return false,
    };

    let check = |x: &str, y: &str| {
        index.links_to(x, y, min_fraction) || index.links_to(y, x, min_fraction)
    };

    if check(a, b) {
        return true;
    }
    for i in (0..a.len()).step_by(INDEX_ROTATION_STRIDE) {
        if check(&rotate(a, i), b) {
            return true;
        }
    }
    for i in (0..b.len()).step_by(INDEX_ROTATION_STRIDE) {
        if check(&rotate(b, i), a) {
            return true;
        }
    }

    false
}
