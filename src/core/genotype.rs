// genotype.rs - Clustering allele sizes into genotypes

use crate::core::config::{AnalysisConfig, Sex};
use crate::data::{GenotypeCluster, Variant};
use serde::{Deserialize, Serialize};

/// Settings a genotyper needs, taken from the run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenotypeConfig {
    pub min_cluster_size: usize,
    pub max_num_clusters: usize,
    pub sex: Sex,
    /// Cluster sizes in bp instead of copy numbers
    pub in_size: bool,
}

impl From<&AnalysisConfig> for GenotypeConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            min_cluster_size: config.min_cluster_size,
            max_num_clusters: config.max_num_clusters,
            sex: config.sex,
            in_size: config.genotype_in_size,
        }
    }
}

impl GenotypeConfig {
    /// At most one cluster on sex chromosomes of male samples
    pub fn clusters_for(&self, chrom: &str) -> usize {
        let name = chrom.strip_prefix("chr").unwrap_or(chrom);
        if self.sex == Sex::Male && (name == "X" || name == "Y") {
            1
        } else {
            self.max_num_clusters.max(1)
        }
    }
}

/// Assigns genotype clusters to a variant's alleles
pub trait Genotyper: Send + Sync {
    fn genotype(&self, variant: &Variant, config: &GenotypeConfig) -> Vec<GenotypeCluster>;
}

/// Splits sorted allele values at their widest gaps.
///
/// A gap counts when it exceeds `max(1, 0.1 * lower value)`; at most
/// `clusters - 1` of the widest counted gaps are used.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapGenotyper;

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

impl GapGenotyper {
    /// Cluster sorted values into at most `max_clusters` groups
    pub fn split(values: &[f64], max_clusters: usize) -> Vec<&[f64]> {
        if values.is_empty() {
            return Vec::new();
        }
        let mut gaps: Vec<(f64, usize)> = values
            .windows(2)
            .enumerate()
            .map(|(i, w)| (w[1] - w[0], i + 1))
            .filter(|(gap, i)| *gap > (0.1 * values[i - 1]).max(1.0))
            .collect();
        // widest first, earlier split on ties
        gaps.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        let mut cuts: Vec<usize> = gaps
            .into_iter()
            .take(max_clusters.saturating_sub(1))
            .map(|(_, i)| i)
            .collect();
        cuts.sort_unstable();

        let mut clusters = Vec::with_capacity(cuts.len() + 1);
        let mut from = 0;
        for cut in cuts {
            clusters.push(&values[from..cut]);
            from = cut;
        }
        clusters.push(&values[from..]);
        clusters
    }
}

impl Genotyper for GapGenotyper {
    fn genotype(&self, variant: &Variant, config: &GenotypeConfig) -> Vec<GenotypeCluster> {
        let mut values: Vec<f64> = variant
            .alleles
            .iter()
            .map(|a| if config.in_size { a.size as f64 } else { a.copy_number })
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));

        let mut clusters: Vec<GenotypeCluster> = Self::split(&values, config.clusters_for(&variant.locus.chrom))
            .into_iter()
            .filter(|c| !c.is_empty() && c.len() >= config.min_cluster_size)
            .map(|c| GenotypeCluster {
                value: round1(median(c)),
                support: c.len(),
                ci: (c[0], c[c.len() - 1]),
            })
            .collect();
        clusters.sort_by(|a, b| b.support.cmp(&a.support).then(a.value.total_cmp(&b.value)));
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AlleleObservation, Locus, LocusOrigin, Strand};

    fn variant(chrom: &str, copies: &[f64]) -> Variant {
        let alleles = copies
            .iter()
            .enumerate()
            .map(|(i, &c)| AlleleObservation {
                read: format!("r{}", i),
                read_start: 0,
                motifs: ["CAG".to_string()].into_iter().collect(),
                size: (c * 3.0) as i64,
                genome_start: 100,
                genome_end: 130,
                strand: Strand::Forward,
                copy_number: c,
            })
            .collect();
        Variant {
            locus: Locus::new(chrom, 100, 130, "CAG", LocusOrigin::UserSupplied),
            alleles,
            motif: "CAG".to_string(),
            genotype: Vec::new(),
        }
    }

    fn config() -> GenotypeConfig {
        GenotypeConfig::from(&AnalysisConfig::default())
    }

    #[test]
    fn test_two_alleles() {
        let v = variant("chr4", &[10.0, 10.3, 10.0, 40.0, 41.0, 42.0, 10.0]);
        let g = GapGenotyper.genotype(&v, &config());
        assert_eq!(g.len(), 2);
        assert_eq!(g[0].value, 10.0);
        assert_eq!(g[0].support, 4);
        assert_eq!(g[0].ci, (10.0, 10.3));
        assert_eq!(g[1].value, 41.0);
        assert_eq!(g[1].support, 3);
    }

    #[test]
    fn test_small_gaps_stay_together() {
        let v = variant("chr4", &[20.0, 20.8, 21.6, 22.0]);
        let g = GapGenotyper.genotype(&v, &config());
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].value, 21.2);
    }

    #[test]
    fn test_small_clusters_dropped() {
        let v = variant("chr4", &[10.0, 10.0, 10.0, 55.0]);
        let g = GapGenotyper.genotype(&v, &config());
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].support, 3);
    }

    #[test]
    fn test_male_sex_chromosome_single_cluster() {
        let mut cfg = config();
        cfg.sex = Sex::Male;
        let v = variant("chrX", &[10.0, 10.0, 40.0, 40.0]);
        let g = GapGenotyper.genotype(&v, &cfg);
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].support, 4);
        assert_eq!(GapGenotyper.genotype(&variant("chr7", &[10.0, 10.0, 40.0, 40.0]), &cfg).len(), 2);
    }

    #[test]
    fn test_split_limits_clusters() {
        let values = [1.0, 1.0, 20.0, 20.0, 60.0, 60.0, 200.0, 200.0];
        let clusters = GapGenotyper::split(&values, 3);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0], &[1.0, 1.0, 20.0, 20.0]);
        assert_eq!(clusters[2], &[200.0, 200.0]);
    }

    #[test]
    fn test_in_size() {
        let mut cfg = config();
        cfg.in_size = true;
        let v = variant("chr4", &[10.0, 10.0, 10.5]);
        let g = GapGenotyper.genotype(&v, &cfg);
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].value, 30.0);
        assert_eq!(g[0].ci, (30.0, 31.0));
    }
}
