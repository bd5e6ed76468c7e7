// config.rs - Analysis parameters shared by every stage

use crate::core::intervals::MergeParams;
use crate::tools::MotifLengthRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sample sex, used to call a single allele on chrX/chrY in males
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "f" | "female" => Ok(Sex::Female),
            "m" | "male" => Ok(Sex::Male),
            other => Err(format!("Invalid sex '{}'. Use female or male", other)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "female"),
            Sex::Male => write!(f, "male"),
        }
    }
}

/// Every tunable of a run, passed explicitly to each component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub min_motif_len: usize,
    pub max_motif_len: usize,
    /// Read sequence kept on each side of a locus
    pub flank_size: i64,
    /// Genome sequence taken on each side of an insertion
    pub target_flank: i64,
    pub min_support: usize,
    pub min_cluster_size: usize,
    pub max_num_clusters: usize,
    pub sex: Sex,
    pub genotype_in_size: bool,
    pub trf_args: String,
    pub nprocs: usize,
    pub check_split: bool,
    pub debug: bool,
    pub max_separation: i64,
    pub coord_buffer: i64,
    pub merge_distance: i64,
    pub too_far_from_read_end: i64,
    pub closeness_to_end: i64,
    pub min_expansion: i64,
    pub seed: Option<u64>,
    /// Directed genotyping: clamp alleles to the declared locus bounds
    pub strict: bool,
    pub update_loci: bool,
    /// Insertion coverage needed for a repeat to explain the insertion
    pub full_cov: f64,
    /// Slack around an insertion breakpoint for flank hits
    pub breakpoint_buffer: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_motif_len: 2,
            max_motif_len: 50,
            flank_size: 100,
            target_flank: 3000,
            min_support: 2,
            min_cluster_size: 2,
            max_num_clusters: 3,
            sex: Sex::Female,
            genotype_in_size: false,
            trf_args: "2 5 5 80 10 10 500 -d -h".to_string(),
            nprocs: 1,
            check_split: true,
            debug: false,
            max_separation: 50,
            coord_buffer: 20,
            merge_distance: 100,
            too_far_from_read_end: 200,
            closeness_to_end: 50,
            min_expansion: 0,
            seed: None,
            strict: false,
            update_loci: true,
            full_cov: 0.7,
            breakpoint_buffer: 50,
        }
    }
}

/// Flank used when genotyping declared loci
pub const STRICT_FLANK_SIZE: i64 = 80;
/// Motif length ceiling when genotyping declared loci
pub const STRICT_MAX_MOTIF_LEN: usize = 10000;

impl AnalysisConfig {
    /// Parameters for genotyping a user-supplied locus list
    pub fn strict(&self) -> Self {
        Self {
            strict: true,
            flank_size: STRICT_FLANK_SIZE,
            min_motif_len: 2,
            max_motif_len: STRICT_MAX_MOTIF_LEN,
            update_loci: false,
            ..self.clone()
        }
    }

    pub fn motif_range(&self) -> MotifLengthRange {
        MotifLengthRange::new(self.min_motif_len, self.max_motif_len)
    }

    pub fn merge_params(&self) -> MergeParams {
        MergeParams {
            buffer: self.coord_buffer,
            max_separation: self.max_separation,
        }
    }
}
