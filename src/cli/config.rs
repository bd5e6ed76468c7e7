// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub genome: Option<String>,
    pub alignments: Option<String>,
    pub loci: Option<String>,
    pub candidates: Option<String>,
    pub out_prefix: Option<String>,
    pub reads: Option<Vec<String>>,
    pub sample: Option<String>,

    // Repeat detection
    pub min_motif_len: Option<usize>,
    pub max_motif_len: Option<usize>,
    pub flank_size: Option<i64>,
    pub trf_args: Option<String>,
    pub min_support: Option<usize>,
    pub min_expansion: Option<i64>,

    // Genotyping
    pub min_cluster_size: Option<usize>,
    pub max_num_clusters: Option<usize>,
    pub genotype_in_size: Option<bool>,
    pub sex: Option<String>,

    // Performance
    pub nprocs: Option<usize>,
    pub seed: Option<u64>,

    // Flags
    pub no_split_check: Option<bool>,
    pub debug: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# trecall.toml - Configuration file for trecall
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Reference genome FASTA (indexed with .fai)
genome = "/path/to/genome.fa"

# Coordinate-sorted, indexed BAM
alignments = "/path/to/alignments.bam"

# Genotype declared loci (chrom start end motif label [variant_id])...
loci = "/path/to/loci.bed"

# ...or discover expansions from insertion candidates
# candidates = "/path/to/insertions.tsv"

# Output prefix for .tsv, .bed and .vcf
out_prefix = "results/sample1"

# Read FASTA files for alignments stored without sequence
# reads = ["/path/to/reads.fa"]

# Sample name written in the VCF header
# sample = "sample1"

# =============================================================================
# REPEAT DETECTION
# =============================================================================

# Motif length range
min_motif_len = 2
max_motif_len = 50

# Read flank kept on each side of a locus
flank_size = 100

# Repeat finder arguments
trf_args = "2 5 5 80 10 10 500 -d -h"

# Minimum reads supporting an allele
min_support = 2

# Minimum expansion over the reference span in bp (discovery only)
min_expansion = 0

# =============================================================================
# GENOTYPING
# =============================================================================

# Minimum reads in a genotype cluster
min_cluster_size = 2

# Maximum genotype clusters per locus
max_num_clusters = 3

# Genotype on repeat size in bp instead of copy number
genotype_in_size = false

# Sample sex: female, male
sex = "female"

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of parallel batches
nprocs = 4

# Seed for batch shuffling
# seed = 42

# =============================================================================
# FLAGS
# =============================================================================

# Do not look for split alignments around loci
no_split_check = false

# Keep temporary tool files
debug = false
"#
        .to_string()
    }
}
