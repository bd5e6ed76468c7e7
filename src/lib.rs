// lib.rs - trecall library root

//! # trecall - Tandem repeat expansion discovery and genotyping from long reads
//!
//! Finds tandem repeat expansions among insertions called from long-read
//! alignments, or genotypes a list of known repeat loci, by running an
//! external repeat finder over read sequence and reconciling the repeats it
//! reports with the reference.
//!
//! ## Features
//!
//! - **Rotation-aware motifs**: `CAG`, `AGC` and `GCA` count as the same repeat
//! - **Two modes**: discovery from insertion candidates, genotyping of declared loci
//! - **Clipped read rescue**: reads too long to span a locus are recovered from
//!   their clipped tails
//! - **Parallel batches**: loci are split across worker threads, each with its
//!   own inputs and scratch space
//! - **Multiple formats**: per-read TSV, per-locus BED and VCF output
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use trecall::prelude::*;
//! use std::path::{Path, PathBuf};
//!
//! let inputs = FileInputs {
//!     alignments: PathBuf::from("sample.bam"),
//!     genome: PathBuf::from("genome.fa"),
//!     reads: Vec::new(),
//! };
//! let config = AnalysisConfig::default();
//! let finder = TreFinder::new(
//!     config.clone(),
//!     Box::new(inputs),
//!     Box::new(Trf::new(&config.trf_args)?),
//!     Box::new(Blastn::new()?),
//! );
//! let variants = finder.genotype_loci(load_loci(Path::new("loci.bed"))?)?;
//! for v in &variants {
//!     println!("{}\t{}\t{}", v.locus, v.motif, v.genotype_summary());
//! }
//! # Ok::<(), trecall::TreError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;
pub mod tools;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, RunMode, ValidationResult};
    pub use crate::core::{AnalysisConfig, FileInputs, GapGenotyper, Genotyper, Sex, TreFinder};
    pub use crate::data::{load_candidates, load_loci, AlleleObservation, GenotypeCluster, Locus, Variant};
    pub use crate::error::{Result, TreError};
    pub use crate::output::{write_bed, write_tsv, write_vcf};
    pub use crate::tools::{Blastn, LocalAligner, RepeatFinder, Trf};
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use core::{AnalysisConfig, TreFinder};
pub use data::{Locus, Variant};
pub use error::TreError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "trecall v{} - Tandem repeat expansion discovery and genotyping",
        VERSION
    )
}
