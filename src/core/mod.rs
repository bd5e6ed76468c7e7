// mod.rs - Core logic module

pub mod alleles;
pub mod config;
pub mod evidence;
pub mod genotype;
pub mod intervals;
pub mod loci;
pub mod motif;
pub mod pipeline;
pub mod rescue;
pub mod resolver;

// Re-export main types for convenience
pub use alleles::{assemble_allele, assemble_variants, canonical_motif, pattern_allele, validate_pattern, AlleleTable};
pub use config::{AnalysisConfig, Sex};
pub use evidence::{collect_evidence, CollectedEvidence, LocusEvidence, ReadFetcher};
pub use genotype::{GapGenotyper, GenotypeConfig, Genotyper};
pub use intervals::{combine_repeat_coords, merge_spans, widest, MergeParams, Span};
pub use loci::{annotate_candidate, consolidate_loci, remove_redundants};
pub use motif::{same_repeat, same_repeat_with, MotifEquivalenceIndex};
pub use pipeline::{FileInputs, InputOpener, TreFinder, WorkerInputs};
pub use rescue::{rescue_missed_clipped, MissedClip, RescuedSegment};
pub use resolver::{resolve, CandidateHits, Resolution, ResolverParams};
