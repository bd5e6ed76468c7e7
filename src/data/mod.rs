// mod.rs - Data structures module

pub mod alignment;
pub mod candidate;
pub mod loaders;
pub mod locus;
pub mod sequence;
pub mod variant;

// Re-export main types for convenience
pub use alignment::{AlignedPair, AlignmentRecord, AlignmentSource, BamAlignments, ClipEnd, Walk};
#[cfg(test)]
pub use alignment::AlignmentStore;
pub use candidate::{InsertionCandidate, TRE_LABEL};
pub use loaders::{load_candidates, load_loci};
pub use locus::{Locus, LocusKey, LocusOrigin};
pub use sequence::{read_segment, FastaSequences, SequenceMap, SequenceSet, SequenceSource};
pub use variant::{
    reflect_read_start, AlleleObservation, EvidenceKind, EvidenceSequence, GenotypeCluster, Strand, Variant,
};
