// mod.rs - Input file loaders

pub mod candidates;
pub mod loci;

pub use candidates::load_candidates;
pub use loci::load_loci;
