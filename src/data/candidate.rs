// candidate.rs - Insertion candidates for repeat discovery

use serde::{Deserialize, Serialize};

/// An insertion called from one read, awaiting repeat annotation.
///
/// Positions are 0-based on the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertionCandidate {
    pub chrom: String,
    pub pos: i64,
    pub end: i64,
    pub read: String,
    pub insertion_seq: String,
    /// Read sequence around the insertion, insertion included
    pub read_flank: String,
    #[serde(skip)]
    pub label: Option<String>,
    #[serde(skip)]
    pub motifs: Vec<String>,
}

/// Label given to candidates whose insertion is a tandem repeat expansion
pub const TRE_LABEL: &str = "TRE";

impl InsertionCandidate {
    pub fn new(chrom: &str, pos: i64, end: i64, read: &str, insertion_seq: &str, read_flank: &str) -> Self {
        Self {
            chrom: chrom.to_string(),
            pos,
            end,
            read: read.to_string(),
            insertion_seq: insertion_seq.to_string(),
            read_flank: read_flank.to_string(),
            label: None,
            motifs: Vec::new(),
        }
    }

    pub fn is_tre(&self) -> bool {
        self.label.as_deref() == Some(TRE_LABEL)
    }

    pub fn insertion_len(&self) -> usize {
        self.insertion_seq.len()
    }
}
