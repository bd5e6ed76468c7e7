// candidates.rs - Insertion candidate TSV loader

use crate::data::candidate::InsertionCandidate;
use crate::error::{Result, TreError};
use log::info;
use std::path::Path;

/// Read insertion candidates from a headerless tab-separated file with
/// columns chrom, pos, end, read, insertion sequence, read flank.
/// Lines starting with `#` are skipped.
pub fn load_candidates(path: &Path) -> Result<Vec<InsertionCandidate>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| TreError::InvalidInput(format!("cannot open {}: {}", path.display(), e)))?;

    let mut candidates = Vec::new();
    for (i, record) in reader.deserialize::<InsertionCandidate>().enumerate() {
        let candidate = record.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(i + 1);
            TreError::parse("insertion candidate", line, e.to_string())
        })?;
        candidates.push(candidate);
    }

    info!("Loaded {} insertion candidates from {}", candidates.len(), path.display());
    Ok(candidates)
}
