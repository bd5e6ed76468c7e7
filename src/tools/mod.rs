// mod.rs - External tool adapters

pub mod blast;
pub mod trf;
pub mod workspace;

pub use blast::{parse_tabular, AlignParams, Blastn, LocalAligner, LocalHit};
pub use trf::{is_degenerate_motif, MotifLengthRange, RepeatFinder, RepeatHit, RepeatReport, Trf};
pub use workspace::Workspace;

use crate::error::{Result, TreError};
use log::debug;
use std::env;
use std::path::PathBuf;

/// Locate an executable on PATH
pub fn find_executable(name: &str) -> Result<PathBuf> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            debug!("Found {} at {}", name, candidate.display());
            return Ok(candidate);
        }
    }
    Err(TreError::ToolNotFound(name.to_string()))
}
