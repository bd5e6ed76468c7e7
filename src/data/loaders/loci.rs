// loci.rs - Locus file loader for directed genotyping

use crate::data::locus::{Locus, LocusOrigin};
use crate::error::{Result, TreError};
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Minimum columns: chrom, start, end, motif, label
const MIN_COLUMNS: usize = 5;

/// Parse a whitespace-separated locus file.
///
/// Lines starting with `#` are comments. Lines with fewer than five
/// columns are skipped with a warning. An optional sixth column is kept as
/// the variant id.
pub fn load_loci(path: &Path) -> Result<Vec<Locus>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut loci = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let cols: Vec<&str> = trimmed.split_whitespace().collect();
        if cols.len() < MIN_COLUMNS {
            warn!(
                "{} line {}: expected at least {} columns, got {}; skipped",
                path.display(),
                line_num + 1,
                MIN_COLUMNS,
                cols.len()
            );
            continue;
        }

        let start = cols[1]
            .parse::<i64>()
            .map_err(|_| TreError::parse("locus", line_num + 1, format!("bad start '{}'", cols[1])))?;
        let end = cols[2]
            .parse::<i64>()
            .map_err(|_| TreError::parse("locus", line_num + 1, format!("bad end '{}'", cols[2])))?;
        if end < start {
            return Err(TreError::parse("locus", line_num + 1, "end before start"));
        }

        let mut locus = Locus::new(cols[0], start, end, &cols[3].to_uppercase(), LocusOrigin::UserSupplied);
        locus.label = Some(cols[4].to_string());
        locus.variant_id = cols.get(5).map(|s| s.to_string());
        loci.push(locus);
    }

    info!("Loaded {} loci from {}", loci.len(), path.display());
    Ok(loci)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_loci() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loci.bed");
        std::fs::write(
            &path,
            "# chrom start end motif gene\n\
             chr4\t3074876\t3074933\tcag\tHTT\n\
             chrX\t147912050\t147912110\tCGG\tFMR1\trs123\n\
             chr1\t100\t200\tAT\n\
             \n",
        )
        .unwrap();

        let loci = load_loci(&path).unwrap();
        assert_eq!(loci.len(), 2);
        assert_eq!(loci[0].motif, "CAG");
        assert_eq!(loci[0].label.as_deref(), Some("HTT"));
        assert_eq!(loci[0].variant_id, None);
        assert_eq!(loci[1].variant_id.as_deref(), Some("rs123"));
        assert_eq!(loci[1].origin, LocusOrigin::UserSupplied);
    }

    #[test]
    fn test_bad_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loci.bed");
        std::fs::write(&path, "chr1\tabc\t200\tAT\tX\n").unwrap();
        let err = load_loci(&path).unwrap_err();
        assert!(matches!(err, TreError::Parse { line: 1, .. }));
    }
}
