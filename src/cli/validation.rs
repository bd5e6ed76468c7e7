// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::{AnalysisConfig, Sex};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What the run does with its input list
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    /// Resolve insertion candidates into expanded loci
    Discovery { candidates: PathBuf },
    /// Genotype the loci of a locus file
    Genotype { loci: PathBuf },
}

pub struct ValidationResult {
    pub mode: RunMode,
    pub config: AnalysisConfig,
    pub genome: PathBuf,
    pub alignments: PathBuf,
    pub reads: Vec<PathBuf>,
    pub out_prefix: String,
    pub sample: String,
}

fn existing_file(option: &str, value: Option<&String>) -> Result<PathBuf, String> {
    let value = value.ok_or_else(|| format!("--{} is required", option))?;
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!("--{}: file '{}' not found", option, value));
    }
    Ok(path)
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    let genome = existing_file("genome", args.genome.as_ref())?;
    let alignments = existing_file("alignments", args.alignments.as_ref())?;
    let reads = args
        .reads
        .iter()
        .map(|r| existing_file("reads", Some(r)))
        .collect::<Result<Vec<_>, _>>()?;

    let mode = match (&args.loci, &args.candidates) {
        (Some(_), Some(_)) => return Err("--loci and --candidates are mutually exclusive".to_string()),
        (None, None) => return Err("Either --loci or --candidates is required".to_string()),
        (Some(_), None) => RunMode::Genotype {
            loci: existing_file("loci", args.loci.as_ref())?,
        },
        (None, Some(_)) => RunMode::Discovery {
            candidates: existing_file("candidates", args.candidates.as_ref())?,
        },
    };

    let out_prefix = args.out_prefix.clone().ok_or("--out-prefix is required")?;
    if out_prefix.is_empty() || out_prefix.ends_with('/') {
        return Err(format!("Invalid output prefix '{}'", out_prefix));
    }

    let defaults = AnalysisConfig::default();
    let config = AnalysisConfig {
        min_motif_len: args.min_motif_len.unwrap_or(defaults.min_motif_len),
        max_motif_len: args.max_motif_len.unwrap_or(defaults.max_motif_len),
        flank_size: args.flank_size.unwrap_or(defaults.flank_size),
        min_support: args.min_support.unwrap_or(defaults.min_support),
        min_cluster_size: args.min_cluster_size.unwrap_or(defaults.min_cluster_size),
        max_num_clusters: args.max_num_clusters.unwrap_or(defaults.max_num_clusters),
        sex: match &args.sex {
            Some(s) => Sex::from_str(s)?,
            None => defaults.sex,
        },
        genotype_in_size: args.genotype_in_size,
        trf_args: args.trf_args.clone().unwrap_or_else(|| defaults.trf_args.clone()),
        nprocs: args.nprocs.unwrap_or(defaults.nprocs),
        check_split: !args.no_split_check,
        debug: args.debug,
        min_expansion: args.min_expansion.unwrap_or(defaults.min_expansion),
        seed: args.seed,
        ..defaults
    };

    if config.min_motif_len == 0 {
        return Err("Minimum motif length must be at least 1".to_string());
    }
    if config.min_motif_len > config.max_motif_len {
        return Err(format!(
            "Minimum motif length {} exceeds maximum {}",
            config.min_motif_len, config.max_motif_len
        ));
    }
    if config.flank_size <= 0 {
        return Err("Flank size must be positive".to_string());
    }
    if config.nprocs == 0 {
        return Err("--nprocs must be at least 1".to_string());
    }
    if config.min_support == 0 || config.min_cluster_size == 0 {
        return Err("Minimum support and cluster size must be at least 1".to_string());
    }
    if config.max_num_clusters == 0 {
        return Err("Maximum number of clusters must be at least 1".to_string());
    }
    if config.min_expansion < 0 {
        return Err("Minimum expansion cannot be negative".to_string());
    }
    if config.trf_args.split_whitespace().next().is_none() {
        return Err("Repeat finder arguments cannot be empty".to_string());
    }

    let sample = match &args.sample {
        Some(s) => s.clone(),
        None => Path::new(&out_prefix)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "SAMPLE".to_string()),
    };

    Ok(ValidationResult {
        mode,
        config,
        genome,
        alignments,
        reads,
        out_prefix,
        sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;
    use std::fs;
    use tempfile::tempdir;

    fn parse(extra: &[&str], dir: &Path) -> Result<ValidationResult, String> {
        let genome = dir.join("ref.fa");
        let alignments = dir.join("aln.bam");
        let loci = dir.join("loci.bed");
        for path in [&genome, &alignments, &loci] {
            fs::write(path, "").unwrap();
        }
        let mut argv = vec![
            "--genome".to_string(),
            genome.display().to_string(),
            "--alignments".to_string(),
            alignments.display().to_string(),
            "--out-prefix".to_string(),
            dir.join("out/s1").display().to_string(),
        ];
        for e in extra {
            argv.push(e.replace("{loci}", &loci.display().to_string()));
        }
        let argv: Vec<&str> = argv.iter().map(|s| s.as_str()).collect();
        let args = Args::from_args(&["trecall"], &argv).unwrap();
        validate_args(&args)
    }

    #[test]
    fn test_genotype_mode() {
        let dir = tempdir().unwrap();
        let result = parse(&["--loci", "{loci}", "--sex", "male", "--nprocs", "4"], dir.path()).unwrap();
        assert!(matches!(result.mode, RunMode::Genotype { .. }));
        assert_eq!(result.config.sex, Sex::Male);
        assert_eq!(result.config.nprocs, 4);
        assert_eq!(result.config.flank_size, 100);
        assert_eq!(result.sample, "s1");
    }

    #[test]
    fn test_mode_required() {
        let dir = tempdir().unwrap();
        assert!(parse(&[], dir.path()).is_err());
        let missing = parse(&["--candidates", "/nonexistent/ins.tsv"], dir.path());
        assert!(missing.err().unwrap().contains("not found"));
    }

    #[test]
    fn test_bad_ranges() {
        let dir = tempdir().unwrap();
        assert!(parse(&["--loci", "{loci}", "--min-motif-len", "8", "--max-motif-len", "4"], dir.path()).is_err());
        assert!(parse(&["--loci", "{loci}", "--nprocs", "0"], dir.path()).is_err());
        assert!(parse(&["--loci", "{loci}", "--sex", "x"], dir.path()).is_err());
    }
}
