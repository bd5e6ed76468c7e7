// main.rs - CLI entry point

use std::time::Instant;
use trecall::cli::Config;
use trecall::core::validate_pattern;
use trecall::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run_main() -> std::result::Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    init_logging(args.verbose);

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let validation = validate_args(&args)?;
    let config = &validation.config;

    println!("🚀 {}", trecall::get_info());
    println!("🧬 Genome: {}", validation.genome.display());
    println!("📂 Alignments: {}", validation.alignments.display());
    if !validation.reads.is_empty() {
        println!("📚 Read files: {}", validation.reads.len());
    }
    println!("🧵 Batches: {}", config.nprocs);

    let total_start = Instant::now();

    let finder = TreFinder::new(
        config.clone(),
        Box::new(FileInputs {
            alignments: validation.alignments.clone(),
            genome: validation.genome.clone(),
            reads: validation.reads.clone(),
        }),
        Box::new(Trf::new(&config.trf_args).map_err(|e| e.to_string())?),
        Box::new(Blastn::new().map_err(|e| e.to_string())?),
    );

    let (variants, genotyping) = match &validation.mode {
        RunMode::Discovery { candidates } => {
            let candidates = load_candidates(candidates).map_err(|e| e.to_string())?;
            println!("🔍 Discovery mode: {} insertion candidates", candidates.len());
            (finder.discover(candidates).map_err(|e| e.to_string())?, false)
        }
        RunMode::Genotype { loci } => {
            let loci = load_loci(loci).map_err(|e| e.to_string())?;
            for locus in loci.iter().filter(|l| l.is_wildcard()) {
                validate_pattern(&locus.motif).map_err(|e| format!("{} at {}", e, locus))?;
            }
            println!("🎯 Genotyping mode: {} loci", loci.len());
            (finder.genotype_loci(loci).map_err(|e| e.to_string())?, true)
        }
    };

    let called = variants.iter().filter(|v| !v.genotype.is_empty()).count();
    println!("✅ {} loci with alleles, {} genotyped", variants.len(), called);

    let prefix = &validation.out_prefix;
    let in_size = config.genotype_in_size;
    write_tsv(&format!("{}.tsv", prefix), &variants, in_size, &command_line)?;
    write_bed(&format!("{}.bed", prefix), &variants, config.max_num_clusters, in_size)?;
    if genotyping {
        write_vcf(&format!("{}.vcf", prefix), &variants, &validation.sample, in_size)?;
    }

    println!("⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}
