// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

fn fill<T>(cli: &mut Option<T>, file: Option<T>) {
    if cli.is_none() {
        *cli = file;
    }
}

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        fill(&mut self.genome, config.genome);
        fill(&mut self.alignments, config.alignments);
        fill(&mut self.loci, config.loci);
        fill(&mut self.candidates, config.candidates);
        fill(&mut self.out_prefix, config.out_prefix);
        fill(&mut self.sample, config.sample);
        if self.reads.is_empty() {
            self.reads = config.reads.unwrap_or_default();
        }

        // Repeat detection
        fill(&mut self.min_motif_len, config.min_motif_len);
        fill(&mut self.max_motif_len, config.max_motif_len);
        fill(&mut self.flank_size, config.flank_size);
        fill(&mut self.trf_args, config.trf_args);
        fill(&mut self.min_support, config.min_support);
        fill(&mut self.min_expansion, config.min_expansion);

        // Genotyping
        fill(&mut self.min_cluster_size, config.min_cluster_size);
        fill(&mut self.max_num_clusters, config.max_num_clusters);
        fill(&mut self.sex, config.sex);

        // Performance
        fill(&mut self.nprocs, config.nprocs);
        fill(&mut self.seed, config.seed);

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.genotype_in_size && config.genotype_in_size.unwrap_or(false) {
            self.genotype_in_size = true;
        }
        if !self.no_split_check && config.no_split_check.unwrap_or(false) {
            self.no_split_check = true;
        }
        if !self.debug && config.debug.unwrap_or(false) {
            self.debug = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
