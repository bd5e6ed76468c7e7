// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// trecall - Tandem repeat expansion discovery and genotyping from long reads
pub struct Args {
    /// path to reference genome FASTA (indexed with .fai)
    #[argh(option)]
    pub genome: Option<String>,

    /// path to coordinate-sorted BAM (indexed with .bai or .csi)
    #[argh(option)]
    pub alignments: Option<String>,

    /// genotype the loci in this BED-like file (chrom start end motif label [variant_id])
    #[argh(option)]
    pub loci: Option<String>,

    /// discover expansions from this insertion candidates TSV
    #[argh(option)]
    pub candidates: Option<String>,

    /// output prefix for .tsv, .bed and .vcf files
    #[argh(option)]
    pub out_prefix: Option<String>,

    /// read FASTA for reads whose alignments carry no sequence (repeatable)
    #[argh(option)]
    pub reads: Vec<String>,

    /// number of parallel batches (default: 1)
    #[argh(option)]
    pub nprocs: Option<usize>,

    /// minimum reads supporting an allele (default: 2)
    #[argh(option)]
    pub min_support: Option<usize>,

    /// minimum motif length (default: 2)
    #[argh(option)]
    pub min_motif_len: Option<usize>,

    /// maximum motif length (default: 50)
    #[argh(option)]
    pub max_motif_len: Option<usize>,

    /// read flank kept on each side of a locus (default: 100)
    #[argh(option)]
    pub flank_size: Option<i64>,

    /// minimum reads in a genotype cluster (default: 2)
    #[argh(option)]
    pub min_cluster_size: Option<usize>,

    /// maximum genotype clusters per locus (default: 3)
    #[argh(option)]
    pub max_num_clusters: Option<usize>,

    /// genotype on repeat size in bp instead of copy number
    #[argh(switch)]
    pub genotype_in_size: bool,

    /// sample sex: female, male (default: female)
    #[argh(option)]
    pub sex: Option<String>,

    /// repeat finder arguments (default: "2 5 5 80 10 10 500 -d -h")
    #[argh(option)]
    pub trf_args: Option<String>,

    /// do not look for split alignments around loci
    #[argh(switch)]
    pub no_split_check: bool,

    /// minimum expansion over the reference span in bp, discovery only (default: 0)
    #[argh(option)]
    pub min_expansion: Option<i64>,

    /// seed for batch shuffling
    #[argh(option)]
    pub seed: Option<u64>,

    /// keep temporary tool files
    #[argh(switch)]
    pub debug: bool,

    /// verbose logging
    #[argh(switch)]
    pub verbose: bool,

    /// sample name in the VCF header (default: output prefix file name)
    #[argh(option)]
    pub sample: Option<String>,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
