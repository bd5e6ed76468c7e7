// pipeline.rs - Batch drivers for discovery and genotyping runs

use crate::core::alleles::{assemble_variants, MIN_INDEXED_MOTIF_LEN};
use crate::core::config::AnalysisConfig;
use crate::core::evidence::{collect_evidence, LocusEvidence, ReadFetcher};
use crate::core::genotype::{GapGenotyper, GenotypeConfig, Genotyper};
use crate::core::loci::{annotate_candidate, consolidate_loci, remove_redundants};
use crate::core::motif::MotifEquivalenceIndex;
use crate::core::rescue::{clear_of_locus, rescue_missed_clipped};
use crate::core::resolver::{resolve, CandidateHits, ResolverParams};
use crate::data::{
    AlignmentSource, BamAlignments, EvidenceKind, FastaSequences, InsertionCandidate, Locus, SequenceSet,
    SequenceSource, Variant,
};
use crate::error::{Result, TreError};
use crate::tools::{LocalAligner, RepeatFinder, RepeatHit, Workspace};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Sources one worker reads from
pub struct WorkerInputs {
    pub alignments: Box<dyn AlignmentSource>,
    pub genome: Box<dyn SequenceSource>,
    pub reads: Option<Box<dyn SequenceSource>>,
}

/// Opens a fresh set of sources for each worker
pub trait InputOpener: Send + Sync {
    fn open(&self) -> Result<WorkerInputs>;
}

/// Indexed BAM, indexed genome FASTA and optional read FASTA files
#[derive(Debug, Clone)]
pub struct FileInputs {
    pub alignments: PathBuf,
    pub genome: PathBuf,
    pub reads: Vec<PathBuf>,
}

impl InputOpener for FileInputs {
    fn open(&self) -> Result<WorkerInputs> {
        let alignments = BamAlignments::open(&self.alignments)?;
        let genome = FastaSequences::open(&self.genome)?;
        let reads = if self.reads.is_empty() {
            None
        } else {
            let mut sources: Vec<Box<dyn SequenceSource>> = Vec::with_capacity(self.reads.len());
            for path in &self.reads {
                sources.push(Box::new(FastaSequences::open(path)?));
            }
            Some(Box::new(SequenceSet::new(sources)) as Box<dyn SequenceSource>)
        };
        Ok(WorkerInputs {
            alignments: Box::new(alignments),
            genome: Box::new(genome),
            reads,
        })
    }
}

/// Split items into `n` contiguous batches whose sizes differ by at most one
pub fn split_batches<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    let n = n.max(1).min(items.len().max(1));
    let (k, m) = (items.len() / n, items.len() % n);
    let mut batches = Vec::with_capacity(n);
    let mut iter = items.into_iter();
    for i in 0..n {
        let size = k + usize::from(i < m);
        batches.push(iter.by_ref().take(size).collect());
    }
    batches
}

/// Shuffle items so batches get a similar mix of loci
pub fn shuffle_items<T>(items: &mut [T], seed: Option<u64>) {
    match seed {
        Some(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => items.shuffle(&mut rand::rng()),
    }
}

fn candidate_id(idx: usize, kind: EvidenceKind) -> String {
    format!("c{}.{}", idx, kind.tag())
}

/// `c<index>.<kind>` identifiers of discovery evidence
pub fn parse_candidate_id(id: &str) -> Option<(usize, EvidenceKind)> {
    let (idx, tag) = id.strip_prefix('c')?.split_once('.')?;
    Some((idx.parse().ok()?, EvidenceKind::from_tag(tag)?))
}

#[derive(Default)]
struct CandidateReport<'a> {
    insertion: &'a [RepeatHit],
    query_flank: &'a [RepeatHit],
    target_flank: &'a [RepeatHit],
}

/// Find repeats in the insertion, read flank and genome flank of each
/// candidate and annotate the ones explained by a tandem repeat.
pub fn resolve_batch(
    candidates: &[InsertionCandidate],
    genome: &mut dyn SequenceSource,
    finder: &dyn RepeatFinder,
    aligner: &dyn LocalAligner,
    workspace: &mut Workspace,
    config: &AnalysisConfig,
) -> Result<Vec<InsertionCandidate>> {
    let tf = config.target_flank;
    let mut fasta = String::new();
    for (idx, c) in candidates.iter().enumerate() {
        let target = match genome.fetch(&c.chrom, (c.pos - tf).max(0), c.pos + tf) {
            Ok(seq) => seq,
            Err(TreError::MissingSequence(name)) => {
                debug!("No genome sequence {} for candidate {}", name, c.read);
                continue;
            }
            Err(e) => return Err(e),
        };
        fasta.push_str(&format!(">{}\n{}\n", candidate_id(idx, EvidenceKind::QueryFlank), c.read_flank));
        fasta.push_str(&format!(">{}\n{}\n", candidate_id(idx, EvidenceKind::TargetFlank), target));
        fasta.push_str(&format!(">{}\n{}\n", candidate_id(idx, EvidenceKind::Insertion), c.insertion_seq));
    }
    if fasta.is_empty() {
        return Ok(Vec::new());
    }

    let report = finder.find_repeats(&fasta, config.motif_range(), workspace)?;
    let mut grouped: BTreeMap<usize, CandidateReport<'_>> = BTreeMap::new();
    for (id, hits) in report.iter() {
        let (idx, kind) = match parse_candidate_id(id) {
            Some(parsed) if parsed.0 < candidates.len() => parsed,
            _ => {
                debug!("Skipping unexpected sequence id {}", id);
                continue;
            }
        };
        let entry = grouped.entry(idx).or_default();
        match kind {
            EvidenceKind::Insertion => entry.insertion = hits,
            EvidenceKind::QueryFlank => entry.query_flank = hits,
            EvidenceKind::TargetFlank => entry.target_flank = hits,
            EvidenceKind::LocusSpan => {}
        }
    }

    let long_motifs = |hits: &[RepeatHit], set: &mut BTreeSet<String>| {
        set.extend(
            hits.iter()
                .filter(|h| h.motif.len() >= MIN_INDEXED_MOTIF_LEN)
                .map(|h| h.motif.clone()),
        );
    };
    let mut queries = BTreeSet::new();
    let mut targets = BTreeSet::new();
    for entry in grouped.values() {
        long_motifs(entry.insertion, &mut queries);
        long_motifs(entry.query_flank, &mut targets);
        long_motifs(entry.target_flank, &mut targets);
    }
    let index = MotifEquivalenceIndex::build(&queries, &targets, aligner, workspace)?;

    let params = ResolverParams {
        full_cov: config.full_cov,
        mid_pt_buf: config.breakpoint_buffer,
        target_flank: tf,
    };
    let mut resolved = Vec::new();
    for (idx, entry) in grouped {
        if entry.target_flank.is_empty() {
            continue;
        }
        let c = &candidates[idx];
        let hits = CandidateHits {
            insertion: entry.insertion,
            query_flank: entry.query_flank,
            target_flank: entry.target_flank,
        };
        if let Some(res) = resolve(hits, c.insertion_len(), c.pos - tf + 1, c.pos + tf, Some(&index), params) {
            let mut annotated = c.clone();
            annotate_candidate(&mut annotated, &res, config.motif_range());
            resolved.push(annotated);
        }
    }
    Ok(resolved)
}

/// Collect evidence, rescue clipped reads and genotype the loci of a batch
pub fn alleles_for_batch(
    loci: &[Locus],
    inputs: &mut WorkerInputs,
    finder: &dyn RepeatFinder,
    aligner: &dyn LocalAligner,
    genotyper: &dyn Genotyper,
    workspace: &mut Workspace,
    config: &AnalysisConfig,
) -> Result<Vec<Variant>> {
    let WorkerInputs {
        alignments,
        genome,
        reads,
    } = inputs;
    let mut fetcher = ReadFetcher::new(match reads.as_mut() {
        Some(r) => Some(r.as_mut()),
        None => None,
    });
    let collected = collect_evidence(loci, alignments.as_mut(), &mut fetcher, config)?;

    let mut evidence = collected.sequences;
    let rescued = rescue_missed_clipped(&collected.missed, loci, genome.as_mut(), aligner, workspace, config)?;
    for segment in rescued {
        let clip = &collected.missed[segment.missed];
        let locus = &loci[clip.locus];
        if clear_of_locus(clip, locus, config.closeness_to_end) {
            evidence.push(LocusEvidence {
                locus: clip.locus,
                evidence: segment.to_evidence(clip),
            });
        } else {
            debug!("Rescued {} ends too close to {}", clip.read, locus);
        }
    }

    let mut variants = assemble_variants(loci, &evidence, &collected.read_seqs, finder, aligner, workspace, config)?;
    let genotype_config = GenotypeConfig::from(config);
    for variant in &mut variants {
        variant.genotype = genotyper.genotype(variant, &genotype_config);
    }
    Ok(variants)
}

/// Runs discovery and genotyping over batches of candidates or loci
pub struct TreFinder {
    config: AnalysisConfig,
    inputs: Box<dyn InputOpener>,
    finder: Box<dyn RepeatFinder>,
    aligner: Box<dyn LocalAligner>,
    genotyper: Box<dyn Genotyper>,
}

impl TreFinder {
    pub fn new(
        config: AnalysisConfig,
        inputs: Box<dyn InputOpener>,
        finder: Box<dyn RepeatFinder>,
        aligner: Box<dyn LocalAligner>,
    ) -> Self {
        Self {
            config,
            inputs,
            finder,
            aligner,
            genotyper: Box::new(GapGenotyper),
        }
    }

    pub fn with_genotyper(mut self, genotyper: Box<dyn Genotyper>) -> Self {
        self.genotyper = genotyper;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Find repeat expansions among insertion candidates and genotype them
    pub fn discover(&self, candidates: Vec<InsertionCandidate>) -> Result<Vec<Variant>> {
        let config = &self.config;
        info!("Resolving {} insertion candidates", candidates.len());
        let annotated = self.run_batches(candidates, config, |batch, inputs, ws| {
            resolve_batch(batch, inputs.genome.as_mut(), self.finder.as_ref(), self.aligner.as_ref(), ws, config)
        })?;

        let loci = consolidate_loci(&annotated, config.merge_distance, config.min_motif_len);
        info!("{} candidates resolved into {} loci", annotated.len(), loci.len());

        let variants = self.collect_alleles(loci, config)?;
        let mut variants = remove_redundants(variants);
        if config.update_loci {
            for variant in &mut variants {
                variant.update_coords();
            }
        }
        Ok(variants
            .into_iter()
            .filter(|v| v.above_min_expansion(config.min_expansion, config.min_support, config.genotype_in_size))
            .collect())
    }

    /// Genotype user-supplied loci
    pub fn genotype_loci(&self, loci: Vec<Locus>) -> Result<Vec<Variant>> {
        let config = self.config.strict();
        info!("Genotyping {} loci", loci.len());
        self.collect_alleles(loci, &config)
    }

    fn collect_alleles(&self, loci: Vec<Locus>, config: &AnalysisConfig) -> Result<Vec<Variant>> {
        self.run_batches(loci, config, |batch, inputs, ws| {
            alleles_for_batch(
                batch,
                inputs,
                self.finder.as_ref(),
                self.aligner.as_ref(),
                self.genotyper.as_ref(),
                ws,
                config,
            )
        })
    }

    /// Shuffle, split into `nprocs` batches and process each on its own
    /// thread with its own sources and workspace. Any batch error fails
    /// the run; results keep batch order.
    fn run_batches<T, R, F>(&self, mut items: Vec<T>, config: &AnalysisConfig, work: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(&[T], &mut WorkerInputs, &mut Workspace) -> Result<Vec<R>> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let nprocs = config.nprocs.max(1);
        if nprocs > 1 {
            shuffle_items(&mut items, config.seed);
        }
        let batches = split_batches(items, nprocs);

        let pb = if batches.len() > 1 {
            let pb = ProgressBar::new(batches.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches") {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nprocs)
            .build()
            .map_err(|e| TreError::Pool(e.to_string()))?;

        let results: Result<Vec<Vec<R>>> = pool.install(|| {
            batches
                .into_par_iter()
                .map(|batch| {
                    let mut workspace = Workspace::new(config.debug)?;
                    let mut inputs = self.inputs.open()?;
                    let out = work(&batch, &mut inputs, &mut workspace)?;
                    pb.inc(1);
                    Ok(out)
                })
                .collect()
        });
        pb.finish_and_clear();
        Ok(results?.into_iter().flatten().collect())
    }
}
