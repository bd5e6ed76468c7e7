// sequence.rs - Genome and read sequence access

use crate::error::{Result, TreError};
use bio::alphabets::dna;
use bio::io::fasta;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Random access to named nucleotide sequences.
///
/// Coordinates are 0-based, half-open, clamped to the sequence length.
/// Unknown names yield [`TreError::MissingSequence`].
pub trait SequenceSource {
    fn fetch(&mut self, name: &str, start: i64, end: i64) -> Result<String>;

    fn fetch_all(&mut self, name: &str) -> Result<String>;

    fn contains(&self, name: &str) -> bool;
}

/// Clamp a half-open range to `[0, len]`
fn clamp_range(start: i64, end: i64, len: u64) -> (u64, u64) {
    let len = len as i64;
    let start = start.clamp(0, len);
    let end = end.clamp(start, len);
    (start as u64, end as u64)
}

/// Indexed FASTA file (requires a `.fai` next to it)
pub struct FastaSequences {
    reader: fasta::IndexedReader<File>,
    lengths: HashMap<String, u64>,
}

impl FastaSequences {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = fasta::IndexedReader::from_file(&path).map_err(|e| {
            TreError::InvalidInput(format!("cannot open indexed FASTA {}: {}", path.display(), e))
        })?;
        let lengths = reader
            .index
            .sequences()
            .into_iter()
            .map(|s| (s.name, s.len))
            .collect::<HashMap<_, _>>();
        debug!("Opened {} ({} sequences)", path.display(), lengths.len());
        Ok(Self { reader, lengths })
    }

    fn read_range(&mut self, name: &str, start: u64, end: u64) -> Result<String> {
        let mut buf = Vec::with_capacity((end - start) as usize);
        self.reader.fetch(name, start, end)?;
        self.reader.read(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).to_ascii_uppercase())
    }
}

impl SequenceSource for FastaSequences {
    fn fetch(&mut self, name: &str, start: i64, end: i64) -> Result<String> {
        let len = *self
            .lengths
            .get(name)
            .ok_or_else(|| TreError::MissingSequence(name.to_string()))?;
        let (start, end) = clamp_range(start, end, len);
        if start == end {
            return Ok(String::new());
        }
        self.read_range(name, start, end)
    }

    fn fetch_all(&mut self, name: &str) -> Result<String> {
        let len = *self
            .lengths
            .get(name)
            .ok_or_else(|| TreError::MissingSequence(name.to_string()))?;
        self.read_range(name, 0, len)
    }

    fn contains(&self, name: &str) -> bool {
        self.lengths.contains_key(name)
    }
}

/// Sequences held in memory
#[derive(Debug, Clone, Default)]
pub struct SequenceMap {
    seqs: HashMap<String, String>,
}

impl SequenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, seq: &str) {
        self.seqs.insert(name.to_string(), seq.to_ascii_uppercase());
    }

    /// Load every record of a (possibly unindexed) FASTA file
    pub fn from_fasta(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = fasta::Reader::new(BufReader::new(file));
        let mut map = Self::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| TreError::parse("FASTA record", i + 1, e.to_string()))?;
            map.insert(record.id(), &String::from_utf8_lossy(record.seq()));
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }
}

impl SequenceSource for SequenceMap {
    fn fetch(&mut self, name: &str, start: i64, end: i64) -> Result<String> {
        let seq = self
            .seqs
            .get(name)
            .ok_or_else(|| TreError::MissingSequence(name.to_string()))?;
        let (start, end) = clamp_range(start, end, seq.len() as u64);
        Ok(seq[start as usize..end as usize].to_string())
    }

    fn fetch_all(&mut self, name: &str) -> Result<String> {
        self.seqs
            .get(name)
            .cloned()
            .ok_or_else(|| TreError::MissingSequence(name.to_string()))
    }

    fn contains(&self, name: &str) -> bool {
        self.seqs.contains_key(name)
    }
}

/// Several sequence files searched in order, e.g. one read FASTA per run
#[derive(Default)]
pub struct SequenceSet {
    sources: Vec<Box<dyn SequenceSource>>,
}

impl SequenceSet {
    pub fn new(sources: Vec<Box<dyn SequenceSource>>) -> Self {
        Self { sources }
    }

    fn source_for(&mut self, name: &str) -> Result<&mut Box<dyn SequenceSource>> {
        self.sources
            .iter_mut()
            .find(|s| s.contains(name))
            .ok_or_else(|| TreError::MissingSequence(name.to_string()))
    }
}

impl SequenceSource for SequenceSet {
    fn fetch(&mut self, name: &str, start: i64, end: i64) -> Result<String> {
        self.source_for(name)?.fetch(name, start, end)
    }

    fn fetch_all(&mut self, name: &str) -> Result<String> {
        self.source_for(name)?.fetch_all(name)
    }

    fn contains(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s.contains(name))
    }
}

/// Segment `[start, end)` of a read in alignment orientation.
///
/// Reads are stored as sequenced, so reverse-strand alignments are
/// reverse complemented before slicing.
pub fn read_segment(
    reads: &mut dyn SequenceSource,
    name: &str,
    is_reverse: bool,
    start: i64,
    end: i64,
) -> Result<String> {
    if !is_reverse {
        return reads.fetch(name, start, end);
    }
    let seq = reads.fetch_all(name)?;
    let rc = String::from_utf8_lossy(&dna::revcomp(seq.as_bytes())).into_owned();
    let (start, end) = clamp_range(start, end, rc.len() as u64);
    Ok(rc[start as usize..end as usize].to_string())
}
