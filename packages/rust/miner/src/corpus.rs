//! Line-delimited syntax-tree corpus reading.
//!
//! Each non-blank line of a corpus file is one independently parseable
//! document. A line that fails to decode is reported back to the caller as a
//! per-line error; only an unreadable corpus file is fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use lexcore_shared::{Document, LexCoreError, Result};

use crate::tree_miner::{CorpusMining, mine_document};

// ---------------------------------------------------------------------------
// Malformed input
// ---------------------------------------------------------------------------

/// A corpus line or record that was excluded from the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedInput {
    /// Where the input came from, e.g. `corpus.jsonl:17`.
    pub source: String,
    /// Why it was rejected.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// One decoded (or undecodable) corpus line.
#[derive(Debug)]
pub struct CorpusLine {
    /// 1-based line number in the corpus file.
    pub line_no: usize,
    pub document: Result<Document>,
}

/// Streaming reader over a line-delimited corpus.
pub struct CorpusReader {
    path: PathBuf,
    reader: BufReader<File>,
    line_no: usize,
    buf: Vec<u8>,
    finished: bool,
    keep_raw: bool,
}

impl CorpusReader {
    /// Open a corpus file. A missing or unreadable file is an error.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| LexCoreError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            line_no: 0,
            buf: Vec::new(),
            finished: false,
            keep_raw: false,
        })
    }

    /// Keep each node's source JSON while decoding.
    pub fn keep_raw(mut self, keep_raw: bool) -> Self {
        self.keep_raw = keep_raw;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `<file name>:<line>` label for diagnostics.
pub fn source_label(path: &Path, line_no: usize) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("{name}:{line_no}")
}

impl Iterator for CorpusReader {
    type Item = Result<CorpusLine>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    self.line_no += 1;
                    let document = match std::str::from_utf8(&self.buf) {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => Document::parse_line(line, self.keep_raw),
                        Err(e) => Err(LexCoreError::parse(format!("invalid UTF-8: {e}"))),
                    };
                    return Some(Ok(CorpusLine {
                        line_no: self.line_no,
                        document,
                    }));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(LexCoreError::io(&self.path, e)));
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Whole-corpus scan
// ---------------------------------------------------------------------------

/// Result of mining every document of a corpus file.
#[derive(Debug, Default)]
pub struct CorpusScan {
    pub mining: CorpusMining,
    pub malformed: Vec<MalformedInput>,
}

/// Mine every document of the corpus at `path`. With `include_raw`, each
/// example keeps its source JSON.
///
/// `on_document` is called after each successfully mined document with the
/// running document count.
#[instrument(skip_all, fields(corpus = %path.display()))]
pub fn scan_corpus(
    path: &Path,
    include_raw: bool,
    mut on_document: impl FnMut(usize),
) -> Result<CorpusScan> {
    let reader = CorpusReader::open(path)?.keep_raw(include_raw);
    let mut scan = CorpusScan::default();

    for line in reader {
        let line = line?;
        let label = source_label(path, line.line_no);
        match line.document {
            Ok(document) => {
                scan.mining.merge(mine_document(&document, include_raw));
                on_document(scan.mining.documents);
                debug!(source = %label, "document mined");
            }
            Err(e) => {
                warn!(source = %label, error = %e, "skipping malformed corpus line");
                scan.malformed.push(MalformedInput {
                    source: label,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        documents = scan.mining.documents,
        terms = scan.mining.terms.len(),
        examples = scan.mining.examples.len(),
        malformed = scan.malformed.len(),
        "corpus mined"
    );
    Ok(scan)
}
