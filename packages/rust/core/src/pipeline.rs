//! Run orchestrators: word shards → core units, and corpus → code units.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use lexcore_lexicon::{CoreUnitBuilder, LexicalBase};
use lexcore_miner::{ExampleBank, load_example_bank, scan_corpus};
use lexcore_shared::{
    AppConfig, CodeUnit, CoreUnit, LexCoreError, Result, SYSTEM_VERSION, normalize_value,
};
use lexcore_storage::Storage;

use crate::context::RunContext;
use crate::definitions::{DefinitionProvider, define_cached};
use crate::export::{ExportPaths, write_json, write_skipped};
use crate::matcher::match_examples;

/// Configuration for [`build_word_shards`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding `<letter>.json` shards.
    pub word_dir: PathBuf,
    /// Restrict the run to one shard.
    pub letter: Option<char>,
    pub output_dir: PathBuf,
    /// Two-word concept phrases.
    pub compound: bool,
}

impl BuildConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            word_dir: PathBuf::from(&config.paths.word_dir),
            letter: None,
            output_dir: PathBuf::from(&config.paths.output_dir),
            compound: config.concepts.compound,
        }
    }
}

/// Configuration for [`mine_corpus`].
#[derive(Debug, Clone)]
pub struct MineConfig {
    /// Line-delimited syntax-tree corpus.
    pub corpus: PathBuf,
    pub output_dir: PathBuf,
    /// Keep raw sub-trees in the example bank.
    pub include_raw: bool,
    /// Load `example_bank.json` from the output directory when present.
    pub reuse_example_bank: bool,
    pub language: String,
    pub corpus_tag: String,
    pub compound: bool,
    /// Upper bound for one definition provider call.
    pub definition_timeout: Duration,
}

impl MineConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            corpus: PathBuf::from(&config.paths.corpus),
            output_dir: PathBuf::from(&config.paths.output_dir),
            include_raw: config.mining.include_raw,
            reuse_example_bank: config.mining.reuse_example_bank,
            language: config.mining.language.clone(),
            corpus_tag: config.mining.corpus_tag.clone(),
            compound: config.concepts.compound,
            definition_timeout: config.definitions.timeout(),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_id: String,
    /// Corpus documents mined (mining only).
    pub documents: usize,
    /// Distinct vocabulary terms (mining only).
    pub terms: usize,
    pub examples: usize,
    pub code_units: usize,
    /// Core units produced by this run.
    pub core_units: usize,
    /// Core units in the store after this run.
    pub core_count: u64,
    pub skipped: usize,
    pub malformed: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called per processed item; `total` is `None` when unknown.
    fn item_progress(&self, current: usize, total: Option<usize>, label: &str);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_progress(&self, _current: usize, _total: Option<usize>, _label: &str) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Word shards
// ---------------------------------------------------------------------------

/// Build core units from letter-sharded word lists.
///
/// Each shard is written inside one storage batch and its unit count is
/// recorded as `letter_<x>_count`. Missing or unreadable shards are logged
/// and skipped; a missing shard directory aborts the run.
#[instrument(skip_all, fields(word_dir = %config.word_dir.display(), letter = ?config.letter))]
pub async fn build_word_shards<L: LexicalBase + ?Sized>(
    config: &BuildConfig,
    lexicon: &L,
    storage: &Storage,
    ctx: &mut RunContext,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    if !config.word_dir.is_dir() {
        return Err(LexCoreError::io(
            &config.word_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "word shard directory not found"),
        ));
    }
    let letters = shard_letters(config.letter)?;
    let builder = CoreUnitBuilder::new(lexicon).compound(config.compound);

    info!(run_id = %ctx.run_id, shards = letters.len(), "starting shard build");
    progress.phase("Building core units");

    let mut units: Vec<CoreUnit> = Vec::new();
    for (i, letter) in letters.iter().enumerate() {
        progress.item_progress(i + 1, Some(letters.len()), &format!("shard {letter}"));

        let path = config.word_dir.join(format!("{letter}.json"));
        let Some(words) = load_shard(&path) else {
            continue;
        };

        storage.begin_batch().await?;
        let outcome = build_shard(&builder, &words, storage, ctx).await;
        let produced = settle_batch(storage, outcome).await?;

        storage
            .set_meta(&format!("letter_{letter}_count"), &produced.len().to_string())
            .await?;
        info!(letter = %letter, words = words.len(), units = produced.len(), "shard done");
        units.extend(produced);
    }

    progress.phase("Exporting");
    let paths = ExportPaths::new(&config.output_dir);
    let core_count = finish_run(storage, ctx, &paths, &units).await?;

    let summary = RunSummary {
        run_id: ctx.run_id.to_string(),
        core_units: units.len(),
        core_count,
        skipped: ctx.skipped().len(),
        elapsed: start.elapsed(),
        ..Default::default()
    };
    info!(
        units = summary.core_units,
        core_count,
        skipped = summary.skipped,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "shard build complete"
    );
    progress.done(&summary);
    Ok(summary)
}

/// Letters to process: `a..=z`, or the single requested one.
fn shard_letters(letter: Option<char>) -> Result<Vec<char>> {
    match letter {
        None => Ok(('a'..='z').collect()),
        Some(c) if c.is_ascii_alphabetic() => Ok(vec![c.to_ascii_lowercase()]),
        Some(c) => Err(LexCoreError::validation(format!(
            "shard letter must be a-z, got {c:?}"
        ))),
    }
}

/// Raw words of one shard, or `None` when it cannot be used.
fn load_shard(path: &Path) -> Option<Vec<Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no shard file, skipping");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable shard, skipping");
            return None;
        }
    };

    match serde_json::from_str::<Vec<Value>>(&content) {
        Ok(words) => Some(words),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "shard is not a JSON array, skipping");
            None
        }
    }
}

/// Text recorded in the skipped log for a raw word.
fn raw_label(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn build_shard<L: LexicalBase + ?Sized>(
    builder: &CoreUnitBuilder<'_, L>,
    words: &[Value],
    storage: &Storage,
    ctx: &mut RunContext,
) -> Result<Vec<CoreUnit>> {
    let mut units = Vec::new();
    for raw in words {
        let label = raw_label(raw);
        let Some(normalized) = normalize_value(raw) else {
            ctx.skip(label);
            continue;
        };
        let Some(unit) = builder.build(&label, &normalized, Some(ctx.timestamp)) else {
            ctx.skip(label);
            continue;
        };
        if !ctx.claim(&unit.id) {
            debug!(id = %unit.id, raw = %label, "duplicate core unit");
            ctx.skip(label);
            continue;
        }
        storage.insert_core_unit(&unit).await?;
        units.push(unit);
    }
    Ok(units)
}

// ---------------------------------------------------------------------------
// Corpus mining
// ---------------------------------------------------------------------------

/// Mine a syntax-tree corpus into an example bank and code units, and build
/// core units for coded terms when a lexical base is supplied.
///
/// 1. Mine every corpus document (malformed lines are recorded)
/// 2. Summarize or reload the example bank
/// 3. Classify terms, link examples, attach definitions
/// 4. Export and record run metadata
#[instrument(skip_all, fields(corpus = %config.corpus.display()))]
pub async fn mine_corpus<L, P>(
    config: &MineConfig,
    lexicon: Option<&L>,
    definitions: &P,
    storage: &Storage,
    ctx: &mut RunContext,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary>
where
    L: LexicalBase + ?Sized,
    P: DefinitionProvider,
{
    let start = Instant::now();
    info!(run_id = %ctx.run_id, lexicon = lexicon.is_some(), "starting corpus mining");

    // --- Phase 1: Mine ---
    progress.phase("Mining corpus");
    let scan = scan_corpus(&config.corpus, config.include_raw, |n| {
        progress.item_progress(n, None, "documents")
    })?;
    ctx.record_malformed(scan.malformed);
    let mut mining = scan.mining;

    // --- Phase 2: Example bank ---
    progress.phase("Summarizing examples");
    let paths = ExportPaths::new(&config.output_dir);
    let bank = if config.reuse_example_bank && paths.example_bank.exists() {
        load_example_bank(&paths.example_bank)?
    } else {
        let bank = std::mem::take(&mut mining.examples);
        write_json(&paths.example_bank, &bank)?;
        bank
    };

    storage.begin_batch().await?;
    let outcome = store_examples(&bank, storage).await;
    settle_batch(storage, outcome).await?;

    // --- Phase 3: Terms ---
    progress.phase("Linking terms");
    let builder = lexicon.map(|lex| CoreUnitBuilder::new(lex).compound(config.compound));
    let docstrings = mining.docstrings_by_term();
    let total = mining.terms.len();

    let mut code_units: Vec<CodeUnit> = Vec::new();
    let mut core_units: Vec<CoreUnit> = Vec::new();

    storage.begin_batch().await?;
    let outcome = async {
        for (i, term) in mining.terms.iter().enumerate() {
            progress.item_progress(i + 1, Some(total), term);

            let Some(code) = ctx.classifier.classify(term).suggested_code.clone() else {
                continue;
            };

            let definition = match docstrings.get(term) {
                Some(doc) => doc.clone(),
                None => define_cached(definitions, storage, term, config.definition_timeout).await?,
            };
            let unit = CodeUnit {
                id: code,
                term: term.clone(),
                concept: term.clone(),
                definition,
                example_ids: match_examples(term, &bank),
                language: config.language.clone(),
                source: config.corpus_tag.clone(),
            };
            storage.insert_code_unit(&unit).await?;
            code_units.push(unit);

            let Some(builder) = &builder else {
                continue;
            };
            match builder.build(term, term, Some(ctx.timestamp)) {
                Some(core) if ctx.claim(&core.id) => {
                    storage.insert_core_unit(&core).await?;
                    core_units.push(core);
                }
                Some(core) => {
                    debug!(id = %core.id, term = %term, "duplicate core unit");
                    ctx.skip(term.clone());
                }
                None => ctx.skip(term.clone()),
            }
        }
        Ok::<(), LexCoreError>(())
    }
    .await;
    settle_batch(storage, outcome).await?;

    // --- Phase 4: Export ---
    progress.phase("Exporting");
    write_json(&paths.code_units, &code_units)?;
    let core_count = finish_run(storage, ctx, &paths, &core_units).await?;

    let summary = RunSummary {
        run_id: ctx.run_id.to_string(),
        documents: mining.documents,
        terms: total,
        examples: bank.len(),
        code_units: code_units.len(),
        core_units: core_units.len(),
        core_count,
        skipped: ctx.skipped().len(),
        malformed: ctx.malformed().len(),
        elapsed: start.elapsed(),
    };
    info!(
        documents = summary.documents,
        terms = summary.terms,
        examples = summary.examples,
        code_units = summary.code_units,
        core_units = summary.core_units,
        malformed = summary.malformed,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "corpus mining complete"
    );
    progress.done(&summary);
    Ok(summary)
}

async fn store_examples(bank: &ExampleBank, storage: &Storage) -> Result<()> {
    for (id, example) in bank {
        let json = serde_json::to_string(example)
            .map_err(|e| LexCoreError::validation(format!("JSON serialization failed: {e}")))?;
        storage.insert_example(id, &example.kind, &json).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

/// Commit the open batch on success, roll it back on failure.
async fn settle_batch<T>(storage: &Storage, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            storage.commit_batch().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = storage.rollback_batch().await {
                warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

/// Record run metadata and export this run's core units and skipped terms.
/// Returns the number of core units in the store.
async fn finish_run(
    storage: &Storage,
    ctx: &RunContext,
    paths: &ExportPaths,
    units: &[CoreUnit],
) -> Result<u64> {
    let core_count = storage.count_core_units().await?;
    storage.set_meta("core_count", &core_count.to_string()).await?;
    storage
        .set_meta("build_timestamp", &ctx.timestamp.to_rfc3339())
        .await?;
    storage.set_meta("system_version", SYSTEM_VERSION).await?;
    storage.set_meta("run_id", &ctx.run_id.to_string()).await?;

    write_json(&paths.core_units, units)?;
    write_skipped(&paths.skipped, ctx.skipped())?;
    Ok(core_count)
}
