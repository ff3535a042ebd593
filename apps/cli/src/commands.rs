//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use lexcore_core::{
    BuildConfig, ChatDefinitions, DefinitionProvider, MineConfig, NoDefinitions,
    ProgressReporter, RunContext, RunSummary, build_word_shards, mine_corpus,
};
use lexcore_lexicon::JsonLexicon;
use lexcore_shared::{AppConfig, CoreUnit, init_config, load_config, validate_api_key};
use lexcore_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// lexcore — mine code and word lists into lexical core units.
#[derive(Parser)]
#[command(
    name = "lexcore",
    version,
    about = "Mine syntax-tree corpora and word lists into a store of lexical core units.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Mine a line-delimited syntax-tree corpus into examples and code units.
    Mine {
        /// Corpus file (one tree document per line).
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Lexicon export; when given, core units are built for coded terms.
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Output directory for exports.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Database file.
        #[arg(long)]
        db: Option<PathBuf>,

        /// Drop raw sub-trees from the exported example bank.
        #[arg(long)]
        no_raw: bool,
    },

    /// Build core units from letter-sharded word lists.
    Build {
        /// Only process this letter's shard.
        #[arg(long)]
        letter: Option<char>,

        /// Directory holding `<letter>.json` shards.
        #[arg(long)]
        words: Option<PathBuf>,

        /// Lexicon export.
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Output directory for exports.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Database file.
        #[arg(long)]
        db: Option<PathBuf>,

        /// Keep units already in the database and skip their ids.
        #[arg(long)]
        resume: bool,
    },

    /// Look up stored core units (read-only).
    #[command(group(ArgGroup::new("key").required(true).multiple(false)))]
    Lookup {
        /// Match by stem.
        #[arg(long, group = "key")]
        stem: Option<String>,

        /// Match by concept.
        #[arg(long, group = "key")]
        concept: Option<String>,

        /// Match by id, e.g. DOG_N_CORE.
        #[arg(long, group = "key")]
        id: Option<String>,

        /// Database file.
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lexcore=info",
        1 => "lexcore=debug",
        _ => "lexcore=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Mine {
            corpus,
            lexicon,
            out,
            db,
            no_raw,
        } => cmd_mine(corpus, lexicon, out, db, no_raw).await,
        Command::Build {
            letter,
            words,
            lexicon,
            out,
            db,
            resume,
        } => cmd_build(letter, words, lexicon, out, db, resume).await,
        Command::Lookup {
            stem,
            concept,
            id,
            db,
        } => cmd_lookup(stem, concept, id, db).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Database path: flag, else config.
fn db_path(config: &AppConfig, db: Option<PathBuf>) -> PathBuf {
    db.unwrap_or_else(|| PathBuf::from(&config.paths.db_path))
}

fn load_lexicon(path: &Path) -> Result<JsonLexicon> {
    JsonLexicon::from_path(path)
        .map_err(|e| eyre!("cannot load lexicon '{}': {e}", path.display()))
}

// ---------------------------------------------------------------------------
// mine
// ---------------------------------------------------------------------------

async fn cmd_mine(
    corpus: Option<PathBuf>,
    lexicon: Option<PathBuf>,
    out: Option<PathBuf>,
    db: Option<PathBuf>,
    no_raw: bool,
) -> Result<()> {
    let config = load_config()?;

    let mut mine_config = MineConfig::from_config(&config);
    if let Some(corpus) = corpus {
        mine_config.corpus = corpus;
    }
    if let Some(out) = out {
        mine_config.output_dir = out;
    }
    if no_raw {
        mine_config.include_raw = false;
    }

    let lexicon = lexicon.as_deref().map(load_lexicon).transpose()?;
    let storage = Storage::open(&db_path(&config, db)).await?;
    let mut ctx = RunContext::new(Utc::now());

    info!(
        corpus = %mine_config.corpus.display(),
        out = %mine_config.output_dir.display(),
        lexicon = lexicon.is_some(),
        definitions = config.definitions.enabled,
        "mining corpus"
    );

    let summary = if config.definitions.enabled {
        let api_key = validate_api_key(&config)?;
        let provider = ChatDefinitions::new(&config.definitions, api_key)?;
        run_mine(&mine_config, lexicon.as_ref(), &provider, &storage, &mut ctx).await?
    } else {
        run_mine(&mine_config, lexicon.as_ref(), &NoDefinitions, &storage, &mut ctx).await?
    };

    println!();
    println!("  Corpus mined.");
    println!("  Run:        {}", summary.run_id);
    println!("  Documents:  {}", summary.documents);
    println!("  Malformed:  {}", summary.malformed);
    println!("  Terms:      {}", summary.terms);
    println!("  Examples:   {}", summary.examples);
    println!("  Code units: {}", summary.code_units);
    println!("  Core units: {} (store: {})", summary.core_units, summary.core_count);
    println!("  Skipped:    {}", summary.skipped);
    println!("  Output:     {}", mine_config.output_dir.display());
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn run_mine<P: DefinitionProvider>(
    config: &MineConfig,
    lexicon: Option<&JsonLexicon>,
    provider: &P,
    storage: &Storage,
    ctx: &mut RunContext,
) -> Result<RunSummary> {
    let reporter = CliProgress::new();
    Ok(mine_corpus(config, lexicon, provider, storage, ctx, &reporter).await?)
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

async fn cmd_build(
    letter: Option<char>,
    words: Option<PathBuf>,
    lexicon: Option<PathBuf>,
    out: Option<PathBuf>,
    db: Option<PathBuf>,
    resume: bool,
) -> Result<()> {
    let config = load_config()?;

    let mut build_config = BuildConfig::from_config(&config);
    build_config.letter = letter;
    if let Some(words) = words {
        build_config.word_dir = words;
    }
    if let Some(out) = out {
        build_config.output_dir = out;
    }

    let lexicon_path = lexicon.unwrap_or_else(|| PathBuf::from(&config.paths.lexicon));
    let lexicon = load_lexicon(&lexicon_path)?;
    let storage = Storage::open(&db_path(&config, db)).await?;

    let mut ctx = if resume {
        RunContext::resume(&storage, Utc::now()).await?
    } else {
        RunContext::new(Utc::now())
    };

    info!(
        words = %build_config.word_dir.display(),
        letter = ?build_config.letter,
        resume,
        "building core units"
    );

    let reporter = CliProgress::new();
    let summary =
        build_word_shards(&build_config, &lexicon, &storage, &mut ctx, &reporter).await?;

    println!();
    println!("  Core units built.");
    println!("  Run:     {}", summary.run_id);
    println!("  Built:   {}", summary.core_units);
    println!("  Store:   {}", summary.core_count);
    println!("  Skipped: {}", summary.skipped);
    println!("  Output:  {}", build_config.output_dir.display());
    println!("  Time:    {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// lookup
// ---------------------------------------------------------------------------

async fn cmd_lookup(
    stem: Option<String>,
    concept: Option<String>,
    id: Option<String>,
    db: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;
    let storage = Storage::open_readonly(&db_path(&config, db)).await?;

    let units: Vec<CoreUnit> = match (stem, concept, id) {
        (Some(stem), _, _) => storage.find_by_stem(&stem).await?,
        (_, Some(concept), _) => storage.find_by_concept(&concept).await?,
        (_, _, Some(id)) => storage.get_core_unit(&id).await?.into_iter().collect(),
        _ => return Err(eyre!("one of --stem, --concept or --id is required")),
    };

    if units.is_empty() {
        println!("no matching core units");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&units)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_progress(&self, current: usize, total: Option<usize>, label: &str) {
        let message = match total {
            Some(total) => format!("[{current}/{total}] {label}"),
            None => format!("[{current}] {label}"),
        };
        self.spinner.set_message(message);
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn lookup_requires_exactly_one_key() {
        assert!(Cli::try_parse_from(["lexcore", "lookup"]).is_err());
        assert!(
            Cli::try_parse_from(["lexcore", "lookup", "--stem", "dog", "--id", "DOG_N_CORE"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["lexcore", "lookup", "--concept", "animal"]).is_ok());
    }

    #[test]
    fn parses_build_flags() {
        let cli = Cli::try_parse_from([
            "lexcore", "-vv", "build", "--letter", "d", "--words", "fixtures/words", "--resume",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Build {
                letter, words, resume, ..
            } => {
                assert_eq!(letter, Some('d'));
                assert_eq!(words, Some(PathBuf::from("fixtures/words")));
                assert!(resume);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn parses_mine_flags() {
        let cli = Cli::try_parse_from([
            "lexcore", "mine", "--corpus", "c.jsonl", "--no-raw", "--log-format", "json",
        ])
        .expect("parse");
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(cli.command, Command::Mine { no_raw: true, .. }));
    }
}
