use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fairmatch_core::{
    AggregateRecord, CanonicalRecord, CompositeScorer, ExtractionPayload, FairmatchConfig,
    FairmatchError, Field, LoadedCollection, MAX_SOURCES, Schema, SimilarityKind, compare_records,
    diff_all, load_path, pick_official_homepage,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "fairmatch",
    about = "Reconcile exhibition records extracted from independent sources",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting FAIRMATCH_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.config/fairmatch/config.toml or $FAIRMATCH_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical records of an input file.
    Canonicalize {
        file: PathBuf,
        /// Also normalize dates, first-held year and homepage values.
        #[arg(long)]
        normalize_values: bool,
    },

    /// Find the best right-side match for every left record.
    Compare {
        left: PathBuf,
        right: PathBuf,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        weight_primary: Option<f64>,
        #[arg(long)]
        weight_secondary: Option<f64>,
        /// partial | sequence
        #[arg(long)]
        similarity: Option<SimilarityKind>,
    },

    /// Score every left record against every right record.
    Score { left: PathBuf, right: PathBuf },

    /// Field-by-field diff of the first usable record of each file.
    Diff { left: PathBuf, right: PathBuf },

    /// Build an aggregate record from up to four sources.
    Merge {
        #[arg(required = true, num_args = 1..=MAX_SOURCES)]
        files: Vec<PathBuf>,
        /// Source (1-based) every field starts from and divergence is measured against.
        #[arg(long, default_value = "1")]
        primary: usize,
        /// Take FIELD from source N, e.g. --pick homepage=2.
        #[arg(long, value_name = "FIELD=N", action = clap::ArgAction::Append)]
        pick: Vec<String>,
        /// Empty FIELD.
        #[arg(long, value_name = "FIELD", action = clap::ArgAction::Append)]
        clear: Vec<String>,
        /// Set FIELD to VALUE directly.
        #[arg(long, value_name = "FIELD=VALUE", action = clap::ArgAction::Append)]
        set: Vec<String>,
    },

    /// Turn raw extractor output into an extraction payload.
    Extract {
        file: PathBuf,
        #[arg(long, default_value = "")]
        source_url: String,
        #[arg(long, default_value = "unknown")]
        model: String,
        #[arg(long, default_value = "0")]
        num_ctx: u32,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective config as TOML.
    Show,
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fairmatch=warn,fairmatch_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("FAIRMATCH_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli, json_output, start).await {
        let code = exit_code(&err);
        let load_failure = code == EXIT_LOAD_FAILURE;
        if json_output {
            let envelope = serde_json::json!({
                "status": "error",
                "error": if load_failure { "load_failed" } else { "failed" },
                "message": format!("{err:#}"),
                "meta": { "duration_ms": start.elapsed().as_millis() }
            });
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_default());
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(code);
    }
}

const EXIT_FAILURE: i32 = 1;
const EXIT_LOAD_FAILURE: i32 = 2;

/// 2 when any cause in the chain is an input that could not be loaded,
/// 1 for everything else. An empty comparison is not an error at all.
fn exit_code(err: &anyhow::Error) -> i32 {
    let load_failure = err.chain().any(|cause| {
        cause
            .downcast_ref::<FairmatchError>()
            .is_some_and(FairmatchError::is_load_failure)
    });
    if load_failure {
        EXIT_LOAD_FAILURE
    } else {
        EXIT_FAILURE
    }
}

async fn run(cli: Cli, json_output: bool, start: Instant) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(FairmatchConfig::config_path);
    let mut config = FairmatchConfig::load_from(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let schema = config.build_schema()?;

    match cli.command {
        Commands::Canonicalize {
            file,
            normalize_values,
        } => {
            let mut collection = load_side(&file, &schema, "input")?;
            if normalize_values {
                collection.records.iter_mut().for_each(CanonicalRecord::normalize_values);
            }
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": collection.records, "skipped": collection.skipped },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                for (i, record) in collection.records.iter().enumerate() {
                    println!("### #{} {}\n", i + 1, record.display_name());
                    println!("{}\n", record.to_markdown());
                }
                print_skipped(&collection);
            }
        }

        Commands::Compare {
            left,
            right,
            threshold,
            weight_primary,
            weight_secondary,
            similarity,
        } => {
            let matching = &mut config.matching;
            if let Some(t) = threshold {
                matching.threshold = t;
            }
            if let Some(w) = weight_primary {
                matching.weights.primary = w;
            }
            if let Some(w) = weight_secondary {
                matching.weights.secondary = w;
            }
            if let Some(s) = similarity {
                matching.similarity = s;
            }
            matching.validate()?;

            let (left, right) = load_pair(&left, &right, &schema)?;
            let comparison = compare_records(&left.records, &right.records, &config.matching);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": comparison,
                    "meta": { "duration_ms": dur, "left": left.len(), "right": right.len() }
                }))?;
            } else {
                println!("{comparison}");
            }
        }

        Commands::Score { left, right } => {
            let (left, right) = load_pair(&left, &right, &schema)?;
            let scorer = CompositeScorer::new(config.matching.weights, config.matching.similarity);
            let mut rows = Vec::with_capacity(left.len() * right.len());
            for (i, a) in left.records.iter().enumerate() {
                for (j, b) in right.records.iter().enumerate() {
                    rows.push((i, j, scorer.breakdown(a, b)));
                }
            }
            let dur = start.elapsed().as_millis();

            if json_output {
                let items: Vec<_> = rows
                    .iter()
                    .map(|(i, j, b)| serde_json::json!({ "left": i, "right": j, "score": b }))
                    .collect();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": items, "similarity": scorer.similarity_name() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("| Left | Right | 국문명 | 영문명 | Score |");
                println!("|---|---|---|---|---|");
                for (i, j, b) in &rows {
                    println!(
                        "| {} | {} | {:.3} | {:.3} | {:.3} |",
                        left.records[*i].display_name(),
                        right.records[*j].display_name(),
                        b.primary,
                        b.secondary,
                        b.composite
                    );
                }
            }
        }

        Commands::Diff { left, right } => {
            let (left, right) = load_pair(&left, &right, &schema)?;
            let (a, b) = match (left.first(), right.first()) {
                (Some(a), Some(b)) => (a, b),
                _ => bail!("both inputs must contain a usable record"),
            };
            let diff = diff_all(a, b);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "rows": diff.rows, "differing": diff.differing_count() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{}", diff.to_markdown(&left.input, &right.input));
                println!("\n{} differing field(s)", diff.differing_count());
            }
        }

        Commands::Merge {
            files,
            primary,
            pick,
            clear,
            set,
        } => {
            let primary = to_index(primary, files.len())?;
            let collections = load_concurrently(files, schema).await?;
            let sources: Vec<CanonicalRecord> = collections
                .iter()
                .filter_map(|c| c.first().cloned())
                .collect();

            let mut aggregate = AggregateRecord::new(sources, primary)?;
            for spec in &pick {
                let (field, n) = split_assignment(spec)?;
                let source = n
                    .parse::<usize>()
                    .map_err(|_| anyhow!("--pick {spec}: '{n}' is not a source number"))?;
                aggregate.select(field, to_index(source, collections.len())?)?;
            }
            for name in &clear {
                aggregate.clear(name.parse::<Field>()?);
            }
            for spec in &set {
                let (field, value) = split_assignment(spec)?;
                aggregate.edit(field, value);
            }

            let divergence = aggregate.divergence(primary)?;
            let homepage =
                pick_official_homepage(aggregate.sources(), &config.homepage.aggregator_domains);
            let dur = start.elapsed().as_millis();

            if json_output {
                let origins: serde_json::Map<String, serde_json::Value> = Field::ALL
                    .iter()
                    .map(|&f| {
                        (
                            f.label().to_string(),
                            serde_json::to_value(aggregate.origin(f)).unwrap_or_default(),
                        )
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "record": aggregate.record(),
                        "origins": origins,
                        "divergence": divergence,
                        "official_homepage": homepage,
                    },
                    "meta": { "duration_ms": dur, "sources": collections.len() }
                }))?;
            } else {
                if divergence.is_empty() {
                    println!("All sources agree.\n");
                } else {
                    println!("Divergent fields (against source {}):", primary + 1);
                    for d in &divergence {
                        let differing: Vec<String> =
                            d.differing_sources.iter().map(|i| (i + 1).to_string()).collect();
                        println!("  {}: sources {}", d.field, differing.join(", "));
                    }
                    println!();
                }
                println!("{}", aggregate.record().to_markdown());
                match homepage {
                    Some(url) => println!("\nOfficial homepage: {url}"),
                    None => println!("\nOfficial homepage: (none found)"),
                }
            }
        }

        Commands::Extract {
            file,
            source_url,
            model,
            num_ctx,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let payload =
                ExtractionPayload::from_model_output(&source_url, &model, num_ctx, &text, &schema)
                    .with_context(|| format!("no record in {}", file.display()))?;

            if json_output {
                let dur = start.elapsed().as_millis();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": payload,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{}", payload.to_markdown());
            }
        }

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"duration_ms":dur}}))?;
                    } else {
                        print!("{}", toml::to_string_pretty(&config)?);
                    }
                }
                ConfigAction::Path => {
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "path": config_path, "exists": config_path.exists() },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        println!("{}", config_path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_skipped(collection: &LoadedCollection) {
    if !collection.skipped.is_empty() {
        eprintln!(
            "{}: skipped {} element(s)",
            collection.input,
            collection.skipped.len()
        );
    }
}

fn load_side(path: &Path, schema: &Schema, side: &str) -> Result<LoadedCollection> {
    load_path(path, schema).with_context(|| format!("failed to load {side} input {}", path.display()))
}

fn load_pair(left: &Path, right: &Path, schema: &Schema) -> Result<(LoadedCollection, LoadedCollection)> {
    let left = load_side(left, schema, "left")?;
    let right = load_side(right, schema, "right")?;
    print_skipped(&left);
    print_skipped(&right);
    Ok((left, right))
}

/// One blocking task per source file; results keep argument order.
async fn load_concurrently(files: Vec<PathBuf>, schema: Schema) -> Result<Vec<LoadedCollection>> {
    let schema = Arc::new(schema);
    let tasks = files.into_iter().enumerate().map(|(i, path)| {
        let schema = Arc::clone(&schema);
        tokio::task::spawn_blocking(move || {
            debug!(source = i + 1, path = %path.display(), "loading source");
            load_side(&path, &schema, &format!("source {}", i + 1))
        })
    });

    let mut collections = Vec::new();
    for joined in futures::future::join_all(tasks).await {
        let collection = joined.context("source loader task panicked")??;
        print_skipped(&collection);
        collections.push(collection);
    }
    Ok(collections)
}

/// 1-based source number → index.
fn to_index(number: usize, count: usize) -> Result<usize> {
    if number == 0 || number > count {
        bail!("source number {number} out of range (1..={count})");
    }
    Ok(number - 1)
}

fn split_assignment(spec: &str) -> Result<(Field, &str)> {
    let (field, value) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{spec}'"))?;
    Ok((field.parse::<Field>()?, value))
}
