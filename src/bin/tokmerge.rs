use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde_json::json;
use tokmerge::config::{DocumentConfig, OutputConfig, DEFAULT_SECTION};
use tokmerge::serialization::load_document;
use tokmerge::workflow::{compare_files, merge_files};

const DEFAULT_FIRST: &str = "tokenizer.json";
const DEFAULT_SECOND: &str = "merged_tokenizer.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "BPE tokenizer merge toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    /// Key of the object holding `vocab` and `merges`
    #[arg(long, global = true, value_name = "KEY", default_value = DEFAULT_SECTION)]
    section: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge a secondary tokenizer into a primary one
    Merge(MergeArgs),
    /// Compare the merge tables of two tokenizers
    Compare(CompareArgs),
    /// Inspect tokenizer metadata
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Tokenizer whose ids, merge format, and metadata are kept
    primary: PathBuf,

    /// Tokenizer contributing additional tokens and merges
    secondary: PathBuf,

    /// Output path for the merged tokenizer.json
    output: PathBuf,

    /// Emit pretty JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// First tokenizer JSON
    #[arg(default_value = DEFAULT_FIRST)]
    first: PathBuf,

    /// Second tokenizer JSON
    #[arg(default_value = DEFAULT_SECOND)]
    second: PathBuf,

    /// Emit machine-readable JSON summary
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Tokenizer JSON to inspect
    #[arg(value_name = "PATH", required_unless_present = "tokenizer")]
    path: Option<PathBuf>,

    /// Tokenizer JSON to inspect (alternative to the positional path)
    #[arg(short = 'm', long, value_name = "PATH", conflicts_with = "path")]
    tokenizer: Option<PathBuf>,

    /// Emit machine-readable JSON summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = DocumentConfig::builder()
        .section(cli.section.clone())
        .build()?;
    match cli.command {
        Commands::Merge(args) => run_merge(args, &config),
        Commands::Compare(args) => run_compare(args, &config),
        Commands::Info(args) => run_info(args, &config),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run_merge(args: MergeArgs, config: &DocumentConfig) -> Result<()> {
    let output_cfg = OutputConfig {
        pretty: args.pretty,
        ..OutputConfig::default()
    };
    let summary = merge_files(
        &args.primary,
        &args.secondary,
        &args.output,
        config,
        &output_cfg,
    )
    .with_context(|| {
        format!(
            "failed to merge {} into {}",
            args.secondary.display(),
            args.primary.display()
        )
    })?;

    println!(
        "wrote tokenizer with vocab {} (+{} tokens) and {} merges (+{}) to {}",
        summary.merged_vocab,
        summary.tokens_added,
        summary.merged_rules,
        summary.secondary_rules,
        args.output.display()
    );
    Ok(())
}

fn run_compare(args: CompareArgs, config: &DocumentConfig) -> Result<()> {
    let report = compare_files(&args.first, &args.second, config);
    if report.is_empty() {
        info!("both merge tables are empty");
        if args.json {
            let summary = json!({
                "first": args.first.display().to_string(),
                "second": args.second.display().to_string(),
                "comparable": false,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("nothing to compare: both merge tables are empty");
        }
        return Ok(());
    }

    let ratio = report.order.ratio();
    if args.json {
        let summary = json!({
            "first": args.first.display().to_string(),
            "second": args.second.display().to_string(),
            "comparable": true,
            "first_merges": report.first_len,
            "second_merges": report.second_len,
            "jaccard": report.jaccard,
            "order_matches": report.order.matches,
            "order_compared": report.order.compared,
            "order_ratio": ratio,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Merges       : {} vs {}", report.first_len, report.second_len);
        println!("Jaccard      : {:.4}", report.jaccard);
        println!(
            "Order match  : {}/{}",
            report.order.matches, report.order.compared
        );
        match ratio {
            Some(ratio) => println!("Order ratio  : {ratio:.4}"),
            None => println!("Order ratio  : n/a"),
        }
    }
    Ok(())
}

fn run_info(args: InfoArgs, config: &DocumentConfig) -> Result<()> {
    let path = args
        .path
        .or(args.tokenizer)
        .context("a tokenizer path is required")?;
    let document = load_document(&path, config)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let vocab_size = document.vocabulary().len();
    let merges = document.merges().len();
    let format = document.format();
    let max_id = document.vocabulary().max_id();
    let model_type = document
        .metadata(&config.section)
        .and_then(|section| section.get("type"))
        .and_then(|kind| kind.as_str())
        .unwrap_or("unknown")
        .to_string();

    if args.json {
        let summary = json!({
            "path": path.display().to_string(),
            "model_type": model_type,
            "vocab_size": vocab_size,
            "max_id": max_id,
            "merges": merges,
            "merge_format": format,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Model type   : {model_type}");
        println!("Vocab size   : {vocab_size}");
        match max_id {
            Some(id) => println!("Max id       : {id}"),
            None => println!("Max id       : (empty)"),
        }
        println!("Merges       : {merges}");
        println!("Merge format : {format}");
    }

    Ok(())
}
