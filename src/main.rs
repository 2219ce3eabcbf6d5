mod category;
mod config;
mod output;
mod parser;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use config::{AnchorStyle, ParseConfig, RankPolicy};
use output::RankingDocument;
use parser::ParseReport;

#[derive(Parser)]
#[command(name = "shoprank", about = "Ranked-listing extractor for pasted shopping search results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    /// Detect from the text layout
    Auto,
    /// Bare rank number precedes each product name
    RankFirst,
    /// Product name first, rank trails the block
    NameFirst,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Number records in the order they appear
    Discovery,
    /// Trust rank tokens read from the text
    Literal,
    /// Sort by paid price, cheapest first
    Price,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one pasted listing dump into ranked JSON
    Parse {
        /// Input text file, or "-" for stdin
        input: String,
        /// Category key, or "auto" to detect from the text
        #[arg(short, long, default_value = "auto")]
        category: String,
        #[arg(long, value_enum, default_value = "auto")]
        style: StyleArg,
        #[arg(long, value_enum, default_value = "discovery")]
        policy: PolicyArg,
        /// Max lines scanned after an anchor for one listing
        #[arg(long, default_value_t = 20)]
        window: usize,
        /// Output path (default: shoprank_<category>_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Document title (default: "<category name> 순위")
        #[arg(long)]
        title: Option<String>,
        /// Compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
        /// Pin a verified rank as NAME=RANK (repeatable)
        #[arg(long = "set-rank", value_name = "NAME=RANK")]
        set_rank: Vec<String>,
    },
    /// Parse every *.txt file in a directory
    Batch {
        /// Directory holding the pasted dumps
        dir: PathBuf,
        /// Where the JSON files land
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
        /// Category key, or "auto" to detect per file
        #[arg(short, long, default_value = "auto")]
        category: String,
        #[arg(long, value_enum, default_value = "auto")]
        style: StyleArg,
        #[arg(long, value_enum, default_value = "discovery")]
        policy: PolicyArg,
        #[arg(long, default_value_t = 20)]
        window: usize,
    },
    /// List the built-in categories and their keywords
    Categories,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            category,
            style,
            policy,
            window,
            output,
            title,
            compact,
            set_rank,
        } => {
            let cfg = build_config(&category, style, policy, window, &set_rank)?;
            let text = read_input(&input)?;
            let report = parser::parse(&text, &cfg);
            if report.records.is_empty() {
                println!("No listings found ({} anchors, all dropped).", report.anchor_count);
                print_dropped(&report);
                return Ok(());
            }

            print_preview(&report);
            print_dropped(&report);

            let title = title.unwrap_or_else(|| format!("{} 순위", report.category_name()));
            let category_key = report.category_key().to_string();
            let doc = RankingDocument::new(&title, &category_key, report.records);
            let path = output.unwrap_or_else(|| default_output_path(&doc.meta.category));
            write_document(&doc, &path, compact)?;
            println!("\nSaved {} listings to {}", doc.meta.total_products, path.display());
            Ok(())
        }
        Commands::Batch {
            dir,
            out_dir,
            category,
            style,
            policy,
            window,
        } => {
            let cfg = build_config(&category, style, policy, window, &[])?;
            let inputs = collect_txt_files(&dir)?;
            if inputs.is_empty() {
                println!("No .txt files under {}", dir.display());
                return Ok(());
            }
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;

            println!("Parsing {} files...", inputs.len());
            let stats = batch_parse(&inputs, &out_dir, &cfg)?;
            println!(
                "Done: {} files ({} listings total, {} anchors dropped, {} files empty).",
                stats.files, stats.listings, stats.dropped, stats.empty
            );
            Ok(())
        }
        Commands::Categories => {
            println!("{:<20} | {:<14} | keywords", "key", "name");
            println!("{}", "-".repeat(72));
            for cat in category::builtin() {
                println!(
                    "{:<20} | {:<14} | {}",
                    cat.key,
                    cat.display_name,
                    cat.keywords.join(", ")
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn build_config(
    category: &str,
    style: StyleArg,
    policy: PolicyArg,
    window: usize,
    set_rank: &[String],
) -> anyhow::Result<ParseConfig> {
    let category = match category {
        "auto" => None,
        key => Some(category::resolve(key)?),
    };
    let style = match style {
        StyleArg::Auto => None,
        StyleArg::RankFirst => Some(AnchorStyle::RankFirst),
        StyleArg::NameFirst => Some(AnchorStyle::NameFirst),
    };
    let policy = match policy {
        PolicyArg::Discovery => RankPolicy::Discovery,
        PolicyArg::Literal => RankPolicy::Literal,
        PolicyArg::Price => RankPolicy::Price,
    };
    let overrides = set_rank
        .iter()
        .map(|raw| config::parse_override(raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParseConfig {
        category,
        style,
        window,
        policy,
        overrides,
        ..ParseConfig::default()
    })
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {}", input))
    }
}

fn collect_txt_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

struct BatchStats {
    files: usize,
    listings: usize,
    dropped: usize,
    empty: usize,
}

fn batch_parse(inputs: &[PathBuf], out_dir: &Path, cfg: &ParseConfig) -> anyhow::Result<BatchStats> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let reports: Vec<(PathBuf, anyhow::Result<ParseReport>)> = inputs
        .par_iter()
        .map(|path| {
            let report = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))
                .map(|text| parser::parse(&text, cfg));
            pb.inc(1);
            (path.clone(), report)
        })
        .collect();
    pb.finish_and_clear();

    let mut stats = BatchStats {
        files: 0,
        listings: 0,
        dropped: 0,
        empty: 0,
    };

    for (path, report) in reports {
        let report = report?;
        stats.files += 1;
        stats.dropped += report.dropped.len();
        if report.records.is_empty() {
            stats.empty += 1;
            println!("  {}: no listings found", path.display());
            continue;
        }

        stats.listings += report.records.len();
        let title = format!("{} 순위", report.category_name());
        let category_key = report.category_key().to_string();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ranking".to_string());
        let out = out_dir.join(format!("{}.json", stem));
        let doc = RankingDocument::new(&title, &category_key, report.records);
        write_document(&doc, &out, false)?;
    }

    Ok(stats)
}

fn print_preview(report: &ParseReport) {
    println!(
        "{:>3} | {:<36} | {:>9} | {:>5} | {:>4} | {:>7}",
        "#", "Product", "Price", "Disc", "Rate", "Reviews"
    );
    println!("{}", "-".repeat(80));
    for r in &report.records {
        println!(
            "{:>3} | {:<36} | {:>8}원 | {:>5} | {:>4} | {:>7}",
            r.rank,
            truncate(&r.name, 36),
            r.price,
            r.discount.as_deref().unwrap_or("-"),
            r.rating,
            r.reviews,
        );
    }
    println!(
        "\n{} listings | category: {} ({})",
        report.records.len(),
        report.category_name(),
        report.category_key()
    );
}

fn print_dropped(report: &ParseReport) {
    if report.dropped.is_empty() {
        return;
    }
    println!("\nDropped {} of {} anchors:", report.dropped.len(), report.anchor_count);
    for d in &report.dropped {
        let name = d.name.as_deref().unwrap_or("<no name>");
        println!("  line {:>4} | {} | {}", d.line + 1, d.reason, truncate(name, 40));
    }
}

fn write_document(doc: &RankingDocument, path: &Path, compact: bool) -> anyhow::Result<()> {
    let json = if compact {
        serde_json::to_string(doc)?
    } else {
        serde_json::to_string_pretty(doc)?
    };
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn default_output_path(category: &str) -> PathBuf {
    PathBuf::from(format!(
        "shoprank_{}_{}.json",
        category,
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
