//! Stats Builder CLI
//!
//! 원본 행 → 버전별 통계 데이터셋 빌더
//! 데이터셋 검증 / 목록

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "stats_builder")]
#[command(about = "Build versioned team-stadium statistics datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Build a dataset version from raw rows
    Build {
        /// Input rows (csv, json, jsonl or sqlite database)
        #[arg(long)]
        r#in: PathBuf,

        /// Directory with skills.json, support-cards-db.json, character.json
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Game master database for character colours
        #[arg(long)]
        game_db: Option<PathBuf>,

        /// Dataset root holding datasets.json
        #[arg(long)]
        out: PathBuf,

        /// Version key (defaults to today's date)
        #[arg(long)]
        version: Option<String>,

        /// YAML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Verify the dataset after building
        #[arg(long, default_value = "false")]
        verify: bool,

        /// Output build summary JSON file
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Verify a dataset version against its manifest
    Verify {
        /// Dataset root holding datasets.json
        #[arg(long)]
        out: PathBuf,

        /// Version key
        #[arg(long)]
        version: String,
    },

    /// List published dataset versions
    List {
        /// Dataset root holding datasets.json
        #[arg(long)]
        out: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            r#in,
            data_dir,
            game_db,
            out,
            version,
            config,
            verify,
            summary,
        } => {
            println!("🔨 Building statistics dataset...");
            println!("   Input:  {}", r#in.display());
            println!("   Data:   {}", data_dir.display());
            println!("   Output: {}", out.display());

            let opts = stats_builder::BuildOptions {
                input: r#in,
                data_dir,
                game_db,
                output_root: out,
                version,
                config,
            };
            let built = stats_builder::build_statistics(&opts)?;

            print_summary(&built);

            if verify {
                verify_dataset(&opts.output_root, &built.version)?;
            }

            if let Some(summary_path) = summary {
                save_summary(&summary_path, &built)?;
            }
        }

        Commands::Verify { out, version } => {
            verify_dataset(&out, &version)?;
        }

        Commands::List { out } => {
            let datasets = stats_builder::list_datasets(&out)?;
            if datasets.is_empty() {
                println!("No datasets published under {}", out.display());
            }
            for ds in datasets {
                let total = ds.index.get("total_entries").and_then(|v| v.as_u64());
                println!(
                    "📄 {:<12} {:<28} {:>8} entries  {}",
                    ds.version,
                    ds.date,
                    total.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string()),
                    ds.base_path
                );
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(summary: &stats_builder::BuildSummary) {
    println!("\n✅ Dataset built successfully!");
    println!("   Version:     {}", summary.version);
    println!("   Generated:   {}", summary.generated_at);
    println!(
        "   Rows:        {} parsed, {} failed, {} rejected",
        summary.parse.parsed, summary.parse.failed, summary.normalize.rejected
    );
    println!("   Entries:     {}", summary.total_entries);
    println!("   Trainers:    {}", summary.total_trainers);
    println!("   Characters:  {}", summary.total_characters);
    println!(
        "   Units:       1 global, {} distance, {} character",
        summary.distance_units, summary.character_units
    );
    println!("   Files:       {}", summary.files_written);
    println!("   Base path:   {}", summary.base_path);
}

#[cfg(feature = "cli")]
fn verify_dataset(root: &std::path::Path, version: &str) -> Result<()> {
    println!("\n🔍 Verifying dataset {}...", version);
    let files = stats_builder::verify_dataset(root, version)?;
    println!("✅ Dataset verification passed ({} files)", files);
    Ok(())
}

#[cfg(feature = "cli")]
fn save_summary(path: &PathBuf, summary: &stats_builder::BuildSummary) -> Result<()> {
    let summary_json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_json)?;
    println!("\n📄 Summary saved to: {}", path.display());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("stats_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
