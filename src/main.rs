use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod constants;
mod crawlers;
mod dispatcher;
mod entity_id;
mod error;
mod fetch;
mod logging;
mod post_filter;
mod processor;
mod types;

use crate::config::Config;
use crate::dispatcher::FetchDispatcher;
use crate::fetch::HttpFetcher;
use crate::post_filter::PostFilterChain;

#[derive(Parser)]
#[command(name = "tourqa_scraper")]
#[command(about = "Travel entity scraper and QA post filter")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and normalize the entities listed in a worklist file
    Fetch {
        /// Worklist JSON file; defaults to the configured path
        #[arg(long)]
        input: Option<String>,
        /// Directory for per-city output; defaults to the configured path
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Filter a community QA posts corpus down to admissible posts
    FilterPosts {
        /// Posts corpus JSON file
        #[arg(long)]
        input: String,
        /// Destination for the accepted posts
        #[arg(long)]
        output: String,
        /// Corpus-wide average question length; defaults to the configured value
        #[arg(long)]
        average_post_length: Option<f64>,
    },
}

async fn run_fetch(input: &str, output_dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    let refs = FetchDispatcher::load_work(Path::new(input))?;
    info!(entities = refs.len(), "worklist loaded");

    let pending = FetchDispatcher::filter_pending(refs, Path::new(output_dir));
    let dispatcher = FetchDispatcher::new(Arc::new(HttpFetcher::new()));
    let summary = dispatcher.dispatch(pending, Path::new(output_dir)).await;

    println!("\n📊 Fetch results:");
    println!("   Total entities: {}", summary.total);
    println!("   Completed: {}", summary.completed);
    println!("   Failed: {}", summary.failed);
    println!("   Output directory: {}", output_dir);
    if !summary.errors.is_empty() {
        println!("\n⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("   - {}", error);
        }
    }
    Ok(())
}

fn run_filter_posts(
    input: &str,
    output: &str,
    average_post_length: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = PostFilterChain::new(average_post_length);
    let summary = chain.run(Path::new(input), Path::new(output))?;

    println!("\n📊 Filter results:");
    println!("   Total posts: {}", summary.total);
    println!("   Accepted: {}", summary.accepted);
    println!("   Trip reports: {}", summary.trip_reports);
    println!("   Not appropriate: {}", summary.not_appropriate);
    println!("   Long posts: {}", summary.long_posts);
    println!("   Irrelevant: {}", summary.irrelevant);
    println!("   Output file: {}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { input, output_dir } => {
            println!("🔄 Running entity fetch...");

            let (input, output_dir) = match (input, output_dir) {
                (Some(input), Some(output_dir)) => (input, output_dir),
                (input, output_dir) => {
                    let config = Config::load()?;
                    (
                        input.unwrap_or(config.fetch.input),
                        output_dir.unwrap_or(config.fetch.output_dir),
                    )
                }
            };

            if let Err(e) = run_fetch(&input, &output_dir).await {
                error!("Fetch run failed: {}", e);
                println!("❌ Fetch run failed: {}", e);
                return Err(e);
            }
            println!("✅ Fetch run completed");
        }
        Commands::FilterPosts {
            input,
            output,
            average_post_length,
        } => {
            println!("🔎 Filtering posts corpus...");

            let average_post_length = match average_post_length {
                Some(value) => value,
                None => Config::load()?.posts.average_post_length,
            };

            if let Err(e) = run_filter_posts(&input, &output, average_post_length) {
                error!("Filter run failed: {}", e);
                println!("❌ Filter run failed: {}", e);
                return Err(e);
            }
            println!("✅ Filter run completed");
        }
    }
    Ok(())
}
