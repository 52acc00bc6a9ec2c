//! thinmodel demo
//!
//! Defines a `Person` kind, exercises typed fields, methods and a
//! self-referential `parent`, then stores the family through an adapter.
//!
//! Usage:
//!   thinmodel-demo [--adapter memory] [--verbose]

use anyhow::Result;
use clap::Parser;
use thinmodel_demo::{define_person, run_example, run_storage};
use thinmodel_model::{AdapterRegistry, Models};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "thinmodel-demo")]
#[command(about = "Walk through thinmodel kinds, entities and storage")]
struct Args {
    /// Registry name of the adapter to bind `Person` to
    #[arg(short, long, default_value = "memory")]
    adapter: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .compact()
        .init();

    let models = Models::new(AdapterRegistry::new());
    thinmodel_storage::install_default(&models);
    let person = define_person(&models);
    if person.use_adapter(args.adapter.as_str()).is_err() {
        warn!(
            "Adapter {:?} unavailable, Person falls back to {}",
            args.adapter,
            models.root().name()
        );
    }

    println!("\n========================================");
    println!("  In-memory entities");
    println!("========================================");
    for line in run_example(&person) {
        println!("  {line}");
    }

    println!("\n========================================");
    println!("  Storage");
    println!("========================================");
    for line in run_storage(&person).await? {
        println!("  {line}");
    }
    println!();

    info!("Done");
    Ok(())
}
