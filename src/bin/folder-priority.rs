//! folder-priority CLI - classify record batches offline
//!
//! Reads the same environment configuration as the API; flags override it.

use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process;

use folder_priority::{
    OutputContract, PriorityConfig, PriorityProcessor, Priority, StrategyKind,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folder-priority")]
#[command(version, about = "Assign folder-rule priorities to search indexing records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a batch read from a file or stdin
    Classify {
        /// Batch JSON file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Pretty-print the output batch
        #[arg(short, long)]
        pretty: bool,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the parsed rules in match order
    Rules {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Resolve the priority of a single path
    Resolve {
        /// Storage path or blob URI
        path: String,

        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args)]
struct Overrides {
    /// Rule string, e.g. "Guides:1;Manuals:5"
    #[arg(short, long)]
    rules: Option<String>,

    /// Default priority
    #[arg(short, long)]
    default_priority: Option<Priority>,

    /// Resolution strategy (substring, segment, auto)
    #[arg(short, long)]
    strategy: Option<StrategyKind>,

    /// Anchor folder for segment decoding
    #[arg(long)]
    anchor: Option<String>,

    /// Output contract (merge, replace)
    #[arg(short, long)]
    output_contract: Option<OutputContract>,
}

impl Overrides {
    fn apply(self, mut config: PriorityConfig) -> PriorityConfig {
        if let Some(rules) = self.rules {
            config = config.with_rules(rules);
        }
        if let Some(default_priority) = self.default_priority {
            config = config.with_default_priority(default_priority);
        }
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if let Some(anchor) = self.anchor {
            config.anchor = anchor;
        }
        if let Some(output) = self.output_contract {
            config = config.with_output(output);
        }
        config
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify { input, pretty, overrides } => {
            classify(&input, pretty, overrides.apply(PriorityConfig::from_env()))
        }
        Commands::Rules { overrides } => {
            print_rules(&overrides.apply(PriorityConfig::from_env()));
            Ok(())
        }
        Commands::Resolve { path, overrides } => {
            let config = overrides.apply(PriorityConfig::from_env());
            let processor = PriorityProcessor::from_config(&config);
            println!("{}", processor.resolve_path(Some(&path)));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn classify(input: &PathBuf, pretty: bool, config: PriorityConfig) -> Result<(), String> {
    let body = read_input(input)?;

    let processor = PriorityProcessor::from_config(&config);
    let batch = processor.process_body(&body).map_err(|e| e.to_string())?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&batch)
    } else {
        serde_json::to_string(&batch)
    }
    .map_err(|e| format!("Failed to serialize batch: {}", e))?;

    println!("{}", rendered);
    Ok(())
}

fn read_input(input: &PathBuf) -> Result<Vec<u8>, String> {
    if input.as_os_str() == "-" {
        let mut body = Vec::new();
        std::io::stdin()
            .read_to_end(&mut body)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        Ok(body)
    } else {
        std::fs::read(input).map_err(|e| format!("Failed to read {}: {}", input.display(), e))
    }
}

fn print_rules(config: &PriorityConfig) {
    let rules = config.rule_set();

    println!("strategy: {}", config.strategy);
    println!("default priority: {}", rules.default_priority());
    if rules.is_empty() {
        println!("no rules configured");
        return;
    }

    println!("rules (match order):");
    for (key, priority) in rules.by_specificity() {
        println!("  {:<30} {}", key, priority);
    }
}
