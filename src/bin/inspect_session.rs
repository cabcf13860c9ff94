use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use onboardbase::config::{config_file_path, durable_storage_dir, load_config_from};
use onboardbase::persistence::{FileTier, MemoryTier, PersistenceLayer, StorageKeys, WizardMode};
use onboardbase::validation::{ValidationEngine, STEPS};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse()?;
    let config = load_config_from(config_file_path()?)?;
    let storage_dir = match args.storage_dir {
        Some(dir) => dir,
        None => durable_storage_dir()?,
    };
    let durable = FileTier::new(&storage_dir);
    let keys = StorageKeys::with_prefix(&config.storage_key_prefix);
    let persistence = PersistenceLayer::new(
        Arc::new(durable.clone()),
        Arc::new(MemoryTier::new()),
        keys.clone(),
        WizardMode::Create,
    );

    println!("Storage: {}", storage_dir.display());
    let (selection, _) = persistence.read_selection();
    match selection {
        Some(selection) => println!(
            "Selected type: {} ({})",
            selection.onboarding_type,
            if selection.confirmed { "confirmed" } else { "unconfirmed" }
        ),
        None => println!("Selected type: none"),
    }

    let Some(snapshot) = persistence.load() else {
        println!("No saved session.");
        return Ok(());
    };
    if let Some(saved_at) = durable.modified(&keys.form_data)? {
        println!("Last saved: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    if args.json {
        let raw = serde_json::to_string_pretty(&snapshot).context("Failed serializing snapshot")?;
        println!("{raw}");
        return Ok(());
    }

    let engine = ValidationEngine::new(config.age);
    println!("Current step: {}", snapshot.current_step);
    for step in STEPS.iter() {
        let status = engine.status(step.index, &snapshot.form_data);
        let marker = if snapshot.completed_steps.contains(&step.index) {
            "x"
        } else {
            " "
        };
        let mut notes = Vec::new();
        if status.valid {
            notes.push("valid");
        }
        if status.has_data {
            notes.push("has data");
        }
        println!(
            "  [{marker}] {:>2} {:<20} {}",
            step.index,
            step.name,
            notes.join(", ")
        );
    }
    println!("Fingerprint: {}", snapshot.fingerprint());
    Ok(())
}

struct CliArgs {
    storage_dir: Option<PathBuf>,
    json: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut storage_dir = None;
        let mut json = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--storage" => {
                    let value = args
                        .next()
                        .context("Expected a directory after --storage")?;
                    storage_dir = Some(PathBuf::from(value));
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => return Err(anyhow!("Unknown argument: {other}")),
            }
        }
        Ok(Self { storage_dir, json })
    }
}

fn print_usage() {
    println!("Usage: inspect_session [--storage <dir>] [--json]");
    println!("  --storage <dir>   Durable storage directory (defaults to <root>/storage/durable)");
    println!("  --json            Print the raw snapshot as JSON");
}
