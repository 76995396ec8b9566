use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use console::{Term, style};
use otakit_core::{
    FileManifestStore, FilterSet, ManifestStore, MetadataValue, PolicyConfig, SingleUpdate,
    UpdateManifest, UpdatesConfig, UpdatesCoordinator, compute_hash, short_hash,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// otakit - update selection and launch planning
#[derive(Parser)]
#[command(name = "ota")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a launch plan from the configured store
    Resolve {
        /// Path to the host configuration file
        #[arg(short, long, default_value = "otakit.json")]
        config: PathBuf,

        /// Selection filter as key=value; repeatable
        #[arg(short, long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Pin selection to a single update id
        #[arg(long, value_name = "UUID")]
        update_id: Option<Uuid>,

        /// Print the launch plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List manifests in the store, newest first
    List {
        #[arg(short, long, default_value = "otakit.json")]
        config: PathBuf,
    },

    /// Check asset presence and content hashes for every manifest
    Verify {
        #[arg(short, long, default_value = "otakit.json")]
        config: PathBuf,
    },

    /// Persist a manifest JSON file into the store
    Import {
        #[arg(short, long, default_value = "otakit.json")]
        config: PathBuf,

        /// Path to the manifest JSON file
        manifest: PathBuf,
    },

    /// Show store and configuration status
    Status {
        #[arg(short, long, default_value = "otakit.json")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            config,
            filters,
            update_id,
            json,
        } => cmd_resolve(&config, &filters, update_id, json),
        Commands::List { config } => cmd_list(&config),
        Commands::Verify { config } => cmd_verify(&config),
        Commands::Import { config, manifest } => cmd_import(&config, &manifest),
        Commands::Status { config } => cmd_status(&config),
    }
}

fn load_config(term: &Term, path: &Path) -> Result<UpdatesConfig> {
    match UpdatesConfig::from_file(path) {
        Ok(config) => {
            debug!(
                "loaded config from {}, store at {}",
                path.display(),
                config.store_dir.display()
            );
            Ok(config)
        }
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))?;
            std::process::exit(1);
        }
    }
}

fn parse_filters(raw: &[String]) -> Result<FilterSet> {
    let mut filters = FilterSet::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("invalid filter '{}', expected key=value", entry);
        };
        let value = match value {
            "true" => MetadataValue::Bool(true),
            "false" => MetadataValue::Bool(false),
            other => MetadataValue::String(other.to_string()),
        };
        filters.insert(key.to_string(), value);
    }
    Ok(filters)
}

fn cmd_resolve(
    config_path: &Path,
    raw_filters: &[String],
    update_id: Option<Uuid>,
    json: bool,
) -> Result<()> {
    let term = Term::stderr();
    let config = load_config(&term, config_path)?;
    let filters = parse_filters(raw_filters)?;

    debug!(
        "resolving launch plan with {} filter(s), pinned update: {:?}",
        filters.len(),
        update_id
    );

    let coordinator = match update_id {
        Some(id) => UpdatesCoordinator::new(
            Box::new(FileManifestStore::new(config.store_dir.clone())),
            Box::new(SingleUpdate::new(id)),
            config.embedded_bundle.clone(),
        ),
        None => config.build_coordinator(),
    };

    let plan = match coordinator.resolve_launch_plan(&filters) {
        Ok(plan) => plan,
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))?;
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    match &plan.launched_manifest {
        Some(manifest) => {
            term.write_line(&format!(
                "{} Launching update {} (runtime {}, committed {})",
                style("::").cyan().bold(),
                manifest.id,
                manifest.runtime_version,
                manifest.commit_time
            ))?;
        }
        None => {
            term.write_line(&format!(
                "{} No downloaded update qualifies, using embedded bundle",
                style("::").cyan().bold()
            ))?;
        }
    }
    term.write_line(&format!("  assets: {} file(s)", plan.asset_files.len()))?;

    // The bundle path goes to stdout so it can be piped into the host.
    println!("{}", plan.launch_asset_url.display());

    Ok(())
}

fn cmd_list(config_path: &Path) -> Result<()> {
    let term = Term::stderr();
    let config = load_config(&term, config_path)?;
    let store = FileManifestStore::new(config.store_dir);

    let mut manifests = store.all_manifests()?;
    manifests.sort_by(|a, b| b.commit_time.cmp(&a.commit_time).then(a.id.cmp(&b.id)));

    if manifests.is_empty() {
        term.write_line(&format!("{} Store is empty", style("::").cyan().bold()))?;
        return Ok(());
    }

    for manifest in &manifests {
        let total = manifest.all_assets().count();
        let missing = manifest.all_assets().filter(|a| a.is_missing()).count();
        let assets = if missing == 0 {
            style(format!("{} asset(s)", total)).green()
        } else {
            style(format!("{} asset(s), {} missing", total, missing)).yellow()
        };
        println!(
            "{}  {}  runtime {}  {}",
            manifest.id, manifest.commit_time, manifest.runtime_version, assets
        );
    }

    Ok(())
}

fn cmd_verify(config_path: &Path) -> Result<()> {
    let term = Term::stderr();
    let config = load_config(&term, config_path)?;
    let store = FileManifestStore::new(config.store_dir);

    let manifests = store.all_manifests()?;
    debug!("verifying {} manifest(s)", manifests.len());
    let mut problems = 0usize;

    for manifest in &manifests {
        for asset in manifest.all_assets() {
            let Some(path) = &asset.local_path else {
                term.write_line(&format!(
                    "{} {}: asset '{}' not downloaded",
                    style("missing:").yellow().bold(),
                    manifest.id,
                    asset.key
                ))?;
                problems += 1;
                continue;
            };

            if !path.exists() {
                term.write_line(&format!(
                    "{} {}: asset '{}' vanished from {}",
                    style("missing:").yellow().bold(),
                    manifest.id,
                    asset.key,
                    path.display()
                ))?;
                problems += 1;
                continue;
            }

            let actual = compute_hash(path)?;
            if actual != asset.content_hash {
                term.write_line(&format!(
                    "{} {}: asset '{}' hash {} does not match recorded {}",
                    style("corrupt:").red().bold(),
                    manifest.id,
                    asset.key,
                    short_hash(&actual),
                    short_hash(&asset.content_hash)
                ))?;
                problems += 1;
            }
        }
    }

    if problems > 0 {
        term.write_line(&format!(
            "{} {} problem(s) across {} manifest(s)",
            style("error:").red().bold(),
            problems,
            manifests.len()
        ))?;
        std::process::exit(1);
    }

    term.write_line(&format!(
        "{} {} manifest(s) verified",
        style("::").green().bold(),
        manifests.len()
    ))?;

    Ok(())
}

fn cmd_import(config_path: &Path, manifest_path: &Path) -> Result<()> {
    let term = Term::stderr();
    let config = load_config(&term, config_path)?;
    let store = FileManifestStore::new(config.store_dir);

    let content = std::fs::read_to_string(manifest_path)?;
    let manifest: UpdateManifest = serde_json::from_str(&content)?;
    store.save_manifest(&manifest)?;

    term.write_line(&format!(
        "{} Imported update {} (runtime {})",
        style("::").green().bold(),
        manifest.id,
        manifest.runtime_version
    ))?;

    Ok(())
}

fn cmd_status(config_path: &Path) -> Result<()> {
    let term = Term::stderr();
    let config = load_config(&term, config_path)?;
    let store = FileManifestStore::new(config.store_dir.clone());

    let manifest_count = match store.load_index() {
        Ok(index) => index.len().to_string(),
        Err(e) => format!("unreadable ({})", e),
    };
    let policy = match &config.policy {
        PolicyConfig::NewestFilterAware => "newest-filter-aware".to_string(),
        PolicyConfig::Newest => "newest (filter-blind)".to_string(),
        PolicyConfig::SingleUpdate { id } => format!("single-update {}", id),
    };
    let embedded = if config.embedded_bundle.is_some() {
        "configured"
    } else {
        "none"
    };

    term.write_line(&format!(
        "{} otakit v{}",
        style("::").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    ))?;
    term.write_line("")?;
    term.write_line(&format!("  Store:     {}", config.store_dir.display()))?;
    term.write_line(&format!("  Manifests: {}", manifest_count))?;
    term.write_line(&format!("  Runtimes:  {}", config.runtime_versions.join(", ")))?;
    term.write_line(&format!("  Policy:    {}", policy))?;
    term.write_line(&format!("  Embedded:  {}", embedded))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_filters_splits_key_value() {
        let filters = parse_filters(&["channel=beta".to_string()]).unwrap();
        assert_eq!(
            filters.get("channel"),
            Some(&MetadataValue::String("beta".to_string()))
        );
    }

    #[test]
    fn parse_filters_recognizes_booleans() {
        let filters = parse_filters(&["rollout=true".to_string()]).unwrap();
        assert_eq!(filters.get("rollout"), Some(&MetadataValue::Bool(true)));
    }

    #[test]
    fn parse_filters_rejects_missing_separator() {
        assert!(parse_filters(&["channel".to_string()]).is_err());
    }
}
