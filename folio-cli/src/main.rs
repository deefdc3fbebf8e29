use clap::{Parser, Subcommand, ValueEnum};
use folio::export;
use folio::watcher::{changed_paths, FileWatcher};
use folio::{BuildOptions, DocumentStore, FolioConfig};
use std::path::{Path, PathBuf};
use std::process;

/// folio: build typed document collections from a content directory
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = folio::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Build every collection and write the generated data
    Build {
        #[command(flatten)]
        build: BuildArgs,
        /// Output directory (default: the configured output_dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show collection stats, or list the documents of one type
    List {
        /// Document type name
        type_name: Option<String>,
    },

    /// Print a single document by flattened path
    Get {
        /// Document type name
        type_name: String,
        /// Flattened path, e.g. posts/hello-world
        flattened_path: String,
    },

    /// Check all documents against the schema without writing anything
    Check,

    /// Build, then rebuild affected collections whenever content changes
    Watch {
        #[command(flatten)]
        build: BuildArgs,
        /// Output directory (default: the configured output_dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate typed Rust structs for the configured document types
    Codegen {
        /// Output Rust file
        #[arg(long, default_value = "src/content.rs")]
        out: PathBuf,
    },
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Keep valid documents when some files fail, reporting the failures
    #[arg(long)]
    lenient: bool,
    /// Worker threads (default: the configured value, 0 = one per CPU)
    #[arg(long)]
    concurrency: Option<usize>,
}

impl BuildArgs {
    fn options(&self, config: &FolioConfig) -> BuildOptions {
        BuildOptions {
            concurrency: self.concurrency.unwrap_or(config.build.concurrency),
            lenient: self.lenient || config.build.lenient,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let load_config = || FolioConfig::load(&cli.config);

    match cli.command {
        Command::Build { build, out } => {
            let config = load_config()?;
            let store = config.build_store_with(&Default::default(), build.options(&config))?;
            let out = out.unwrap_or_else(|| config.output_root());
            let written = export::export(&store, &out)?;
            print_output(&build_summary(&store, &written), &cli.format)?;
        }

        Command::List { type_name } => {
            let store = load_config()?.build_store()?;
            match type_name {
                Some(type_name) => {
                    let docs: Vec<_> = store
                        .all(&type_name)?
                        .iter()
                        .map(|doc| {
                            serde_json::json!({
                                "_id": doc.id(),
                                "flattenedPath": doc.flattened_path(),
                                "url": doc.url(),
                            })
                        })
                        .collect();
                    print_output(&serde_json::Value::Array(docs), &cli.format)?;
                }
                None => print_output(&export::status(&store), &cli.format)?,
            }
        }

        Command::Get {
            type_name,
            flattened_path,
        } => {
            let store = load_config()?.build_store()?;
            let doc = store
                .find_by_path(&type_name, &flattened_path)?
                .ok_or_else(|| format!("Document not found: {type_name} {flattened_path}"))?;
            print_output(&doc.to_json(), &cli.format)?;
        }

        Command::Check => {
            let config = load_config()?;
            let options = BuildOptions {
                lenient: true,
                ..config.build.clone()
            };
            let store = config.build_store_with(&Default::default(), options)?;
            let warnings = store.warnings();
            let errors: Vec<_> = warnings
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "type": f.type_name,
                        "path": f.path,
                        "error": f.error.to_string(),
                    })
                })
                .collect();
            print_output(
                &serde_json::json!({
                    "documents": store.document_count(),
                    "errors": errors,
                }),
                &cli.format,
            )?;
            if !warnings.is_empty() {
                return Err(format!("{} file(s) failed validation", warnings.len()).into());
            }
        }

        Command::Watch { build, out } => {
            let config = load_config()?;
            let out = out.unwrap_or_else(|| config.output_root());
            watch(&config, build.options(&config), &out, &cli.format)?;
        }

        Command::Codegen { out } => {
            folio_codegen::generate_from_config(path_str(&cli.config)?, path_str(&out)?)?;
            print_output(
                &serde_json::json!({ "ok": true, "written": out.display().to_string() }),
                &cli.format,
            )?;
        }
    }

    Ok(())
}

/// Rebuild and re-export on every batch of content changes until the
/// watcher stops. A failing rebuild keeps serving the previous store.
fn watch(
    config: &FolioConfig,
    options: BuildOptions,
    out: &Path,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = config.build_store_with(&Default::default(), options)?;
    let written = export::export(&store, out)?;
    print_output(&build_summary(&store, &written), format)?;

    let watcher = FileWatcher::start(store.content_root())?;
    while let Some(batch) = watcher.next_batch() {
        let paths = changed_paths(&batch);
        match store.rebuild_for_paths(&paths) {
            Ok(Some(rebuilt)) => {
                store = rebuilt;
                let written = export::export(&store, out)?;
                print_output(&build_summary(&store, &written), format)?;
            }
            Ok(None) => log::debug!("No document type affected by {}", paths.join(", ")),
            Err(e) => log::error!("Rebuild failed: {e}"),
        }
    }
    Ok(())
}

fn build_summary(store: &DocumentStore, written: &[PathBuf]) -> serde_json::Value {
    let warnings: Vec<_> = store.warnings().iter().map(|f| f.to_string()).collect();
    serde_json::json!({
        "ok": true,
        "documents": store.document_count(),
        "collections": store.collection_names(),
        "written": written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "warnings": warnings,
    })
}

fn path_str(path: &Path) -> Result<&str, String> {
    path.to_str()
        .ok_or_else(|| format!("Path is not valid UTF-8: {}", path.display()))
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
