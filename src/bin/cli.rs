use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use eligian::dsl::{self, documents::LibraryDocuments};
use eligian::error::CompileError;
use eligian::model::EngineConfig;
use eligian::registry::{reference, validation};
use eligian::settings::{self, AssetBundle, CompilerSettings};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "eligian-cli", about = "Compile Eligian programs into Eligius configurations", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program syntax tree (JSON) into an engine configuration
    Compile {
        /// Program syntax tree
        program: PathBuf,
        /// Library document as `<import path>=<file.json>`; repeatable
        #[arg(long = "library", value_parser = parse_library_arg)]
        libraries: Vec<(String, PathBuf)>,
        /// Pre-loaded assets (layout, css files, locale)
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Compiler settings file
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Write the configuration here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write the source map
        #[arg(long)]
        source_map: Option<PathBuf>,
        /// Report errors as JSON on stderr
        #[arg(long)]
        json_errors: bool,
    },
    /// Print the operation reference, or the detail of one operation
    Operations {
        name: Option<String>,
    },
    /// Self-check the operation registry
    CheckRegistry,
    /// Print the JSON schema of the engine configuration
    Schema,
}

fn parse_library_arg(raw: &str) -> Result<(String, PathBuf), String> {
    let (import_path, file) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <import path>=<file>, got '{raw}'"))?;
    if import_path.is_empty() || file.is_empty() {
        return Err(format!("expected <import path>=<file>, got '{raw}'"));
    }
    Ok((import_path.to_string(), PathBuf::from(file)))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,eligian=info",
        1 => "info,eligian=debug",
        _ => "debug,eligian=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ── Compile ─────────────────────────────────────────────────────

struct CompileArgs<'a> {
    program: &'a Path,
    libraries: &'a [(String, PathBuf)],
    assets: Option<&'a Path>,
    settings: Option<&'a Path>,
    out: Option<&'a Path>,
    source_map: Option<&'a Path>,
}

fn run_compile(args: &CompileArgs<'_>) -> Result<(), CompileError> {
    let program = dsl::load_program(args.program)?;

    let mut documents = LibraryDocuments::new();
    for (import_path, file) in args.libraries {
        let library = dsl::load_library(file)?;
        tracing::debug!(import = %import_path, file = %file.display(), "loaded library");
        documents.insert(import_path, library);
    }

    let assets: AssetBundle = match args.assets {
        Some(path) => settings::read_json(path)?,
        None => AssetBundle::default(),
    };
    let settings = match args.settings {
        Some(path) => settings::load_settings(path)?,
        None => CompilerSettings::default(),
    };

    let ir = dsl::compile(&program, &documents, &assets, &settings)?;
    let config = serde_json::to_string_pretty(&ir.config).unwrap_or_default();
    match args.out {
        Some(path) => write_file(path, &config)?,
        None => println!("{config}"),
    }
    if let Some(path) = args.source_map {
        write_file(path, &serde_json::to_string_pretty(&ir.source_map).unwrap_or_default())?;
    }
    tracing::info!(
        operations = ir.metadata.operation_count,
        timelines = ir.metadata.timeline_count,
        "compiled {}",
        args.program.display()
    );
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), CompileError> {
    std::fs::write(path, contents).map_err(|e| CompileError::Document {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn report_error(err: &CompileError, json_errors: bool) {
    if json_errors {
        let body = match err {
            CompileError::Transform(e) => json!({ "error": e }),
            CompileError::Type(errors) => json!({ "error": { "code": "TypeError", "detail": errors } }),
            other => json!({ "error": { "code": "CompileError", "detail": { "message": other.to_string() } } }),
        };
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
        return;
    }
    match err {
        CompileError::Transform(e) => eprintln!("Error: {}", e.format_with_location()),
        CompileError::Type(errors) => {
            eprintln!("Error: configuration failed structural checks");
            for e in errors {
                eprintln!("  {e}");
            }
        }
        other => eprintln!("Error: {other}"),
    }
}

// ── Entry point ─────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Compile {
            program,
            libraries,
            assets,
            settings,
            out,
            source_map,
            json_errors,
        } => {
            let args = CompileArgs {
                program,
                libraries,
                assets: assets.as_deref(),
                settings: settings.as_deref(),
                out: out.as_deref(),
                source_map: source_map.as_deref(),
            };
            if let Err(e) = run_compile(&args) {
                report_error(&e, *json_errors);
                process::exit(1);
            }
        }
        Commands::Operations { name } => match name {
            Some(name) => match reference::describe_operation(name) {
                Some(text) => println!("{text}"),
                None => {
                    let suggestions = validation::suggest_operations(name);
                    eprintln!("Error: unknown operation '{name}'");
                    if !suggestions.is_empty() {
                        eprintln!("Did you mean: {}?", suggestions.join(", "));
                    }
                    process::exit(1);
                }
            },
            None => println!("{}", reference::operation_reference()),
        },
        Commands::CheckRegistry => {
            let problems = validation::validate_registry();
            if problems.is_empty() {
                println!("Registry OK");
            } else {
                for problem in &problems {
                    eprintln!("  {problem}");
                }
                eprintln!("{} problem(s) found", problems.len());
                process::exit(1);
            }
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(EngineConfig);
            println!("{}", serde_json::to_string_pretty(&schema).unwrap_or_default());
        }
    }
}
