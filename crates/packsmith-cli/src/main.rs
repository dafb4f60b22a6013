mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_STORE_ERROR};
use packsmith_core::Engine;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "packsmith",
    version,
    about = "Lifecycle controller for packs deployed through nomad-pack"
)]
struct Cli {
    /// Path to the packsmith store directory.
    #[arg(long, default_value = "~/.local/share/packsmith", global = true)]
    store: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a new deployment manifest.
    Init {
        /// Deployment name (also the job name the pack is deployed as).
        #[arg(long)]
        name: String,
        /// Pack to deploy from the registry.
        #[arg(long)]
        pack: String,
        /// Registry name to register the source under.
        #[arg(long)]
        registry: String,
        /// Registry source URI.
        #[arg(long)]
        source: String,
        /// Registry ref (tag, branch, or commit).
        #[arg(long = "ref")]
        git_ref: Option<String>,
        /// Only register this pack from the registry.
        #[arg(long)]
        target: Option<String>,
        /// Manifest path to write.
        #[arg(long, default_value = "packsmith.toml")]
        output: PathBuf,
        /// Overwrite an existing manifest.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Deploy (or redeploy) the pack described by a manifest.
    Deploy {
        /// Path to manifest TOML file.
        #[arg(default_value = "packsmith.toml")]
        manifest: PathBuf,
    },
    /// Report the health of a deployment.
    Status {
        /// Path to manifest TOML file.
        #[arg(default_value = "packsmith.toml")]
        manifest: PathBuf,
    },
    /// Destroy a deployment. Succeeds without action if nothing is deployed.
    Destroy {
        /// Path to manifest TOML file.
        #[arg(default_value = "packsmith.toml")]
        manifest: PathBuf,
    },
    /// Print the generation (job name) of the deployed pack.
    Generation {
        /// Path to manifest TOML file.
        #[arg(default_value = "packsmith.toml")]
        manifest: PathBuf,
    },
    /// List recorded deployments.
    List,
    /// Show the record of one deployment.
    Inspect {
        /// Deployment name.
        name: String,
    },
    /// Run diagnostic checks on the tool and the store.
    Doctor {
        /// Tool binary to check for.
        #[arg(long)]
        binary: Option<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PACKSMITH_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let store_path = expand_tilde(&cli.store);
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Init {
            name,
            pack,
            registry,
            source,
            git_ref,
            target,
            output,
            force,
        } => commands::init::run(
            &commands::init::InitOptions {
                name,
                pack,
                registry,
                source,
                git_ref,
                target,
            },
            &output,
            force,
            json_output,
        ),
        Commands::Deploy { manifest } => {
            let engine = Engine::new(&store_path);
            commands::deploy::run(&engine, &manifest, json_output)
        }
        Commands::Status { manifest } => {
            let engine = Engine::new(&store_path);
            commands::status::run(&engine, &manifest, json_output)
        }
        Commands::Destroy { manifest } => {
            let engine = Engine::new(&store_path);
            commands::destroy::run(&engine, &manifest, json_output)
        }
        Commands::Generation { manifest } => {
            let engine = Engine::new(&store_path);
            commands::generation::run(&engine, &manifest, json_output)
        }
        Commands::List => commands::list::run(&Engine::new(&store_path), json_output),
        Commands::Inspect { name } => {
            commands::inspect::run(&Engine::new(&store_path), &name, json_output)
        }
        Commands::Doctor { binary } => {
            commands::doctor::run(&store_path, binary.as_deref(), json_output)
        }
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("store error:") || msg.starts_with("store lock:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
