use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use storyforge::config::{load_config, StoryForgeConfig};
use storyforge::errors::{Result, StoryForgeError};
use storyforge::mcp::McpServer;
use storyforge::storyforge::StoryForge;

/// Story projects with cross-block references.
#[derive(Parser)]
#[command(name = "storyforge", about = "Story projects with cross-block references")]
struct Cli {
    /// Workspace root (default: current directory)
    #[arg(short, long, global = true)]
    path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new workspace with an empty project
    Init {
        /// Project title
        #[arg(short, long, default_value = "Untitled")]
        title: String,
        /// Project author
        #[arg(short, long, default_value = "")]
        author: String,
    },
    /// Show project statistics
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Create a block (and its category if needed)
    AddBlock { category: String, name: String },
    /// Add a stage to a block
    AddStage {
        category: String,
        block: String,
        stage: String,
        /// Stage input text, may contain [references]
        #[arg(default_value = "")]
        input: String,
    },
    /// Add an output version to a stage
    AddVersion {
        category: String,
        block: String,
        stage: String,
        version: String,
        content: String,
        /// Also select the new version
        #[arg(short, long)]
        select: bool,
    },
    /// Select the active version of a stage
    Select {
        category: String,
        block: String,
        stage: String,
        version: String,
    },
    /// Resolve a single reference such as [character:alice]
    Resolve { reference: String },
    /// Expand references in a text or in a stage's input
    Expand {
        /// Text to expand
        text: Option<String>,
        /// Expand the input of this stage instead (category:block:stage)
        #[arg(short, long, conflicts_with = "text")]
        stage: Option<String>,
    },
    /// List references cited by a block, or citing it with --incoming
    Refs {
        category: String,
        block: String,
        #[arg(short, long)]
        incoming: bool,
    },
    /// List references cited by a block that do not resolve
    Unresolved { category: String, block: String },
    /// Start the MCP server on stdio
    Serve,
}

fn main() {
    let cli = Cli::parse();
    let root = resolve_path(cli.path.clone());
    init_tracing(&root);

    if let Err(e) = run(cli.command, &root) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Installs a stderr subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(root: &Path) {
    let configured = load_config(root)
        .unwrap_or_else(|_| StoryForgeConfig::default())
        .log_filter;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, root: &Path) -> Result<()> {
    match command {
        Commands::Init { title, author } => {
            StoryForge::init(root, &title, &author)?;
            println!("Initialized StoryForge workspace at {}", root.display());
        }
        Commands::Status { json } => {
            let sf = StoryForge::open(root)?;
            let stats = sf.get_stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("StoryForge Status: {}", sf.project().title());
                println!("  Categories: {}", stats.category_count);
                println!("  Blocks:     {}", stats.block_count);
                println!("  Stages:     {}", stats.stage_count);
                println!("  Versions:   {}", stats.version_count);
                println!(
                    "  References: {} ({} unresolved)",
                    stats.reference_count, stats.unresolved_count
                );
            }
        }
        Commands::AddBlock { category, name } => {
            let mut sf = StoryForge::open(root)?;
            sf.project_mut().create_block(category.as_str(), name.as_str(), None)?;
            sf.save()?;
            println!("Created block {}:{}", category, name);
        }
        Commands::AddStage {
            category,
            block,
            stage,
            input,
        } => {
            let mut sf = StoryForge::open(root)?;
            sf.project_mut()
                .add_stage(&category, &block, stage.as_str(), input)?;
            sf.save()?;
            println!("Added stage {}:{}:{}", category, block, stage);
        }
        Commands::AddVersion {
            category,
            block,
            stage,
            version,
            content,
            select,
        } => {
            let mut sf = StoryForge::open(root)?;
            let project = sf.project_mut();
            project.add_version(&category, &block, &stage, version.as_str(), content)?;
            if select {
                project.select_version(&category, &block, &stage, &version)?;
            }
            sf.save()?;
            println!("Added version {} to {}:{}:{}", version, category, block, stage);
        }
        Commands::Select {
            category,
            block,
            stage,
            version,
        } => {
            let mut sf = StoryForge::open(root)?;
            sf.project_mut()
                .select_version(&category, &block, &stage, &version)?;
            sf.save()?;
            println!("Selected {} for {}:{}:{}", version, category, block, stage);
        }
        Commands::Resolve { reference } => {
            let sf = StoryForge::open(root)?;
            match sf.resolve(&reference) {
                Some(content) => println!("{}", content),
                None => {
                    return Err(StoryForgeError::Project {
                        message: format!("unresolved reference: {}", reference),
                    })
                }
            }
        }
        Commands::Expand { text, stage } => {
            let sf = StoryForge::open(root)?;
            let expanded = match (text, stage) {
                (_, Some(target)) => {
                    let (category, block, stage) = split_stage_target(&target)?;
                    sf.expand_stage_input(category, block, stage)?
                }
                (Some(text), None) => sf.expand(&text),
                (None, None) => {
                    return Err(StoryForgeError::Project {
                        message: "nothing to expand: pass TEXT or --stage".to_string(),
                    })
                }
            };
            println!("{}", expanded);
        }
        Commands::Refs {
            category,
            block,
            incoming,
        } => {
            let sf = StoryForge::open(root)?;
            if incoming {
                let refs = sf.references_to(&category, &block);
                if refs.is_empty() {
                    println!("No stages reference {}:{}", category, block);
                }
                for r in &refs {
                    println!("{}", r);
                }
            } else {
                let refs = sf.references_in(&category, &block);
                if refs.is_empty() {
                    println!("{}:{} cites no references", category, block);
                }
                for token in &refs {
                    println!("[{}]", token);
                }
            }
        }
        Commands::Unresolved { category, block } => {
            let sf = StoryForge::open(root)?;
            for token in sf.unresolved_references_in(&category, &block) {
                println!("[{}]", token);
            }
        }
        Commands::Serve => {
            let sf = StoryForge::open(root)?;
            let server = McpServer::new(sf);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server.run())?;
        }
    }
    Ok(())
}

/// Splits a `category:block:stage` target.
fn split_stage_target(target: &str) -> Result<(&str, &str, &str)> {
    let mut parts = target.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(category), Some(block), Some(stage), None) => Ok((category, block, stage)),
        _ => Err(StoryForgeError::Project {
            message: format!("expected category:block:stage, got '{}'", target),
        }),
    }
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
