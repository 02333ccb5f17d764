use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storymap_project::Project;
use storymap_search::DEFAULT_RESULT_LIMIT;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and maintain story map projects", long_about = None)]
struct Args {
    /// Path to the project file
    #[arg(short, long, default_value = "story.json")]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Paragraph, link and layout counts, plus broken targets
    Stats,
    /// Find paragraphs by number, title or type
    Search {
        query: String,
        #[arg(short, long, default_value_t = DEFAULT_RESULT_LIMIT)]
        limit: usize,
    },
    /// Move legacy map positions onto the paragraphs
    Migrate {
        #[arg(long)]
        dry_run: bool,
    },
    /// Give a paragraph a new number and retarget every link to it
    Renumber { from: i64, to: i64 },
    /// Embed an image as the map backdrop
    Backdrop {
        image: Option<PathBuf>,
        /// Remove the current backdrop instead
        #[arg(long, conflicts_with = "image")]
        clear: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();
    let mut project = Project::load(&args.project)?;

    match args.command {
        Command::Stats => {
            let stats = commands::stats(&project);
            println!("Paragraphs:       {}", stats.paragraphs);
            println!("Links:            {}", stats.links);
            println!("Endings:          {}", stats.finals);
            println!("Without position: {}", stats.unpositioned);
            println!("Legacy positions: {}", stats.legacy_positions);
            for (source, target) in &stats.dangling {
                println!("Broken link:      {} -> {:?}", source, target);
            }
        }
        Command::Search { query, limit } => {
            let results = commands::search(&project.file.paragraphs, &query, limit);
            if results.is_empty() {
                println!("No matches for {:?}", query);
            }
            for result in results {
                println!("{:>6}  {:<7} {}", result.id, result.kind.label(), result.title);
            }
        }
        Command::Migrate { dry_run } => {
            let moved = commands::migrate(&mut project);
            println!("Migrated {} positions", moved);
            if moved > 0 && !dry_run {
                project.save()?;
            }
        }
        Command::Renumber { from, to } => {
            commands::renumber_paragraph(&mut project, from, to)?;
            project.save()?;
            println!("Paragraph {} is now {}", from, to);
        }
        Command::Backdrop { image, clear } => {
            if image.is_none() && !clear {
                anyhow::bail!("pass an image path or --clear");
            }
            commands::set_backdrop(&mut project, image.as_deref())?;
            project.save()?;
        }
    }
    Ok(())
}
