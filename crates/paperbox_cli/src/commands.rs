//! CLI subcommands over the article repository.

use clap::Subcommand;
use paperbox_core::{AppConfig, Article, ArticleRepository, FileStorage};
use std::error::Error;
use std::process::ExitCode;

type Repo = ArticleRepository<FileStorage<Article>>;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an article
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Print one article
    Get { id: String },
    /// Print all articles
    List,
    /// Change the title and/or content of an article
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Remove an article
    Delete { id: String },
}

/// Result of a command that ran without I/O failure.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    NotFound(String),
}

impl Outcome {
    pub fn report(&self) -> ExitCode {
        match self {
            Self::Done => ExitCode::SUCCESS,
            Self::NotFound(id) => {
                eprintln!("article not found: {id}");
                ExitCode::FAILURE
            }
        }
    }
}

pub fn handle_command(command: Commands, config: &AppConfig) -> Result<Outcome, Box<dyn Error>> {
    let repo = ArticleRepository::open_collection(&config.store, &config.collection)?;

    match command {
        Commands::Add { title, content } => {
            let saved = repo.add(&Article::new(title, content))?;
            print_json(&saved)?;
            Ok(Outcome::Done)
        }
        Commands::Get { id } => match repo.get_by_id(&id)? {
            Some(article) => {
                print_json(&article)?;
                Ok(Outcome::Done)
            }
            None => Ok(Outcome::NotFound(id)),
        },
        Commands::List => {
            let mut articles = repo.get_all()?;
            articles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            print_json(&articles)?;
            Ok(Outcome::Done)
        }
        Commands::Update { id, title, content } => update(&repo, id, title, content),
        Commands::Delete { id } => {
            if repo.delete(&id)? {
                println!("deleted {id}");
                Ok(Outcome::Done)
            } else {
                Ok(Outcome::NotFound(id))
            }
        }
    }
}

// The repository replaces both text fields, so unspecified flags keep the
// stored values.
fn update(
    repo: &Repo,
    id: String,
    title: Option<String>,
    content: Option<String>,
) -> Result<Outcome, Box<dyn Error>> {
    let Some(existing) = repo.get_by_id(&id)? else {
        return Ok(Outcome::NotFound(id));
    };

    let changes = Article {
        title: title.unwrap_or(existing.title),
        content: content.unwrap_or(existing.content),
        ..existing
    };
    if !repo.update(&changes)? {
        return Ok(Outcome::NotFound(id));
    }

    match repo.get_by_id(&id)? {
        Some(article) => print_json(&article)?,
        None => return Ok(Outcome::NotFound(id)),
    }
    Ok(Outcome::Done)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
