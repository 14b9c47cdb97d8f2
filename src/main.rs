use anyhow::{Context, Result, bail};
use catalog_overlay::{
    Entity, EntityDraft, EntityPatch, Gender, Status, SyncConfig, SyncEngine, ViewState,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catalog-overlay")]
#[command(about = "Browse the character catalog merged with your local edits")]
struct Cli {
    /// Directory holding the local overlay
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Remote catalog endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Remote request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show one page of the merged view
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Show only the local overlay
    Locals,
    /// Show one character
    Show {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// Create a local character
    Add {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Edit a character, masking the remote copy if needed
    Edit {
        #[arg(allow_negative_numbers = true)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a local character
    Delete {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
}

#[derive(Args)]
struct FieldArgs {
    #[arg(long)]
    species: Option<String>,
    #[arg(long)]
    status: Option<Status>,
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    image: Option<String>,
    #[arg(long = "type")]
    kind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_overlay=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let engine = SyncEngine::from_config(&config).context("Failed to open sync engine")?;

    match cli.command {
        Command::List { page, name } => {
            engine.load(page, &name).await?;
            print_view(&engine.view());
        }
        Command::Locals => {
            let locals = engine.overlay().read_all_lenient();
            println!("{} local characters", locals.len());
            for entity in &locals {
                println!("{}", entity_line(entity));
            }
        }
        Command::Show { id } => match engine.get_by_id(id).await? {
            Some(entity) => print_entity(&entity),
            None => bail!("Character {} not found", id),
        },
        Command::Add { name, fields } => {
            let draft = EntityDraft {
                name,
                status: fields.status.unwrap_or(Status::Alive),
                species: fields.species.unwrap_or_default(),
                kind: fields.kind,
                gender: fields.gender.unwrap_or(Gender::Male),
                image: fields.image.unwrap_or_default(),
                ..EntityDraft::default()
            };
            let created = engine.add_local_character(draft).await?;
            println!("Created {}", entity_line(&created));
            print_view(&engine.view());
        }
        Command::Edit { id, name, fields } => {
            let patch = EntityPatch {
                name,
                status: fields.status,
                species: fields.species,
                kind: fields.kind,
                gender: fields.gender,
                image: fields.image,
            };
            if patch.is_empty() {
                bail!("Nothing to edit: pass at least one field flag");
            }
            match engine.edit_local_character(id, patch).await? {
                Some(edited) => println!("Edited {}", entity_line(&edited)),
                None => println!("Character {} not found, nothing changed", id),
            }
            print_view(&engine.view());
        }
        Command::Delete { id } => {
            if engine.delete_local(id).await? {
                println!("Deleted local character {}", id);
            } else {
                println!("No local character {}; remote records can only be masked by edits", id);
            }
            print_view(&engine.view());
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = SyncConfig::from_env().map_err(anyhow::Error::msg)?;
    if let Some(dir) = &cli.data_dir {
        config = config.data_dir(dir.clone());
    }
    if let Some(url) = &cli.base_url {
        config = config.base_url(url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.request_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn entity_line(entity: &Entity) -> String {
    format!(
        "{:>6}  {:<32} {:<8} {:<14} {:<10}{}",
        entity.id,
        entity.name,
        entity.status,
        entity.species,
        entity.gender,
        if entity.is_local() { " [local]" } else { "" }
    )
}

fn print_view(view: &ViewState) {
    let query = if view.query.is_empty() { "-" } else { view.query.as_str() };
    println!("page {}  filter {}  total {}", view.page, query, view.total);
    for entity in &view.characters {
        println!("{}", entity_line(entity));
    }
}

fn print_entity(entity: &Entity) {
    println!("{}", entity_line(entity));
    if let Some(kind) = entity.kind.as_deref().filter(|kind| !kind.is_empty()) {
        println!("  type:     {}", kind);
    }
    if let Some(origin) = &entity.origin {
        println!("  origin:   {}", origin.name);
    }
    if let Some(location) = &entity.location {
        println!("  location: {}", location.name);
    }
    if !entity.image.is_empty() {
        println!("  image:    {}", entity.image);
    }
    if !entity.episode.is_empty() {
        println!("  episodes: {}", entity.episode.len());
    }
    if let Some(updated_at) = entity.updated_at {
        println!("  updated:  {}", updated_at.to_rfc3339());
    }
}
