mod config;
mod constants;
mod messages;

use crate::config::{initialize_store, load_config};
use crate::messages::{locale_for, text};
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use promptdeck_core::locale::LocaleProvider;
use promptdeck_core::placeholders;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version,
display_name = "promptdeck",
bin_name = "promptdeck",
about="Keep a deck of reusable prompts",
long_about="Keep a deck of reusable prompts. Placeholders written as {name} are filled in by `use`.", )]
struct Args {
    /// Directory for local storage. Implies the local backend.
    #[arg(short = 'p', long)]
    storage_path: Option<String>,

    /// Locale tag, e.g. ko-KR or en-US.
    #[arg(short = 'l', long)]
    locale: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

/// Prompts are addressed by their 1-based position in the list.
#[derive(Subcommand, Debug, Clone)]
enum Commands {
    List,
    Add {
        #[arg(short = 'c', long)]
        content: String,
    },
    Edit {
        position: usize,
        #[arg(short = 'c', long)]
        content: String,
    },
    Delete {
        position: usize,
    },
    Move {
        from: usize,
        to: usize,
    },
    /// Fill in a prompt's placeholders and print it.
    Use {
        position: usize,
        /// Placeholder values as name=value.
        #[arg(short = 'a', long)]
        args: Vec<String>,
        #[arg(short = 'c', long)]
        copy: bool,
    },
    /// Replace the list with the sample prompts.
    Reset,
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(err) = run(args).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(exitcode::SOFTWARE);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    if let Commands::Completions { shell } = &args.cmd {
        clap_complete::generate(*shell, &mut Args::command(), "promptdeck", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(args.storage_path, args.locale);
    let locale = Arc::new(locale_for(config.store.resolve_locale())?);
    let store = initialize_store(&config.store, locale.clone());
    let locale = locale.as_ref();
    debug!(backend = ?store.backend_kind(), locale = %locale.locale(), "store initialized");

    store.load_prompts().await;
    if !store.is_loaded() {
        bail!(text(locale, "loadFailed", &[]));
    }

    match args.cmd {
        Commands::List => {
            let prompts = store.prompts();
            if prompts.is_empty() {
                println!("{}", text(locale, "emptyList", &[]));
            }
            for (index, prompt) in prompts.iter().enumerate() {
                println!("{:>3}. {}", index + 1, prompt.replace('\n', "\n     "));
            }
        }
        Commands::Add { content } => {
            let index = store.add_prompt(content).await?;
            let position = (index + 1).to_string();
            println!("{}", text(locale, "promptAdded", &[position.as_str()]));
        }
        Commands::Edit { position, content } => {
            let index = to_index(position, store.prompts().len())?;
            store.update_prompt(index, content).await?;
            println!("{}", text(locale, "promptUpdated", &[position.to_string().as_str()]));
        }
        Commands::Delete { position } => {
            let index = to_index(position, store.prompts().len())?;
            store.remove_prompt(index).await?;
            println!("{}", text(locale, "promptDeleted", &[position.to_string().as_str()]));
        }
        Commands::Move { from, to } => {
            let len = store.prompts().len();
            store.move_prompt(to_index(from, len)?, to_index(to, len)?).await?;
            println!(
                "{}",
                text(locale, "promptMoved", &[from.to_string().as_str(), to.to_string().as_str()])
            );
        }
        Commands::Use {
            position,
            args,
            copy,
        } => {
            let prompts = store.prompts();
            let prompt = &prompts[to_index(position, prompts.len())?];
            let values = parse_arguments(&args)?;
            let rendered = placeholders::render(prompt, &values).with_context(|| {
                format!(
                    "prompt #{} expects: {}",
                    position,
                    placeholders::names(prompt).join(", ")
                )
            })?;

            if copy || config.copy_to_clipboard {
                let mut clipboard = arboard::Clipboard::new()?;
                clipboard.set_text(rendered)?;
                println!("{}", text(locale, "copiedToClipboard", &[]));
            } else {
                println!("{}", rendered);
            }
        }
        Commands::Reset => {
            let defaults = store.restore_defaults().await?;
            println!(
                "{}",
                text(locale, "defaultsRestored", &[defaults.len().to_string().as_str()])
            );
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn to_index(position: usize, len: usize) -> Result<usize> {
    if position == 0 || position > len {
        bail!("no prompt at position {} (the list has {})", position, len);
    }
    Ok(position - 1)
}

fn parse_arguments(args: &[String]) -> Result<HashMap<String, String>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((name, value)) => Ok((name.to_string(), value.to_string())),
            None => bail!("invalid argument '{}', expected name=value", arg),
        })
        .collect()
}
