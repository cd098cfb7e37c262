//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod persona_list;
pub mod say;
pub mod session_list;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::cli::persona_list::list_personas;
use crate::cli::say::run_say;
use crate::cli::session_list::list_sessions;
use crate::core::chat_stream::GeminiClient;
use crate::core::config::{path_display, Config};
use crate::core::conversation::ChatController;
use crate::core::persona::Persona;
use crate::core::store::{FileStorage, MemoryStorage, SessionStorage, SessionStore};
use crate::logging::init_logging;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "A terminal chat client for a multi-persona Gemini agent")]
#[command(
    long_about = "Nexus is a full-screen terminal chat client with multiple conversations, \
selectable personas, image attachments and optional web search grounding. \
Replies stream in as they are generated and every conversation is saved locally.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    Your Gemini API key (API_KEY is used as a fallback)\n\
  RUST_LOG          Log filter (default: nexus=info)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Shift+Enter       New line (also Alt+Enter)\n\
  Tab               Fill in a suggestion on an empty conversation\n\
  Ctrl+N            New conversation\n\
  Alt+Up/Alt+Down   Switch conversation (also Ctrl+K/Ctrl+J)\n\
  Ctrl+D            Delete the current conversation\n\
  Ctrl+P            Cycle persona\n\
  Ctrl+G            Toggle web search\n\
  Esc               Remove a pending image attachment\n\
  Ctrl+C            Quit\n\n\
Commands:\n\
  /new /delete /persona <name> /search on|off /image <path> /help [command]"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Persona for new conversations (general, coder, writer, analyst)
    #[arg(short = 'p', long, global = true, value_parser = parse_persona)]
    pub persona: Option<Persona>,

    /// Enable web search grounding
    #[arg(short = 's', long, global = true)]
    pub search: bool,

    /// Write diagnostic logs to this file instead of the data directory
    #[arg(short = 'l', long, global = true)]
    pub log: Option<PathBuf>,

    /// Keep conversations in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single prompt and print the reply
    Say {
        /// The prompt to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List saved conversations
    Sessions,
    /// List available personas
    Personas,
    /// Show the current configuration
    Config,
}

fn parse_persona(value: &str) -> Result<Persona, String> {
    Persona::try_from(value.to_string())
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(persona) = self.persona {
            config.default_persona = Some(persona);
        }
        if self.search {
            config.use_search = Some(true);
        }
    }
}

fn open_storage(ephemeral: bool) -> Result<Box<dyn SessionStorage>, Box<dyn Error>> {
    if ephemeral {
        return Ok(Box::new(MemoryStorage::new()));
    }
    let storage = FileStorage::default_location()?;
    info!(path = %path_display(storage.path()), "Using session file");
    Ok(Box::new(storage))
}

fn build_controller(args: &Args, config: Config) -> Result<ChatController, Box<dyn Error>> {
    let storage = open_storage(args.ephemeral)?;
    let store = SessionStore::load(storage, config.agent_config().persona)?;
    let client = GeminiClient::from_env(config.base_url())?;
    let controller = ChatController::new(store, config, Arc::new(client));
    Ok(controller.with_config_path(Config::get_config_path()?))
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Personas) => {
            list_personas();
            return Ok(());
        }
        Some(Commands::Config) => {
            Config::load()?.print_all();
            println!(
                "\nConfig file: {}",
                path_display(Config::get_config_path()?)
            );
            return Ok(());
        }
        _ => {}
    }

    let log_path = init_logging(args.log.as_deref())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        log = %path_display(&log_path),
        "Starting nexus"
    );

    let mut config = Config::load()?;
    args.apply_overrides(&mut config);

    match &args.command {
        Some(Commands::Sessions) => list_sessions(args.ephemeral),
        Some(Commands::Say { prompt }) => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                eprintln!("Usage: nexus say <prompt>");
                std::process::exit(1);
            }
            let controller = build_controller(&args, config)?;
            run_say(controller, &prompt, args.ephemeral).await
        }
        Some(Commands::Chat) | None => {
            let controller = build_controller(&args, config)?;
            run_chat(controller).await
        }
        Some(Commands::Personas) | Some(Commands::Config) => Ok(()),
    }
}
