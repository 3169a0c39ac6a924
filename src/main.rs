use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use resume_chat::app::App;
use resume_chat::tui::{self, EventHandler, TICK_RATE};
use resume_chat::{
    build_backend, handler, ui, ChatWidget, Config, ConsoleView, ContextDocument, HostedApiClient,
    Provider, Transcript, TranscriptView, QUICK_QUESTIONS,
};

#[derive(Parser)]
#[command(name = "resume-chat")]
#[command(version, about = "Chat with an AI assistant about a résumé")]
struct Cli {
    /// Backend to use: gemini or hosted
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Base URL of the hosted chat API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Résumé/biography document for the gemini backend
    #[arg(long, global = true)]
    context: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full-screen chat (default)
    Chat,
    /// Line-by-line chat on stdin/stdout
    Repl,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Check that the hosted chat API is reachable
    Health,
    /// Print the effective configuration
    Config {
        /// Write a default config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    match &command {
        Commands::Chat => init_logging(Some(&Config::log_path()?))?,
        _ => init_logging(None)?,
    }

    let config = load_config(cli.config.as_deref(), cli.provider, cli.api_url, cli.context)?;

    let succeeded = match command {
        Commands::Chat => {
            run_tui(&config).await?;
            true
        }
        Commands::Repl => {
            run_repl(&config).await?;
            true
        }
        Commands::Ask { question } => ask(&config, &question).await?,
        Commands::Health => health(&config).await?,
        Commands::Config { init } => {
            show_config(&config, cli.config.as_deref(), init)?;
            true
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// The TUI owns the terminal, so its logs go to a file
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let default_filter = if log_file.is_some() {
        "resume_chat=info"
    } else {
        // Failures already reach the user as the backend's apology
        "resume_chat=error"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

/// File, then environment, then command-line flags
fn load_config(
    path: Option<&Path>,
    provider: Option<String>,
    api_url: Option<String>,
    context: Option<PathBuf>,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };

    if let Some(provider) = provider {
        if Provider::parse(&provider).is_none() {
            anyhow::bail!("Unknown provider '{}'. Use 'gemini' or 'hosted'.", provider);
        }
        config.provider = Some(provider);
    }
    if api_url.is_some() {
        config.api_base_url = api_url;
    }
    if context.is_some() {
        config.context_path = context;
    }

    Ok(config)
}

fn load_context(config: &Config) -> Result<ContextDocument> {
    match &config.context_path {
        Some(path) => ContextDocument::load(path, &config.subject_name()),
        None => Ok(ContextDocument::new(String::new(), config.subject_name())),
    }
}

fn build_widget<V: TranscriptView>(config: &Config, view: V) -> Result<ChatWidget<V>> {
    let context = if config.provider() == Provider::Gemini {
        load_context(config)?
    } else {
        ContextDocument::default()
    };
    let backend = build_backend(config, context)?;

    tracing::info!(provider = %backend.provider(), "Chat backend ready");

    Ok(ChatWidget::new(backend, view, config.greeting()).with_timeout(config.timeout()))
}

fn backend_label(config: &Config) -> String {
    match config.provider() {
        Provider::Gemini => format!("{}: {}", config.provider().display_name(), config.gemini_model()),
        Provider::Hosted => format!("{}: {}", config.provider().display_name(), config.api_base_url()),
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    let widget = build_widget(config, Transcript::new())?;
    let mut app = App::new(widget, backend_label(config));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);

    let result: Result<()> = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok(())
    }
    .await;

    tui::restore()?;
    result
}

async fn run_repl(config: &Config) -> Result<()> {
    let view = ConsoleView::new(io::stdout()).without_user_echo();
    let mut widget = build_widget(config, view)?;

    println!(
        "{} {}",
        "Connected to".dimmed(),
        backend_label(config).bold()
    );
    println!("{}", "Type /help for commands.\n".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "/quit" | "/exit" => break,
            "/reset" => widget.reset(),
            "/help" => print_repl_help(),
            _ if line.starts_with('/') => {
                let quick = line[1..]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| QUICK_QUESTIONS.get(i));
                match quick {
                    Some(question) => {
                        println!("{} {}\n", "You:".cyan().bold(), question);
                        widget.submit(question).await;
                    }
                    None => println!("{}", "Unknown command. Type /help.".red()),
                }
            }
            _ => widget.submit(line).await,
        }
    }

    Ok(())
}

fn print_repl_help() {
    println!("{}", "Commands:".bold());
    println!("  /reset   start a new conversation");
    println!("  /quit    leave");
    for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
        println!("  /{}       {}", i + 1, question);
    }
    println!();
}

/// Returns whether an answer was printed
async fn ask(config: &Config, question: &str) -> Result<bool> {
    let view = ConsoleView::new(io::stdout()).muted().without_user_echo();
    let mut widget = build_widget(config, view)?;
    widget.view_mut().set_muted(false);

    widget.submit(question).await;

    // On failure the apology is already on screen
    Ok(!widget.history().is_empty())
}

/// Returns whether the configured backend looks usable
async fn health(config: &Config) -> Result<bool> {
    match config.provider() {
        Provider::Hosted => {
            let client = HostedApiClient::new(&config.api_base_url());
            println!("🔍 Checking {}", client.base_url().cyan());

            match client.health().await {
                Ok(status) => {
                    let status_text = if status.is_healthy() {
                        status.status.green().bold()
                    } else {
                        status.status.yellow().bold()
                    };
                    println!("  status:            {}", status_text);
                    println!("  gemini configured: {}", yes_no(status.gemini_configured));
                    println!("  rag initialized:   {}", yes_no(status.rag_initialized));
                    Ok(status.is_healthy())
                }
                Err(e) => {
                    println!("{}: {}", "Chat API unreachable".red(), e);
                    println!(
                        "Make sure the backend is running on {}",
                        config.api_base_url().bold()
                    );
                    Ok(false)
                }
            }
        }
        Provider::Gemini => {
            println!(
                "{}",
                "The gemini backend has no health endpoint; requests go straight to the API.".dimmed()
            );
            println!(
                "  api key:  {}",
                yes_no(config.gemini_api_key().is_some())
            );
            println!("  model:    {}", config.gemini_model());
            match &config.context_path {
                Some(path) => println!("  context:  {}", path.display()),
                None => println!("  context:  {}", "none".yellow()),
            }
            Ok(config.gemini_api_key().is_some())
        }
    }
}

fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}

fn show_config(config: &Config, path: Option<&Path>, init: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::get_config_path()?,
    };

    if init {
        if init_config(&path)? {
            println!("{} {}", "✓ Wrote default config to".green(), path.display());
        } else {
            println!("{}", "Config file already exists, leaving it alone.".dimmed());
        }
    }

    println!("{} {}", "Config file:".bold(), path.display());
    println!("{} {}", "Provider:".bold(), config.provider().display_name());
    println!("{}", serde_json::to_string_pretty(&config.masked())?);
    Ok(())
}

/// Write defaults unless a config file is already there
fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    Config::new().save_to(path)?;
    Ok(true)
}
