use std::fs::OpenOptions;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use portfolio_cli::api::ApiClient;
use portfolio_cli::app::App;
use portfolio_cli::chat::ChatSession;
use portfolio_cli::config::Config;
use portfolio_cli::handler::handle_event;
use portfolio_cli::render::select_renderer;
use portfolio_cli::tui::{self, EventHandler, Tui};
use portfolio_cli::ui;

#[derive(Parser)]
#[command(name = "portfolio")]
#[command(about = "Terminal portfolio with an AI assistant that answers questions about it")]
#[command(version)]
struct Cli {
    /// Backend origin, e.g. https://portfolio.example.com
    #[arg(long, env = "PORTFOLIO_API_URL", global = true)]
    api_url: Option<String>,

    /// Show assistant replies as plain text instead of rendered markdown
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the assistant a single question and print the reply
    Ask {
        /// Your question
        question: String,
    },
    /// Show or change saved settings
    Config {
        /// Save a backend origin to use when --api-url is not given
        #[arg(long, value_name = "URL")]
        set_api_url: Option<String>,
        /// Save whether replies default to plain text
        #[arg(long, value_name = "BOOL")]
        set_plain_text: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file
    init_logging(cli.command.is_none());

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable config: {}", e);
        Config::new()
    });
    let base_url = config.base_url(cli.api_url.as_deref());
    let client = ApiClient::new(&base_url);

    match cli.command {
        None => {
            let plain = cli.plain
                || config.plain_text.unwrap_or(false)
                || std::env::var_os("NO_COLOR").is_some();
            run_tui(client, plain).await
        }
        Some(Commands::Ask { question }) => ask(&client, &question).await,
        Some(Commands::Config { set_api_url, set_plain_text }) => {
            update_config(config, set_api_url, set_plain_text)
        }
    }
}

fn init_logging(to_file: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if to_file {
        let log_file = dirs::cache_dir()
            .map(|dir| dir.join("portfolio-cli"))
            .and_then(|dir| {
                std::fs::create_dir_all(&dir).ok()?;
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join("portfolio-cli.log"))
                    .ok()
            });

        match log_file {
            Some(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            // Nowhere safe to write while the screen is in use
            None => {
                builder.filter_level(LevelFilter::Off);
            }
        }
    }

    builder.try_init().ok();
}

async fn run_tui(client: ApiClient, plain: bool) -> Result<()> {
    info!("Starting TUI against {}", client.base_url());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let renderer = select_renderer(plain);
    info!("Using {} renderer", renderer.name());

    let mut app = App::new(client, renderer, events.sender());
    app.spawn_portfolio_load();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn ask(client: &ApiClient, question: &str) -> Result<()> {
    let mut session = ChatSession::new();

    if !session.send(Some(question), client).await {
        bail!("Nothing to ask: the question is empty");
    }

    if let Some(reply) = session.transcript().last() {
        println!("{}", reply.content);
    }
    Ok(())
}

fn update_config(
    mut config: Config,
    set_api_url: Option<String>,
    set_plain_text: Option<bool>,
) -> Result<()> {
    let changed = set_api_url.is_some() || set_plain_text.is_some();

    if let Some(url) = set_api_url {
        config.api_url = Some(url).filter(|u| !u.trim().is_empty());
    }
    if let Some(plain) = set_plain_text {
        config.plain_text = Some(plain);
    }
    if changed {
        config.save()?;
        info!("Saved config");
    }

    println!("Config file: {}", Config::get_config_path()?.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("Effective backend: {}", config.base_url(None));
    Ok(())
}
