use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use chronicle::banner::{BannerInfo, print_banner, print_session_summary, render_story};
use chronicle::config::Config;
use chronicle::consts::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, default_download_dir, format_number};
use chronicle::engine::{StoryConfig, StoryEngine};
use chronicle::provider::gemini::GeminiProvider;
use chronicle::session::{COPIED_LABEL, GENERIC_ERROR, Session};
use chronicle::spinner::Spinner;

#[derive(Parser)]
#[command(
    name = "chronicle",
    version,
    about = "Inspiring entrepreneur stories, written and illustrated on demand."
)]
struct Cli {
    /// Generate a single story and exit (non-interactive)
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Print the story as JSON instead of text (with --once)
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Save the illustration into this directory (with --once)
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Open saved illustrations with the system viewer
    #[arg(long, default_value_t = false)]
    open: bool,

    /// Model for the idea and narrative stages
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,

    /// Model for the illustration stage
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,

    /// HTTP timeout per provider call, in seconds
    #[arg(short, long, default_value_t = 120)]
    timeout: u64,

    /// Log pipeline diagnostics to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

/// One line of REPL input.
#[derive(Debug, PartialEq)]
enum Input {
    Generate,
    Copy,
    Save(Option<PathBuf>),
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match cmd {
        "" | "/new" | "new" => Input::Generate,
        "/copy" => Input::Copy,
        "/save" if arg.is_empty() => Input::Save(None),
        "/save" => Input::Save(Some(PathBuf::from(arg))),
        "/help" | "/?" => Input::Help,
        "/quit" | "/exit" | "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    }
}

const HELP: &str = "  Enter, /new     generate a new story
  /copy           print the narrative for copying
  /save [dir]     save the illustration
  /help           show this help
  /quit           exit
";

fn init_tracing(verbose: bool) {
    let default = if verbose { "chronicle=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Credentials must exist before the provider client is built.
    let config = Config::from_env()?.with_timeout(Duration::from_secs(cli.timeout));
    let provider = Arc::new(GeminiProvider::new(&config)?);

    let engine = StoryEngine::new(
        provider,
        StoryConfig {
            text_model: cli.text_model.clone(),
            image_model: cli.image_model.clone(),
            ..StoryConfig::default()
        },
    );
    let mut session = Session::new(engine);

    if cli.once {
        return run_once(&mut session, &cli).await;
    }

    let download_dir = cli.save.clone().unwrap_or_else(default_download_dir);

    print_banner(&BannerInfo {
        text_model: &cli.text_model,
        image_model: &cli.image_model,
        auth_status: "API key (env) ✓",
        download_dir: &download_dir,
    });

    // REPL — async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nchronicle> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        match parse_input(&line) {
            Input::Generate => {
                if !generate(&mut session, false).await
                    && let Some(error) = session.error()
                {
                    eprintln!("\nerror: {}", error);
                }
            }
            Input::Copy => match session.copy_story() {
                Some(narrative) => {
                    println!("\n{}", narrative);
                    eprintln!("{}", COPIED_LABEL);
                }
                None => println!("no story yet. press Enter to generate one"),
            },
            Input::Save(dir) => {
                let dir = dir.unwrap_or_else(|| download_dir.clone());
                save(&session, &dir, cli.open).await;
            }
            Input::Help => print!("{}", HELP),
            Input::Quit => break,
            Input::Unknown(cmd) => {
                println!("unknown command: {cmd}");
                println!("type /help for available commands");
            }
        }
    }

    print_session_summary(session.generated());
    Ok(())
}

async fn run_once(session: &mut Session, cli: &Cli) -> anyhow::Result<()> {
    if !generate(session, cli.json).await {
        anyhow::bail!("{}", session.error().unwrap_or(GENERIC_ERROR));
    }

    if let Some(dir) = &cli.save {
        save(session, dir, cli.open).await;
    }
    Ok(())
}

/// Run the pipeline behind a spinner and print the story. Returns whether
/// a story was produced; Ctrl+C abandons the run.
async fn generate(session: &mut Session, json: bool) -> bool {
    let spinner = Spinner::start(session.subscribe());
    let interrupted = tokio::select! {
        _ = session.generate() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    spinner.stop().await;

    if interrupted {
        session.reset_progress();
        println!("\ninterrupted");
        return false;
    }

    match session.story() {
        Some(story) if json => match serde_json::to_string_pretty(story) {
            Ok(out) => {
                println!("{}", out);
                true
            }
            Err(e) => {
                eprintln!("error: {}", e);
                false
            }
        },
        Some(story) => {
            print!("{}", render_story(story));
            true
        }
        None => false,
    }
}

async fn save(session: &Session, dir: &Path, open_after: bool) {
    match session.download_image(dir).await {
        Ok(path) => {
            let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            println!("✓ saved {} ({} bytes)", path.display(), format_number(size));
            // Headless machines have no viewer.
            if open_after && let Err(e) = open::that(&path) {
                warn!(error = %e, "could not open image");
            }
        }
        Err(e) => eprintln!("error: {:#}", e),
    }
}
