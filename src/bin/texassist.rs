//! texassist CLI - preview cursor rendering and argument completion for LaTeX

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;
#[cfg(feature = "cli")]
use texassist::{
    argument_index, ArgumentCompleter, AssistConfig, AssistError, CompletionContext,
    CompletionSource, CursorRenderer, PackageCatalog, Position, Range, TexMath, TextDocument,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "texassist")]
#[command(version)]
#[command(about = "LaTeX preview cursor rendering and argument completion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Insert the cursor marker into a math snippet
    Cursor {
        /// File holding the snippet (reads from stdin if not provided)
        input: Option<String>,

        /// 0-based cursor line within the snippet
        #[arg(short, long, default_value_t = 0)]
        line: usize,

        /// 0-based cursor column within the snippet, in chars
        #[arg(short = 'C', long)]
        character: usize,

        /// Color used when the configured color is "auto"
        #[arg(long, default_value = "#000000")]
        theme_color: String,
    },

    /// Print the index of the argument group open at the end of the text
    ArgIndex {
        /// Argument text, starting at the first `[` or `{`
        text: String,
    },

    /// Print key-value completion candidates as JSON
    Complete {
        /// Text of the line being edited
        line: String,

        /// Cursor column in chars (end of line if not provided)
        #[arg(short = 'C', long)]
        character: Option<usize>,

        /// Directory holding `<package>.json` data files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Document whose \usepackage lines select the packages
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Language id of the document
        #[arg(long, default_value = "latex")]
        lang_id: String,
    },
}

#[cfg(feature = "cli")]
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn into_io(err: AssistError) -> io::Error {
    io::Error::other(err.to_string())
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => AssistConfig::from_path(path).map_err(into_io)?,
        None => AssistConfig::default(),
    };

    match cli.command {
        Commands::Cursor {
            input,
            line,
            character,
            theme_color,
        } => {
            let snippet = match input {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buffer = String::new();
                    io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let snippet = snippet.strip_suffix('\n').unwrap_or(&snippet).to_string();
            let cursor = Position::new(line, character);
            let rendered = render_snippet(config, snippet, cursor, &theme_color)
                .await
                .map_err(into_io)?;
            println!("{}", rendered);
        }
        Commands::ArgIndex { text } => match argument_index(&text) {
            Ok(index) => println!("{}", index),
            Err(err) => {
                eprintln!("error: {}", err);
                std::process::exit(1);
            }
        },
        Commands::Complete {
            line,
            character,
            data_dir,
            source,
            lang_id,
        } => {
            let catalog = match data_dir {
                Some(dir) => PackageCatalog::from_dir(dir),
                None => PackageCatalog::in_memory(),
            };
            if let Some(path) = source {
                catalog.include_from_source(&fs::read_to_string(path)?);
            }
            let character = character.unwrap_or_else(|| line.chars().count());
            let completer = ArgumentCompleter::new(Arc::new(catalog), config.completion);
            let items = completer.complete(&CompletionContext::new(line, character, lang_id));
            let json = serde_json::to_string_pretty(&items)?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// Treat the whole snippet as the math range, starting at the origin
#[cfg(feature = "cli")]
async fn render_snippet(
    config: AssistConfig,
    snippet: String,
    cursor: Position,
    theme_color: &str,
) -> texassist::AssistResult<String> {
    let last_line = snippet.split('\n').count() - 1;
    let last_len = snippet
        .rsplit('\n')
        .next()
        .map_or(0, |line| line.chars().count());
    let range = Range::new(Position::new(0, 0), Position::new(last_line, last_len));
    let document = TextDocument::new(&snippet);
    let renderer = CursorRenderer::with_mitex(config.preview);
    renderer
        .render_cursor(&document, &TexMath::new(snippet, range), Some(cursor), theme_color)
        .await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  texassist cursor --character <N> [INPUT_FILE]");
    eprintln!("  texassist arg-index <TEXT>");
    eprintln!("  texassist complete <LINE> [--data-dir <DIR>]");
}
