//! murmur CLI
//!
//! Usage:
//!   murmur --text "Go home.[/ACTION]:stop_conversation()"   # Replay one response
//!   murmur --interactive                                     # Replay responses from stdin
//!   murmur --serve                                           # HTTP API server
//!   murmur --text "..." --json                               # JSON output

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use murmur::core::{
    run_server, ConversationFlags, DialogueDriver, NodeLedger, PresentationSink, RevealPacer,
    TurnResult,
};
use murmur::types::{AudioCue, SessionState, VoiceProfile};
use murmur::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "murmur",
    version = VERSION,
    about = "murmur - Stream model dialogue, pull out its directive, type it out with a voice",
    long_about = "murmur replays a model response the way a streaming client delivers it:\n\
                  as growing full snapshots. The narrative is typed out with syllable\n\
                  voice cues; an embedded directive runs once the line has been shown.\n\n\
                  Directive syntax:\n  \
                  <narrative>[/ACTION]:stop_conversation()\n  \
                  <narrative>\\nACTION: reveal_node(node_id=<id>)\n\n\
                  States:\n  \
                  IDLE                   - Waiting for a turn\n  \
                  STREAMING              - Narrative arriving\n  \
                  ACCUMULATING_DIRECTIVE - Narrative frozen, directive arriving\n  \
                  FINALIZING             - Waiting for the reveal before acting"
)]
struct Args {
    /// Model response to replay (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Interactive mode - one model response per line from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Voice profile JSON file
    #[arg(long)]
    voice: Option<PathBuf>,

    /// Characters added per simulated snapshot
    #[arg(long, default_value_t = 8)]
    chunk: usize,

    /// Milliseconds between simulated snapshots
    #[arg(long, default_value_t = 40)]
    chunk_ms: u64,

    /// Seed for repeatable reveal timing
    #[arg(long)]
    seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("murmur=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let voice = match &args.voice {
        Some(path) => VoiceProfile::load(path)
            .with_context(|| format!("loading voice profile {}", path.display()))?,
        None => VoiceProfile::default(),
    };

    if args.serve {
        run_server(&args.addr, voice).await?;
    } else if args.interactive {
        run_interactive(voice, &args).await?;
    } else if let Some(ref text) = args.text {
        run_single(text, voice, &args).await?;
    } else {
        // Default to interactive if no mode specified
        run_interactive(voice, &args).await?;
    }
    Ok(())
}

/// Writes newly revealed text straight to stdout
#[derive(Debug, Default)]
struct TerminalSink {
    shown: Mutex<String>,
}

impl PresentationSink for TerminalSink {
    fn set_displayed_text(&self, text: &str) {
        let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = io::stdout();
        match text.strip_prefix(shown.as_str()) {
            Some(rest) => {
                let _ = write!(stdout, "{}", rest.cyan());
            }
            // Display was cleared or rewritten
            None if !text.is_empty() => {
                let _ = write!(stdout, "\n{}", text.cyan());
            }
            None => {}
        }
        let _ = stdout.flush();
        shown.clear();
        shown.push_str(text);
    }

    fn play_cue(&self, cue: &AudioCue) {
        debug!(clip = %cue.clip, pitch = cue.pitch, volume = cue.volume, "cue");
    }
}

/// Everything a replay needs
struct Stage {
    driver: DialogueDriver,
    owner: Arc<ConversationFlags>,
    world: Arc<NodeLedger>,
}

fn build_stage(voice: VoiceProfile, args: &Args) -> Stage {
    let owner = Arc::new(ConversationFlags::new());
    let world = Arc::new(NodeLedger::open());
    let pacer = match args.seed {
        Some(seed) => RevealPacer::with_seed(voice, seed),
        None => RevealPacer::new(voice),
    };
    let sink: Option<Arc<dyn PresentationSink>> = if args.json {
        None
    } else {
        Some(Arc::new(TerminalSink::default()))
    };
    let driver = DialogueDriver::with_pacer(pacer, sink, owner.clone(), world.clone());
    Stage {
        driver,
        owner,
        world,
    }
}

/// Feed `response` as growing snapshots, complete the turn, wait for it to settle
async fn replay(stage: &mut Stage, response: &str, args: &Args) -> Result<Option<TurnResult>> {
    stage.driver.begin_turn();

    let chunk = args.chunk.max(1);
    let mut cuts: Vec<usize> = response.char_indices().map(|(i, _)| i).skip(chunk).step_by(chunk).collect();
    cuts.push(response.len());

    for cut in cuts {
        let outcome = stage.driver.on_snapshot(&response[..cut]);
        if args.json {
            let report = stage.driver.report();
            println!(
                "{}",
                serde_json::json!({ "snapshot": cut, "reason": outcome.reason(), "report": report })
            );
        }
        tokio::time::sleep(Duration::from_millis(args.chunk_ms)).await;
    }

    if stage.driver.on_turn_complete().is_none() {
        return Ok(None);
    }
    Ok(stage.driver.wait_turn().await)
}

/// Replay one response
async fn run_single(text: &str, voice: VoiceProfile, args: &Args) -> Result<()> {
    // Allow literal "\n" from the shell for the line delimiter
    let text = text.replace("\\n", "\n");
    let mut stage = build_stage(voice, args);
    let result = replay(&mut stage, &text, args).await?;
    print_result(&stage, result.as_ref(), args)
}

/// Replay responses line by line until quit or the conversation ends
async fn run_interactive(voice: VoiceProfile, args: &Args) -> Result<()> {
    let mut stage = build_stage(voice, args);

    print_header();
    println!("Paste one model response per line. Use \\n for the line delimiter.");
    println!("Type 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", format_prompt(stage.driver.state(), args.no_color));
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let response = line.replace("\\n", "\n");
        let result = replay(&mut stage, &response, args).await?;
        print_result(&stage, result.as_ref(), args)?;

        if !stage.owner.is_open() {
            println!("{}", "Conversation ended.".yellow());
            break;
        }
    }

    println!("\nDiscovered: {:?}", stage.world.discovered());
    Ok(())
}

fn print_result(stage: &Stage, result: Option<&TurnResult>, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string(&result)?);
        return Ok(());
    }

    println!();
    let report = stage.driver.report();
    if args.no_color {
        println!("{}", report.to_parseable_string());
    } else {
        println!("{}", report.to_terminal_string());
    }

    match result {
        Some(result) => {
            if let Some(dispatch) = &result.dispatch {
                println!(
                    "  {} {} ({})",
                    "→".green(),
                    dispatch.directive,
                    dispatch.presentation.code()
                );
            }
        }
        None => println!("  {}", "turn did not complete".red()),
    }
    Ok(())
}

fn print_header() {
    println!("{}", "========================================".bold());
    println!("{}", format!("  murmur v{} - Interactive", VERSION).bold());
    println!("{}", "========================================".bold());
    println!();
}

fn format_prompt(state: SessionState, no_color: bool) -> String {
    if no_color {
        return format!("[{}] > ", state);
    }
    format!(
        "{}[{}]{} > ",
        state.color_code(),
        state,
        SessionState::color_reset()
    )
}
