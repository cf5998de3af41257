//! streamcache - A Sharded In-Memory TTL Cache with Replay
//!
//! Entry point: sets up logging, builds the sharded cache with its eviction
//! workers, and hands stdin to the REPL.

use streamcache::commands::CommandHandler;
use streamcache::storage::{Cache, NUM_SHARDS};
use streamcache::{repl, VERSION};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn print_help() {
    println!(
        r#"
streamcache - A Sharded In-Memory TTL Cache with Replay

USAGE:
    streamcache

    Starts an interactive session reading commands from stdin.

COMMANDS:
    SET <key> <value> [ttlSeconds]   Store or overwrite a key
    GET <key>                        Look a key up
    REPLAY <key>                     Print the key's recent history
    EXIT                             Leave (EOF works too)

OPTIONS:
    -v, --version    Print version information
        --help       Print this help message
"#
    );
}

fn parse_args() {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-v" => {
                println!("streamcache version {VERSION}");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_help();
                std::process::exit(1);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    parse_args();

    // Log to stderr so tracing output never interleaves with REPL replies.
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    println!("streamcache v{VERSION} - type SET/GET/REPLAY/EXIT");

    let cache = Cache::new(NUM_SHARDS);
    info!(shards = NUM_SHARDS, "cache initialized");

    let mut handler = CommandHandler::new(cache);
    repl::run(&mut handler).await?;

    let metrics = handler.cache().metrics();
    info!(
        evictions = metrics.evictions_total,
        batches = metrics.eviction_batches,
        "shutdown complete"
    );

    Ok(())
}
