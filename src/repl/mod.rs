//! Interactive REPL
//!
//! The outermost loop: prompt, read one line from stdin, hand it to the
//! command handler, print whatever comes back. EXIT or end-of-input stops
//! the eviction workers before returning, so the process never leaves
//! background tasks behind.

use crate::commands::{CommandHandler, Outcome};
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

/// Runs the read-parse-dispatch loop until EXIT or EOF.
pub async fn run(handler: &mut CommandHandler) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("stdin closed, leaving repl");
            break;
        };

        match handler.execute(&line) {
            Outcome::Reply(output) => {
                for reply_line in output {
                    stdout.write_all(reply_line.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                }
                stdout.flush().await?;
            }
            Outcome::Exit => {
                debug!("exit requested");
                break;
            }
        }
    }

    handler.shutdown().await;
    Ok(())
}
