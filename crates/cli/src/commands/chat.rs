//! `agentlab chat`: interactive session over stdin.

use std::io::Write;
use agentlab_core::message::SessionId;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::runtime;

pub async fn run(session: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config()?;
    let history = runtime::open_history(&config).await?;
    let controller = runtime::build_controller(&config, history)?;
    let session = SessionId::from(session);

    println!();
    println!("  agentlab chat");
    println!();
    println!("  Provider:  {}", config.provider.kind);
    println!("  Model:     {}", config.provider.model);
    println!("  Session:   {session}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let outcome = controller.run(line, &session).await;
        println!();
        for text in outcome.answer.lines() {
            println!("  Assistant > {text}");
        }
        println!();
    }

    println!();
    Ok(())
}
