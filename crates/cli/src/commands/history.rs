//! `agentlab history` / `agentlab clear`: inspect and reset a session.

use agentlab_core::message::{Role, SessionId};

use super::runtime;

pub async fn show(session: &str, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config()?;
    let history = runtime::open_history(&config).await?;
    let session = SessionId::from(session);

    let turns = history.recent(&session, limit).await?;
    if turns.is_empty() {
        println!("  No turns stored for session '{session}'.");
        return Ok(());
    }

    for turn in &turns {
        let who = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        println!("  {who:>9} > {}", turn.content);
    }
    Ok(())
}

pub async fn clear(session: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config()?;
    let history = runtime::open_history(&config).await?;
    let session = SessionId::from(session);

    let removed = history.clear(&session).await?;
    println!("  Removed {removed} turns from session '{session}'.");
    Ok(())
}
