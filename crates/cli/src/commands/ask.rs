//! `agentlab ask`: answer a single request.

use agentlab_core::message::SessionId;

use super::runtime;

pub async fn run(session: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config()?;
    let history = runtime::open_history(&config).await?;
    let controller = runtime::build_controller(&config, history)?;

    let outcome = controller.run(message, &SessionId::from(session)).await;
    tracing::debug!(steps = outcome.steps, exit = ?outcome.exit, "Request finished");
    println!("{}", outcome.answer);
    Ok(())
}
