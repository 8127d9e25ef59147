//! `agentlab tools`: list the tools the controller can call.

pub fn list() -> Result<(), Box<dyn std::error::Error>> {
    let registry = agentlab_tools::default_registry();
    println!("  Available tools:");
    for def in registry.definitions() {
        println!("    {:<40} {}", def.signature(), def.description);
    }
    Ok(())
}
