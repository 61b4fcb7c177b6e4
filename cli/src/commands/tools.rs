use anyhow::Result;
use localgate_agent::ToolRegistry;
use localgate_core::Config;

pub fn execute(config: &Config) -> Result<()> {
    let registry = ToolRegistry::from_names(&config.agent.tools, &config.agent.workspace_root)?;

    if registry.is_empty() {
        println!("No tools enabled.");
        println!("\nRun `localgate config agent.tools file_search,file_reader,logger` to enable them.");
        return Ok(());
    }

    println!("Workspace: {}\n", config.agent.workspace_root.display());
    println!("{:<14} {}", "NAME", "DESCRIPTION");
    println!("{}", "-".repeat(80));

    for tool in registry.list() {
        println!("{:<14} {}", tool.name, tool.description);
        if let Some(params) = tool.input_schema.as_object() {
            for (name, spec) in params {
                let kind = spec["type"].as_str().unwrap_or("any");
                println!("{:<14}   {} ({})", "", name, kind);
            }
        }
    }

    Ok(())
}
