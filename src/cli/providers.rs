//! CLI command: `steelgate providers`
//!
//! Lists every built-in provider, whether it is registered and what it
//! supports. `--check` probes each registered provider's API.

use steelgate_llm::{AiGateway, ProviderCapabilities, ProviderName};

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "yes"
    } else {
        "-"
    }
}

fn capability_row(name: ProviderName, caps: Option<&ProviderCapabilities>) -> String {
    match caps {
        Some(caps) => format!(
            "  {:<12} {:<10} {:<8} {:<8} {:<8} {}",
            name,
            flag(caps.supports_streaming),
            flag(caps.supports_tools),
            flag(caps.supports_embeddings),
            flag(caps.supports_vision),
            caps.context_windows.len()
        ),
        None => format!("  {:<12} (not registered)", name),
    }
}

/// Run the providers subcommand.
pub async fn run(gateway: &AiGateway, check: bool) -> anyhow::Result<()> {
    println!();
    println!(
        "  {:<12} {:<10} {:<8} {:<8} {:<8} Models",
        "Provider", "Streaming", "Tools", "Embed", "Vision"
    );
    println!("  {}", "-".repeat(60));
    for name in ProviderName::ALL {
        let caps = gateway.provider_capabilities(name);
        println!("{}", capability_row(name, caps.as_ref()));
    }
    println!();

    if check {
        let results = gateway.test_connections().await;
        if results.is_empty() {
            println!("  (no providers registered)");
        }
        for (name, ok) in results {
            let status = if ok { "✅ reachable" } else { "❌ unreachable" };
            println!("  {:<12} {}", name, status);
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_row() {
        let caps = ProviderCapabilities {
            supports_streaming: true,
            supports_embeddings: true,
            ..ProviderCapabilities::default()
        };
        let row = capability_row(ProviderName::OpenAi, Some(&caps));
        assert!(row.contains("openai"));
        assert!(row.contains("yes"));

        let row = capability_row(ProviderName::Anthropic, None);
        assert!(row.contains("not registered"));
    }
}
