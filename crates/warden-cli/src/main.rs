//! mcp-warden CLI - scan text the way a shielded tool result would be scanned

use std::io::Read;

use clap::Parser;
use serde_json::{json, Value};

use warden_core::{tool_fn, ToolOp, ToolResult, Warden, WardenConfig};
use warden_sanitize::{PatternCatalog, RuleCategory};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "mcp-warden - Trust envelopes and sanitization for MCP tool results")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Scan text through the full protection stack and print the envelope
    Scan {
        /// Text to scan; reads stdin when omitted
        text: Option<String>,
        /// Replace detected encodings instead of only warning
        #[arg(long)]
        filter_encodings: bool,
    },
    /// List the detection pattern catalog
    Patterns,
    /// Check configuration validity
    Check {
        /// Configuration file path (JSON)
        #[arg(short, long, default_value = "config/warden.json")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scan {
            text,
            filter_encodings,
        }) => {
            let input = match text {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            let mut config = WardenConfig::default();
            config.sanitizer.filter_encodings = filter_encodings;
            let warden = Warden::new(config)?;

            // Route through the standard stack, exactly as a hosted tool would be.
            let source = tool_fn(move |_: Value| {
                let input = input.clone();
                async move { ToolResult::Raw(Value::String(input)) }
            });
            let shielded = warden.shield("cli.scan", source);
            let envelope = shielded.call(&json!({})).await.into_envelope();

            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Some(Commands::Patterns) => {
            let catalog = PatternCatalog::shared();
            for category in [
                RuleCategory::Injection,
                RuleCategory::Jailbreak,
                RuleCategory::Encoding,
            ] {
                println!("{}:", category.label());
                for rule in catalog.rules(category) {
                    println!("  - {}", rule.description);
                }
            }
        }
        Some(Commands::Check { config }) => {
            let raw = std::fs::read_to_string(&config)?;
            let parsed: WardenConfig = serde_json::from_str(&raw)?;
            Warden::new(parsed)?;
            println!("Config OK: {}", config);
        }
        None => {
            println!("mcp-warden v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
