//! agent-assist CLI binary entry point.

use std::sync::Arc;

use agent_assist::cli::{AskArgs, Cli, Commands, CompleteArgs};
use agent_assist::completion::CompletionService;
use agent_assist::config::AssistConfig;
use agent_assist::job::{Handoff, JobBridge};
use agent_assist::protocol::{ProtocolEngine, RunStatus};
use agent_assist::provider::Provider;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask(args) => handle_ask(args).await,
        Commands::Complete(args) => handle_complete(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_complete(args: CompleteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let provider = Provider::parse(&args.provider)?;
    let service = CompletionService::new(AssistConfig::from_env());
    let reply = service.complete(provider, &args.prompt).await?;
    println!("{reply}");
    Ok(())
}

async fn handle_ask(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let provider = Provider::parse(&args.provider)?;
    let ctx = args.load_context()?;

    let engine = Arc::new(ProtocolEngine::with_config(AssistConfig::from_env()));
    let (bridge, mut ui) = JobBridge::from_current(engine)?;

    let surface = ui.open_surface();
    surface.provider = provider;
    surface.toggles = args.toggles();
    surface.tools_enabled = !args.no_tools;

    let job_id = ui.ask(&bridge, &args.prompt, &ctx)?;
    drop(bridge);

    match ui.next().await {
        Some(Handoff::Applied(applied)) if applied == job_id => {}
        _ => return Err("assistant job ended without a result".into()),
    }

    let Some(surface) = ui.surface() else {
        return Err("assistant surface closed".into());
    };
    let reply = surface.reply().unwrap_or_default();
    let status = surface.last_status().unwrap_or(RunStatus::Failed);

    if args.json {
        let output = serde_json::json!({
            "status": status,
            "reply": reply,
            "insert_text": surface.insertable_text(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if status == RunStatus::Completed {
        println!("{reply}");
    }

    if status == RunStatus::Failed {
        return Err(reply.into());
    }
    Ok(())
}
