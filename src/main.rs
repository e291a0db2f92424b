//! PM Copilot - AI project manager assistant
//!
//! Runs the interactive hand-off assistant by default; the other commands run
//! one-shot orchestration demos against the same chat client.

use clap::{Parser, Subcommand};
use pm_copilot::console::{Console, ConsoleOutcome};
use pm_copilot::llm::{LoggingClient, OpenAiClient};
use pm_copilot::tools::{MockDirectory, ToolRegistry};
use pm_copilot::workflows::{
    concurrent, group_chat, handoff, sequential, ConcurrentWorkflow, GroupChatWorkflow,
    SequentialWorkflow,
};
use pm_copilot::{Session, Settings};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// PM Copilot - multi-agent project management assistant
#[derive(Parser, Debug)]
#[command(name = "pm-copilot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat model (overrides OPENAI_CHAT_MODEL_ID)
    #[arg(long, short = 'm', global = true)]
    model: Option<String>,

    /// Consecutive participant steps allowed per user input
    #[arg(long, global = true)]
    max_steps: Option<usize>,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive PM assistant (default)
    Console,
    /// Sprint report pipeline: data collector, analyst, writer
    Sequential { prompt: Option<String> },
    /// Project health check fanned out to four analysts
    Concurrent { prompt: Option<String> },
    /// Sprint planning debate between product owner, tech lead and scrum master
    GroupChat {
        prompt: Option<String>,
        /// Rounds of debate; every agent speaks once per round
        #[arg(long)]
        rounds: Option<usize>,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "pm_copilot=info".into());
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(io::stderr)
    });
    let compact_layer = (!json).then(|| fmt::layer().compact().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(compact_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut settings = Settings::from_env();
    if let Some(model) = args.model {
        settings.model = model;
    }
    if let Some(max_steps) = args.max_steps {
        settings.max_steps = max_steps;
    }

    init_logging(settings.log_json);

    let api_key = settings
        .openai_api_key
        .clone()
        .ok_or("OPENAI_API_KEY is not set (environment or .env)")?;
    let openai = OpenAiClient::new(
        api_key,
        settings.model.clone(),
        settings.openai_base_url.as_deref(),
    )?;
    let client = LoggingClient::new(Arc::new(openai));
    tracing::info!(model = %settings.model, "Chat client ready");

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout().lock());
    if args.no_color {
        console = console.plain();
    }

    match args.command.unwrap_or(Command::Console) {
        Command::Console => {
            let tools = ToolRegistry::pm_assistant(Arc::new(MockDirectory::new()));
            let registry = Arc::new(handoff::pm_assistant(&tools)?);
            let mut session = Session::new(registry, client, tools, settings.session_config());
            tracing::info!(session_id = %session.id(), "Session started");

            if let ConsoleOutcome::Failed(kind) = console.run_assistant(&mut session).await? {
                tracing::error!(kind, "Assistant stopped on an error");
            }
        }
        Command::Sequential { prompt } => {
            let prompt = prompt.as_deref().unwrap_or(sequential::DEFAULT_PROMPT);
            let transcript = SequentialWorkflow::sprint_report()
                .run(&client, prompt)
                .await?;
            console.show_transcript("SPRINT REPORT PIPELINE", &transcript)?;
        }
        Command::Concurrent { prompt } => {
            let prompt = prompt.as_deref().unwrap_or(concurrent::DEFAULT_PROMPT);
            let dashboard = ConcurrentWorkflow::health_check()
                .run(&client, prompt)
                .await?;
            console.show_dashboard(&dashboard)?;
            tracing::debug!(dashboard = %dashboard.to_json(), "Health check aggregated");
        }
        Command::GroupChat { prompt, rounds } => {
            let prompt = prompt.as_deref().unwrap_or(group_chat::DEFAULT_PROMPT);
            let rounds = rounds.unwrap_or(settings.group_chat_rounds);
            let transcript = GroupChatWorkflow::sprint_planning(rounds)
                .run(&client, prompt)
                .await?;
            console.show_transcript("SPRINT PLANNING DEBATE", &transcript)?;
        }
    }

    Ok(())
}
