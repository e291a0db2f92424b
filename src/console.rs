//! Interactive console and demo renderers
//!
//! Reads user lines from any [`BufRead`] and writes coloured output to any
//! [`Write`], so the whole loop runs against in-memory buffers in tests.

use crate::conversation::{Role, Turn};
use crate::llm::ChatClient;
use crate::registry::Registry;
use crate::runtime::{Session, SessionError, ToolHandler, TOOL_RESULT_PREFIX};
use crate::state_machine::{RouterState, UserResponse};
use crate::workflows::{Dashboard, Message};
use crossterm::style::{Color, Stylize};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];
const TOOL_PREVIEW_CHARS: usize = 120;

const BANNER: &str = "\
╔══════════════════════════════════════════════════════════════╗
║   PM Copilot - AI Project Manager Assistant                  ║
║   SharePoint | Meetings | Calendar | Documents | Project Info ║
╚══════════════════════════════════════════════════════════════╝";

/// How an interactive session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutcome {
    /// The user left before the first message
    Declined,
    Finished,
    /// The run stopped on an error of this kind
    Failed(&'static str),
}

/// Per-agent colour
pub fn agent_color(name: &str) -> Color {
    match name {
        "triage_agent" | "data_collector_agent" | "timeline_agent" | "tech_lead_agent" => {
            Color::DarkCyan
        }
        "sharepoint_agent" => Color::DarkBlue,
        "meetings_agent" => Color::DarkMagenta,
        "calendar_agent" | "writer_agent" | "budget_agent" | "product_owner_agent" => {
            Color::DarkGreen
        }
        "documents_agent" | "analyst_agent" | "team_agent" | "scrum_master_agent" => {
            Color::DarkYellow
        }
        "project_info_agent" => Color::Cyan,
        "risk_agent" => Color::DarkRed,
        _ => Color::Reset,
    }
}

/// Display label for demo agents
pub fn agent_label(name: &str) -> &str {
    match name {
        "budget_agent" => "💰 Budget",
        "timeline_agent" => "📅 Timeline",
        "risk_agent" => "⚠️ Risks",
        "team_agent" => "👥 Team",
        "product_owner_agent" => "🎯 Product Owner",
        "tech_lead_agent" => "🔧 Tech Lead",
        "scrum_master_agent" => "🏃 Scrum Master",
        "data_collector_agent" => "📥 Data Collector",
        "analyst_agent" => "📊 Analyst",
        "writer_agent" => "📝 Writer",
        other => other,
    }
}

fn is_quit(input: &str) -> bool {
    QUIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

pub struct Console<R, W> {
    input: R,
    output: W,
    colored: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            colored: true,
        }
    }

    /// Disable ANSI styling
    #[must_use]
    pub fn plain(mut self) -> Self {
        self.colored = false;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        match (self.colored, bold) {
            (false, _) => text.to_string(),
            (true, false) => text.with(color).to_string(),
            (true, true) => text.with(color).bold().to_string(),
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.colored {
            text.dim().to_string()
        } else {
            text.to_string()
        }
    }

    /// `None` on end of input
    fn prompt(&mut self) -> io::Result<Option<String>> {
        let label = self.paint("You: ", Color::White, true);
        write!(self.output, "\n{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn banner(&mut self) -> io::Result<()> {
        let banner = self.paint(BANNER, Color::DarkCyan, true);
        writeln!(self.output, "{banner}")?;
        let hint = self.dim("  Type your request, or 'quit' to exit.");
        writeln!(self.output, "{hint}")
    }

    fn render_turn(&mut self, registry: &Registry, turn: &Turn) -> io::Result<()> {
        if turn.role != Role::Assistant {
            return Ok(());
        }
        let author = turn.author.map_or("assistant", |id| registry.name(id));

        if turn.text.starts_with(TOOL_RESULT_PREFIX) {
            let first_line = turn.text.lines().next().unwrap_or_default();
            let preview: String = first_line.chars().take(TOOL_PREVIEW_CHARS).collect();
            let line = self.dim(&format!("  ⚙ {preview}"));
            writeln!(self.output, "{line}")?;
        } else if !turn.is_blank() {
            let name = self.paint(author, agent_color(author), true);
            writeln!(self.output, "\n{name}: {}", turn.text.trim())?;
        }

        if let Some(handoff) = turn.handoff {
            let line = self.dim(&format!(
                "  ↪ Handoff: {} -> {}",
                registry.name(handoff.source),
                registry.name(handoff.target)
            ));
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }

    fn render_new_turns<C, T>(
        &mut self,
        session: &Session<C, T>,
        rendered: &mut usize,
    ) -> io::Result<()>
    where
        C: ChatClient,
        T: ToolHandler,
    {
        let log = session.current_log();
        for turn in &log[*rendered..] {
            self.render_turn(session.registry(), turn)?;
        }
        *rendered = log.len();
        Ok(())
    }

    fn render_failure<C, T>(
        &mut self,
        session: &Session<C, T>,
        error: &SessionError,
    ) -> io::Result<()>
    where
        C: ChatClient,
        T: ToolHandler,
    {
        let header = self.paint(&format!("Error ({}): ", error.kind()), Color::Red, true);
        writeln!(self.output, "\n{header}{error}")?;

        let last = session
            .current_log()
            .iter()
            .rev()
            .find(|t| {
                t.role == Role::Assistant
                    && !t.is_blank()
                    && !t.text.starts_with(TOOL_RESULT_PREFIX)
            });
        if let Some(turn) = last {
            let author = turn.author.map_or("assistant", |id| session.registry().name(id));
            let line = self.dim(&format!("  Last reply from {author}: {}", turn.text.trim()));
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }

    /// Run the interactive assistant until the user leaves or the router stops
    pub async fn run_assistant<C, T>(
        &mut self,
        session: &mut Session<C, T>,
    ) -> io::Result<ConsoleOutcome>
    where
        C: ChatClient,
        T: ToolHandler,
    {
        self.banner()?;

        let first = match self.prompt()? {
            Some(input) if !input.is_empty() && !is_quit(&input) => input,
            _ => {
                writeln!(self.output, "Goodbye!")?;
                return Ok(ConsoleOutcome::Declined);
            }
        };

        let mut rendered = 0;
        let mut result = session.start(first).await;

        loop {
            self.render_new_turns(session, &mut rendered)?;
            match result {
                Err(error) => {
                    tracing::warn!(kind = error.kind(), error = %error, "Session stopped");
                    self.render_failure(session, &error)?;
                    return Ok(ConsoleOutcome::Failed(error.kind()));
                }
                Ok(RouterState::Suspended { pending }) => {
                    let responses = loop {
                        match self.prompt()? {
                            None => break None,
                            Some(input) if is_quit(&input) => break None,
                            Some(input) if input.is_empty() => {}
                            Some(input) => break Some(input),
                        }
                    };

                    let responses: HashMap<_, _> = pending
                        .into_iter()
                        .map(|request| {
                            let response = responses
                                .as_ref()
                                .map_or(UserResponse::Terminate, UserResponse::reply);
                            (request.id, response)
                        })
                        .collect();
                    result = session.resume(responses).await;
                }
                Ok(_) => break,
            }
        }

        let farewell = self.paint("Conversation ended. Goodbye!", Color::DarkCyan, true);
        writeln!(self.output, "\n{farewell}")?;
        Ok(ConsoleOutcome::Finished)
    }

    /// Print a demo transcript, skipping the opening prompt and blank messages
    pub fn show_transcript(&mut self, title: &str, transcript: &[Message]) -> io::Result<()> {
        let heading = self.paint(title, Color::DarkCyan, true);
        writeln!(self.output, "\n{heading}")?;

        for message in transcript {
            let Some(author) = message.author.as_deref() else {
                continue;
            };
            if message.text.trim().is_empty() {
                continue;
            }
            let label = self.paint(agent_label(author), agent_color(author), true);
            writeln!(self.output, "\n{label}\n{}", message.text.trim())?;
        }
        Ok(())
    }

    pub fn show_dashboard(&mut self, dashboard: &Dashboard) -> io::Result<()> {
        let heading = self.paint("PROJECT HEALTH DASHBOARD", Color::DarkCyan, true);
        writeln!(self.output, "\n{heading}")?;

        for entry in &dashboard.entries {
            let label = self.paint(agent_label(&entry.agent), agent_color(&entry.agent), true);
            let rule = self.dim(&"─".repeat(60));
            writeln!(self.output, "\n{label}\n{rule}\n{}", entry.report.trim())?;
        }
        Ok(())
    }
}
