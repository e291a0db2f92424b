//! Sequential pipeline: sprint report

use super::{require_agents, speak, Agent, Message, WorkflowError};
use crate::llm::ChatClient;

pub const DEFAULT_PROMPT: &str = "Generate a sprint report for Sprint 42 of Project Alpha.";

const SPRINT_DATA: &str = "\
MOCK SPRINT DATABASE (use this as your data source):

Sprint 42 - Project Alpha
- Duration: Feb 3 - Feb 14, 2026 (2 weeks)
- Team: 5 engineers, 1 designer
- Committed story points: 42
- Completed story points: 36

Stories completed:
  - AUTH-101: Implement SSO login (8 pts)
  - DASH-204: Dashboard performance optimisation (5 pts)
  - API-310: Rate limiting middleware (8 pts)
  - NOTIF-88: Email notification service (5 pts)
  - UX-55: Redesign onboarding flow (8 pts)
  - INFRA-12: Upgrade CI/CD pipeline (2 pts)

Stories NOT completed (carried over):
  - REPORT-77: Advanced analytics module (13 pts), blocked by data warehouse migration
  - MOBILE-33: iOS push notifications (8 pts), dependency on NOTIF-88 (now unblocked)

Blockers this sprint:
  - Data warehouse migration delayed by 1 week (external team dependency)
  - 2 sick days (engineer) reduced capacity mid-sprint

Velocity trend (last 4 sprints): 38, 41, 39, 36 pts
";

/// Agents run in order; each sees everything said before it
#[derive(Debug, Clone)]
pub struct SequentialWorkflow {
    agents: Vec<Agent>,
}

impl SequentialWorkflow {
    pub fn new(agents: Vec<Agent>) -> Result<Self, WorkflowError> {
        require_agents(&agents)?;
        Ok(Self { agents })
    }

    /// data collector -> analyst -> writer
    pub fn sprint_report() -> Self {
        Self {
            agents: vec![
                Agent::new(
                    "data_collector_agent",
                    format!(
                        "You are a Sprint Data Collector agent for a PM Copilot system.\n\n\
                         Retrieve and present raw sprint data for the requested sprint, using \
                         the mock sprint database below as your data source.\n\n{SPRINT_DATA}\n\
                         Present ALL raw data for that sprint exactly as it appears. Do not \
                         analyse or interpret. Format as sections: Team, Stories Completed, \
                         Stories Carried Over, Blockers, Velocity."
                    ),
                ),
                Agent::new(
                    "analyst_agent",
                    "You are a Sprint Analyst agent for a PM Copilot system.\n\n\
                     You receive raw sprint data collected by the Data Collector agent in the \
                     conversation above. Analyse it; do not restate it.\n\n\
                     Sections: Completion Rate, Velocity Trend, Blocker Impact, Carry-Over Risk, \
                     Team Health Signal. Be concise and data-driven, bullet points within each \
                     section.",
                ),
                Agent::new(
                    "writer_agent",
                    "You are a Sprint Report Writer agent for a PM Copilot system.\n\n\
                     Using the raw data and the analyst's analysis above, write a polished, \
                     executive-ready sprint report in markdown:\n\
                     # Sprint [N] Executive Report - [Project Name]\n\
                     ## Summary\n## Highlights\n## Challenges & Blockers\n\
                     ## Carry-Over Items\n## Velocity & Forecast\n## Recommended Actions\n\n\
                     Tone: professional, positive but honest. Avoid jargon.",
                ),
            ],
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Returns the whole transcript, opening prompt first
    pub async fn run<C>(&self, client: &C, prompt: &str) -> Result<Vec<Message>, WorkflowError>
    where
        C: ChatClient + ?Sized,
    {
        let mut transcript = vec![Message::user(prompt)];
        for agent in &self.agents {
            let reply = speak(client, agent, &transcript).await?;
            transcript.push(reply);
        }
        tracing::info!(messages = transcript.len(), "Sequential pipeline complete");
        Ok(transcript)
    }
}
