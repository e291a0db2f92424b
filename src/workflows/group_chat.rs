//! Round-robin group chat: sprint planning debate

use super::{require_agents, speak, Agent, Message, WorkflowError};
use crate::llm::ChatClient;

pub const DEFAULT_PROMPT: &str = "Let's plan Sprint 43 for Project Alpha. \
    We have 6 candidate backlog items (A through F) and need to agree on what to commit. \
    Remember Sarah starts parental leave mid-sprint, so effective capacity is ~32 pts. \
    Please debate and agree on the final sprint backlog.";

const SPRINT_CONTEXT: &str = "\
SPRINT 43 PLANNING CONTEXT:

Team capacity: 40 story points (5 engineers x 8 pts/week x 2 weeks, at 80% efficiency)
Sprint duration: Feb 24 - Mar 7, 2026

CANDIDATE BACKLOG ITEMS:
  A. REPORT-77: Advanced analytics module (13 pts)
     - Blocked last sprint by data warehouse migration (now resolved)
     - High business value: enables executive dashboards
     - Tech complexity: requires new data pipeline architecture
  B. MOBILE-33: iOS push notifications (8 pts)
     - Dependency on NOTIF-88 (completed last sprint)
     - Medium business value; low complexity APNs integration
  C. PERF-91: API response time optimisation (5 pts)
     - Medium business value; needs profiling and a caching layer
  D. SEC-14: OAuth 2.0 token refresh hardening (3 pts)
     - High business value: security compliance requirement; low complexity
  E. UX-67: Onboarding flow A/B test instrumentation (8 pts)
     - Medium business value; needs an analytics event schema
  F. INFRA-19: Kubernetes autoscaling configuration (5 pts)
     - Low business value (internal cost saving); needs load testing

NOTE: Sarah (senior engineer) starts parental leave Mar 1, mid-sprint.
Effective capacity this sprint: ~32 pts (not 40).
";

fn participant(name: &str, role: &str, focus: &str, closing: &str) -> Agent {
    Agent::new(
        name,
        format!(
            "You are the {role} in a sprint planning session for Project Alpha.\n\n\
             {focus}\n\nSprint context:\n{SPRINT_CONTEXT}\n{closing}\n\n\
             Keep your responses concise (3-5 bullet points or a short paragraph)."
        ),
    )
}

/// Agents take turns in a fixed order; each round every agent speaks once
#[derive(Debug, Clone)]
pub struct GroupChatWorkflow {
    agents: Vec<Agent>,
    max_rounds: usize,
}

impl GroupChatWorkflow {
    pub fn new(agents: Vec<Agent>, max_rounds: usize) -> Result<Self, WorkflowError> {
        require_agents(&agents)?;
        Ok(Self {
            agents,
            max_rounds: max_rounds.max(1),
        })
    }

    /// product owner -> tech lead -> scrum master
    pub fn sprint_planning(max_rounds: usize) -> Self {
        let agents = vec![
            participant(
                "product_owner_agent",
                "Product Owner",
                "Advocate for business value and user impact: compliance needs, \
                 unblocking high-value work, growth and engagement.",
                "Debate with the Tech Lead and Scrum Master. Respond constructively to \
                 technical concerns and give your top priority list when the Scrum Master \
                 calls for a decision.",
            ),
            participant(
                "tech_lead_agent",
                "Tech Lead",
                "Assess technical complexity, dependencies and risk. Flag work that needs \
                 architectural decisions before coding.",
                "Debate with the Product Owner and Scrum Master. Challenge unrealistic \
                 estimates and propose sequencing that reduces risk.",
            ),
            participant(
                "scrum_master_agent",
                "Scrum Master",
                "Facilitate the discussion, protect team capacity (especially Sarah's leave) \
                 and drive consensus.",
                "After each round, summarise agreement and open disagreements. After 2 rounds \
                 call for a final decision. Your final message should be the AGREED SPRINT \
                 BACKLOG with total points and rationale.",
            ),
        ];
        Self {
            agents,
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Returns the whole transcript, opening prompt first
    pub async fn run<C>(&self, client: &C, prompt: &str) -> Result<Vec<Message>, WorkflowError>
    where
        C: ChatClient + ?Sized,
    {
        let mut transcript = vec![Message::user(prompt)];
        for round in 1..=self.max_rounds {
            tracing::debug!(round, "Group chat round");
            for agent in &self.agents {
                let reply = speak(client, agent, &transcript).await?;
                transcript.push(reply);
            }
        }
        Ok(transcript)
    }
}
