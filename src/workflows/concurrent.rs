//! Concurrent fan-out: project health check

use super::{require_agents, speak, Agent, Message, WorkflowError};
use crate::conversation::Role;
use crate::llm::ChatClient;
use futures::future::join_all;
use serde_json::{Map, Value};

pub const DEFAULT_PROMPT: &str = "Perform a full health check for Project Alpha as of today.";

/// Placeholder for an agent that produced no text
pub const NO_RESPONSE: &str = "(no response)";

const PROJECT_DATA: &str = "\
PROJECT ALPHA - Status as of Feb 17, 2026

BUDGET:
  - Total budget: $480,000
  - Spent to date: $312,000 (65% of budget)
  - Timeline elapsed: 58% of project duration
  - Budget burn rate: $52,000/month (planned: $48,000/month)
  - Forecast at current rate: $468,000 (within budget, but trending high)
  - Last month overspend: $8,000 (cloud infrastructure costs)

TIMELINE / MILESTONES:
  - Project start: Sep 1, 2025; planned end: Apr 30, 2026
  - Milestone 1 (MVP): Completed Oct 15, 2025 (on time)
  - Milestone 2 (Beta): Completed Jan 10, 2026 (3 days late)
  - Milestone 3 (GA Release): Planned Mar 31, 2026, AT RISK
  - Milestone 4 (Post-launch support): Apr 30, 2026, TBD
  - Current sprint velocity: 36 pts (planned: 42 pts)

RISKS & BLOCKERS:
  - RISK-01 (HIGH): Data warehouse migration delayed, blocks analytics module (REPORT-77)
  - RISK-02 (MEDIUM): iOS push notification dependency on NOTIF-88, now unblocked
  - RISK-03 (MEDIUM): Key engineer (Sarah) on parental leave from Mar 1 for 6 weeks
  - RISK-04 (LOW): Third-party payment API deprecation, migration needed by Q3

TEAM:
  - Team size: 5 engineers, 1 designer, 1 PM
  - Current capacity: 85% (1 engineer part-time due to illness recovery)
  - Planned capacity Mar-Apr: 71% (4.5 FTE engineers)
  - Morale signal: 2 engineers flagged workload concerns in last retrospective
  - Hiring: 1 junior engineer onboarding Feb 24 (ramp-up: 3-4 weeks)
";

fn analyst(name: &str, dimension: &str, checklist: &str, verdict: &str) -> Agent {
    Agent::new(
        name,
        format!(
            "You are a {dimension} Analyst for a PM Copilot system.\n\n\
             Analyse ONLY the {dimension} of the project. Use the project data below.\n\n\
             {PROJECT_DATA}\n\
             Produce a concise assessment covering:\n{checklist}\n\
             - Overall: {verdict}\n\n\
             Be concise: 5-8 bullet points maximum."
        ),
    )
}

/// One agent's section of the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardEntry {
    pub agent: String,
    pub report: String,
}

/// Aggregated answers, in agent order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub entries: Vec<DashboardEntry>,
}

impl Dashboard {
    /// Fold each agent's transcript into its newest non-empty assistant text
    pub fn aggregate(results: &[(String, Vec<Message>)]) -> Self {
        let entries = results
            .iter()
            .map(|(agent, messages)| DashboardEntry {
                agent: agent.clone(),
                report: messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::Assistant && !m.text.trim().is_empty())
                    .map_or_else(|| NO_RESPONSE.to_string(), |m| m.text.clone()),
            })
            .collect();
        Self { entries }
    }

    /// JSON object keyed by agent name
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|e| (e.agent.clone(), Value::String(e.report.clone())))
            .collect();
        Value::Object(map)
    }
}

/// Every agent answers the same prompt independently
#[derive(Debug, Clone)]
pub struct ConcurrentWorkflow {
    agents: Vec<Agent>,
}

impl ConcurrentWorkflow {
    pub fn new(agents: Vec<Agent>) -> Result<Self, WorkflowError> {
        require_agents(&agents)?;
        Ok(Self { agents })
    }

    /// budget | timeline | risk | team
    pub fn health_check() -> Self {
        Self {
            agents: vec![
                analyst(
                    "budget_agent",
                    "Budget Health",
                    "- Current spend vs. plan (% and absolute)\n\
                     - Burn rate trend\n- Forecast to completion\n- Key budget risk",
                    "HEALTHY / AT RISK / CRITICAL",
                ),
                analyst(
                    "timeline_agent",
                    "Timeline Health",
                    "- Milestones completed vs. planned\n- Sprint velocity vs. plan\n\
                     - Upcoming milestone risk\n- Projected vs. planned completion date",
                    "ON TRACK / AT RISK / DELAYED",
                ),
                analyst(
                    "risk_agent",
                    "Risk & Blocker",
                    "- Active blockers (count, severity, ETA)\n- Top 3 risks by impact\n\
                     - Recently resolved risks\n- Recommended immediate actions",
                    "LOW / MEDIUM / HIGH",
                ),
                analyst(
                    "team_agent",
                    "Team Health",
                    "- Current vs. planned capacity\n- Upcoming capacity changes\n\
                     - Morale and workload signals\n- Impact on upcoming milestones",
                    "HEALTHY / STRAINED / CRITICAL",
                ),
            ],
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Fan out, join, aggregate; the first failure in agent order wins
    pub async fn run<C>(&self, client: &C, prompt: &str) -> Result<Dashboard, WorkflowError>
    where
        C: ChatClient + ?Sized,
    {
        let opening = [Message::user(prompt)];
        tracing::info!(agents = self.agents.len(), "Fanning out");

        let replies = join_all(
            self.agents
                .iter()
                .map(|agent| speak(client, agent, &opening)),
        )
        .await;

        let mut results = Vec::with_capacity(replies.len());
        for (agent, reply) in self.agents.iter().zip(replies) {
            results.push((agent.name.clone(), vec![opening[0].clone(), reply?]));
        }
        Ok(Dashboard::aggregate(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::runtime::testing::MockChatClient;

    #[test]
    fn test_aggregate_uses_newest_text_or_placeholder() {
        let results = vec![
            (
                "budget_agent".to_string(),
                vec![
                    Message::user("check"),
                    Message::agent("budget_agent", "draft"),
                    Message::agent("budget_agent", "final"),
                    Message::agent("budget_agent", ""),
                ],
            ),
            ("team_agent".to_string(), vec![Message::user("check")]),
        ];
        let dashboard = Dashboard::aggregate(&results);
        assert_eq!(dashboard.entries[0].report, "final");
        assert_eq!(dashboard.entries[1].report, NO_RESPONSE);
        assert_eq!(
            dashboard.to_json(),
            serde_json::json!({"budget_agent": "final", "team_agent": "(no response)"})
        );
    }

    #[tokio::test]
    async fn test_every_agent_gets_only_the_prompt() {
        let client = MockChatClient::new("test-model");
        for text in ["b", "t", "r", "m"] {
            client.queue_text(text);
        }

        let dashboard = ConcurrentWorkflow::health_check()
            .run(&client, DEFAULT_PROMPT)
            .await
            .unwrap();

        let agents: Vec<_> = dashboard.entries.iter().map(|e| e.agent.as_str()).collect();
        assert_eq!(agents, ["budget_agent", "timeline_agent", "risk_agent", "team_agent"]);
        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| r.messages.len() == 1));
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_run() {
        let client = MockChatClient::new("test-model");
        client.queue_text("b");
        client.queue_error(LlmError::network("reset"));
        client.queue_text("r");
        client.queue_text("m");

        let err = ConcurrentWorkflow::health_check()
            .run(&client, DEFAULT_PROMPT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Upstream");
    }
}
