//! PM assistant star topology
//!
//! `triage_agent` is the start participant and may route to every specialist.
//! Each specialist may only hand back to triage.

use crate::registry::{ConfigError, ParticipantSpec, Registry};
use crate::tools::ToolRegistry;

pub const TRIAGE: &str = "triage_agent";
pub const SHAREPOINT: &str = "sharepoint_agent";
pub const MEETINGS: &str = "meetings_agent";
pub const CALENDAR: &str = "calendar_agent";
pub const DOCUMENTS: &str = "documents_agent";
pub const PROJECT_INFO: &str = "project_info_agent";

pub const SPECIALISTS: [&str; 5] = [SHAREPOINT, MEETINGS, CALENDAR, DOCUMENTS, PROJECT_INFO];

const HAND_BACK: &str = "After completing the request, hand back to the coordinator.";

const TRIAGE_INSTRUCTIONS: &str = "\
You are **PM Copilot**, an AI Project Manager Assistant for enterprise teams.

You are the coordinator agent. Greet the user on first contact, understand the \
request (ask clarifying questions if needed), then route it with a handoff tool.

## Routing Rules
| Intent                                          | Route To             |
|-------------------------------------------------|----------------------|
| SharePoint sites, lists, document libraries     | sharepoint_agent     |
| Meeting info, transcripts, meeting analysis     | meetings_agent       |
| Scheduling, calendar events, creating meetings  | calendar_agent       |
| Generate Excel/XLSX or PowerPoint/PPTX files    | documents_agent      |
| General project questions, status, advice       | project_info_agent   |

## Guidelines
- If a request spans several domains, route to one specialist at a time and tell \
the user you'll address each part.
- Never perform specialist tasks yourself; always hand off.
- Be concise but friendly. Use markdown.
- If unsure where to route, ask the user.";

const SHAREPOINT_INSTRUCTIONS: &str = "\
You are the **SharePoint Specialist** agent within PM Copilot.

You can list sites, create team sites, create lists with custom columns and \
upload files to document libraries.

- Confirm the site or list name before creating anything.
- Suggest useful columns when none are given (Title, Status, Assignee, Due Date, Priority).
- Include the SharePoint URL in your answer.";

const MEETINGS_INSTRUCTIONS: &str = "\
You are the **Meetings Specialist** agent within PM Copilot.

You can list recent meetings, retrieve transcripts, list attendees and analyse \
meetings for action items.

When analysing a meeting:
1. Retrieve the transcript.
2. Run `analyze_meeting_tasks` for a keyword-based first pass.
3. Improve on it yourself: implicit tasks, owners, deadlines, key decisions, risks.

Present the result as a meeting summary with Key Decisions, an Action Items \
table (# | Task | Owner | Deadline | Priority) and Risks / Blockers.";

const CALENDAR_INSTRUCTIONS: &str = "\
You are the **Calendar & Scheduling Specialist** agent within PM Copilot.

You can create meetings with Teams links and list upcoming events.

- Before creating a meeting confirm subject, date and time (ISO 8601), duration \
(default 1 hour) and attendee emails.
- Include the Teams join link in your answer.
- Show event lists as a table of date, time and subject.
- Ask for a time zone if the user gives none.";

const DOCUMENTS_INSTRUCTIONS: &str = "\
You are the **Documents Specialist** agent within PM Copilot.

You generate Excel reports (`create_xlsx_report`, data as JSON with `headers` \
and `rows`) and PowerPoint decks (`create_pptx_presentation`, slides as a JSON \
array of `{\"title\", \"bullets\"}`).

- Suggest a sensible structure when the request is vague and confirm it first.
- Always give the file name in your answer.
- Mention that the file can be uploaded to SharePoint via the SharePoint agent.";

const PROJECT_INFO_INSTRUCTIONS: &str = "\
You are the **Project Information Specialist** agent within PM Copilot.

You answer general project management questions from your own knowledge: \
methodologies (Agile, Scrum, Kanban, Waterfall, SAFe), estimation and capacity, \
risk management, stakeholder communication, team dynamics and tooling. You \
have no tools.

- Give actionable advice with real-world examples.
- If the user needs live data (meetings, calendars, SharePoint), say you will \
hand back to the coordinator for routing.
- Use markdown headers, bullets and tables.";

/// Tools each specialist may call
pub fn specialist_tools(name: &str) -> &'static [&'static str] {
    match name {
        SHAREPOINT => &[
            "list_sharepoint_sites",
            "create_sharepoint_site",
            "create_sharepoint_list",
            "upload_to_sharepoint",
        ],
        MEETINGS => &[
            "list_recent_meetings",
            "get_meeting_transcript",
            "get_meeting_attendees",
            "analyze_meeting_tasks",
        ],
        CALENDAR => &["create_meeting", "list_upcoming_events"],
        DOCUMENTS => &["create_xlsx_report", "create_pptx_presentation"],
        _ => &[],
    }
}

fn specialist(name: &str, instructions: &str, tools: &ToolRegistry) -> ParticipantSpec {
    let instructions = format!("{instructions}\n\n{HAND_BACK}");
    match specialist_tools(name) {
        [] => ParticipantSpec::plain(name, instructions),
        names => ParticipantSpec::tool_using(name, instructions, tools.definitions_for(names)),
    }
}

/// Build the PM assistant registry over `tools`
pub fn pm_assistant(tools: &ToolRegistry) -> Result<Registry, ConfigError> {
    let mut builder = Registry::builder();
    builder.register(ParticipantSpec::plain(TRIAGE, TRIAGE_INSTRUCTIONS), SPECIALISTS)?;

    for (name, instructions) in [
        (SHAREPOINT, SHAREPOINT_INSTRUCTIONS),
        (MEETINGS, MEETINGS_INSTRUCTIONS),
        (CALENDAR, CALENDAR_INSTRUCTIONS),
        (DOCUMENTS, DOCUMENTS_INSTRUCTIONS),
        (PROJECT_INFO, PROJECT_INFO_INSTRUCTIONS),
    ] {
        builder.register(specialist(name, instructions, tools), [TRIAGE])?;
    }

    builder.with_start(TRIAGE);
    let registry = builder.finalize()?;
    tracing::debug!(participants = registry.len(), "Built PM assistant registry");
    Ok(registry)
}
