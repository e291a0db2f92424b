//! In-memory directory and calendar service
//!
//! Returns realistic stub data for sites, meetings and events so the assistant
//! can run end-to-end without a live directory. Records created through the
//! tools are kept for the lifetime of the value.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Mutex, PoisonError};

const TENANT_URL: &str = "https://contoso.sharepoint.com/sites";
const JOIN_URL: &str = "https://teams.microsoft.com/l/meetup-join";
const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub web_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub subject: String,
    pub start_date_time: String,
    pub end_date_time: String,
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub subject: String,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_meeting: Option<Value>,
    #[serde(skip)]
    starts_at: NaiveDateTime,
}

#[derive(Debug, Default)]
struct Created {
    sites: Vec<Site>,
    events: Vec<CalendarEvent>,
}

/// Mock directory/calendar backend shared by the PM tools
#[derive(Debug, Default)]
pub struct MockDirectory {
    created: Mutex<Created>,
    /// Fixed clock for deterministic output
    now: Option<DateTime<Utc>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn created(&self) -> std::sync::MutexGuard<'_, Created> {
        // Every update is a single push, so a poisoned lock still holds valid data
        self.created.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Sites ────────────────────────────────────────────────────────

    pub fn list_sites(&self) -> Vec<Site> {
        let mut sites = vec![
            seeded_site("site-001", "Project Alpha", "ProjectAlpha"),
            seeded_site("site-002", "Engineering Hub", "EngineeringHub"),
            seeded_site("site-003", "HR Resources", "HRResources"),
        ];
        sites.extend(self.created().sites.iter().cloned());
        sites
    }

    pub fn create_site(&self, name: &str, description: &str) -> Site {
        let site = Site {
            id: format!("mock-site-{}", name.to_lowercase().replace(' ', "-")),
            display_name: name.to_string(),
            description: Some(description.to_string()),
            web_url: format!("{TENANT_URL}/{}", name.replace(' ', "")),
        };
        self.created().sites.push(site.clone());
        site
    }

    #[allow(clippy::unused_self)] // Stateless stub
    pub fn create_list(&self, site_id: &str, list_name: &str, columns: &[String]) -> Value {
        json!({
            "id": format!("mock-list-{}", list_name.to_lowercase().replace(' ', "-")),
            "displayName": list_name,
            "siteId": site_id,
            "columns": columns,
        })
    }

    #[allow(clippy::unused_self)] // Stateless stub
    pub fn upload_file(&self, site_id: &str, folder: &str, file_name: &str) -> Value {
        json!({
            "id": format!("mock-file-{file_name}"),
            "name": file_name,
            "webUrl": format!("{TENANT_URL}/{site_id}/{folder}/{file_name}"),
            "size": 1024,
        })
    }

    // ── Meetings ─────────────────────────────────────────────────────

    #[allow(clippy::unused_self)] // Stateless stub
    pub fn list_meetings(&self) -> Vec<Meeting> {
        vec![
            meeting(
                "meet-001",
                "Sprint Planning",
                ("2026-02-14T10:00:00Z", "2026-02-14T11:00:00Z"),
            ),
            meeting(
                "meet-002",
                "Design Review",
                ("2026-02-13T14:00:00Z", "2026-02-13T15:00:00Z"),
            ),
            meeting(
                "meet-003",
                "Daily Standup",
                ("2026-02-14T09:00:00Z", "2026-02-14T09:15:00Z"),
            ),
        ]
    }

    #[allow(clippy::unused_self)] // Stateless stub
    pub fn transcript(&self, meeting_id: &str) -> Option<&'static str> {
        match meeting_id {
            "meet-001" => Some(
                "Alice: Let's go over the sprint backlog. We have 12 stories remaining.\n\
                 Bob: I can take the authentication refactor, estimated at 5 points.\n\
                 Charlie: I'll handle the dashboard redesign. Should be about 8 points.\n\
                 Alice: Great. Bob, can you also review the API documentation by Thursday?\n\
                 Bob: Sure, I'll add that to my list.\n\
                 Alice: Charlie, please set up the staging environment by Wednesday.\n\
                 Charlie: Will do. I'll need access credentials from DevOps.\n\
                 Alice: I'll send those over today. Let's reconvene on Friday for the demo.",
            ),
            "meet-002" => Some(
                "Alice: Let's review the new design mockups for the onboarding flow.\n\
                 Diana: I've updated the wireframes based on last week's feedback.\n\
                 Alice: The color scheme looks much better. Can we add a progress indicator?\n\
                 Diana: Absolutely. I'll have the updated designs by Monday.\n\
                 Alice: Also, we need to align the iconography with the brand guidelines.\n\
                 Diana: I'll coordinate with the brand team on that.",
            ),
            "meet-003" => Some(
                "Alice: Good morning everyone. Quick updates, what did you work on yesterday?\n\
                 Bob: Finished the login endpoint and started on the password reset flow.\n\
                 Charlie: Completed the responsive layout for the dashboard.\n\
                 Diana: Finished the user research interviews, compiling the findings today.\n\
                 Alice: Any blockers?\n\
                 Bob: I need the SMTP config for the password reset emails.\n\
                 Alice: I'll get that to you by noon. Anything else? Great, let's go.",
            ),
            _ => None,
        }
    }

    pub fn attendees(&self, meeting_id: &str) -> Vec<String> {
        self.list_meetings()
            .into_iter()
            .find(|m| m.id == meeting_id)
            .map(|m| m.attendees)
            .unwrap_or_default()
    }

    // ── Calendar ─────────────────────────────────────────────────────

    /// Events starting between now and `days_ahead` days from now, earliest first
    ///
    /// Seeded events sit one and two days after the clock so they are always upcoming.
    pub fn list_events(&self, days_ahead: u32) -> Vec<CalendarEvent> {
        let now = self.now().naive_utc();
        let until = now + TimeDelta::days(i64::from(days_ahead));

        let mut events = seeded_events(now);
        events.extend(self.created().events.iter().cloned());
        events.retain(|e| e.starts_at >= now && e.starts_at <= until);
        events.sort_by_key(|e| e.starts_at);
        events
    }

    /// Times are UTC
    pub fn create_event(
        &self,
        subject: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        attendees: Vec<String>,
    ) -> CalendarEvent {
        let mut created = self.created();
        let id = format!("evt-new-{:03}", created.events.len() + 1);
        let mut event = calendar_event(&id, subject, (start, end), attendees);
        event.online_meeting = Some(json!({ "joinUrl": format!("{JOIN_URL}/{id}") }));
        created.events.push(event.clone());
        event
    }

    // ── Documents ────────────────────────────────────────────────────

    /// Reserve a file name for a generated document
    pub fn document_name(&self, prefix: &str, extension: &str) -> String {
        format!(
            "{prefix}_{}.{extension}",
            self.now().format("%Y%m%d_%H%M%S")
        )
    }
}

fn seeded_site(id: &str, name: &str, path: &str) -> Site {
    Site {
        id: id.to_string(),
        display_name: name.to_string(),
        description: None,
        web_url: format!("{TENANT_URL}/{path}"),
    }
}

fn meeting(id: &str, subject: &str, (start, end): (&str, &str)) -> Meeting {
    let attendees: &[&str] = match id {
        "meet-001" => &["alice@contoso.com", "bob@contoso.com", "charlie@contoso.com"],
        "meet-002" => &["alice@contoso.com", "diana@contoso.com"],
        _ => &[
            "alice@contoso.com",
            "bob@contoso.com",
            "charlie@contoso.com",
            "diana@contoso.com",
        ],
    };
    Meeting {
        id: id.to_string(),
        subject: subject.to_string(),
        start_date_time: start.to_string(),
        end_date_time: end.to_string(),
        attendees: attendees.iter().map(|a| (*a).to_string()).collect(),
    }
}

fn seeded_events(now: NaiveDateTime) -> Vec<CalendarEvent> {
    let seeds: [(&str, &str, i64, u32, &[&str]); 2] = [
        (
            "evt-001",
            "Sprint Retrospective",
            1,
            15,
            &["alice@contoso.com", "bob@contoso.com"],
        ),
        (
            "evt-002",
            "Stakeholder Demo",
            2,
            10,
            &["alice@contoso.com", "charlie@contoso.com", "cto@contoso.com"],
        ),
    ];
    seeds
        .into_iter()
        .filter_map(|(id, subject, days, hour, attendees)| {
            let start = (now.date() + TimeDelta::days(days)).and_hms_opt(hour, 0, 0)?;
            let attendees = attendees.iter().map(|a| (*a).to_string()).collect();
            Some(calendar_event(id, subject, (start, start + TimeDelta::hours(1)), attendees))
        })
        .collect()
}

fn calendar_event(
    id: &str,
    subject: &str,
    (start, end): (NaiveDateTime, NaiveDateTime),
    attendees: Vec<String>,
) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        subject: subject.to_string(),
        start: utc(start),
        end: utc(end),
        attendees,
        online_meeting: None,
        starts_at: start,
    }
}

fn utc(date_time: NaiveDateTime) -> EventTime {
    EventTime {
        date_time: date_time.format(EVENT_TIME_FORMAT).to_string(),
        time_zone: "UTC".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_seeded_meetings_have_transcripts_and_attendees() {
        let dir = MockDirectory::new();
        for m in dir.list_meetings() {
            assert!(dir.transcript(&m.id).is_some());
            assert_eq!(dir.attendees(&m.id), m.attendees);
        }
        assert!(dir.transcript("meet-999").is_none());
        assert!(dir.attendees("meet-999").is_empty());
    }

    #[test]
    fn test_created_records_are_listed() {
        let dir = MockDirectory::new();
        let site = dir.create_site("Project Beta", "Beta workspace");
        assert_eq!(site.id, "mock-site-project-beta");
        assert_eq!(site.web_url, format!("{TENANT_URL}/ProjectBeta"));
        assert_eq!(dir.list_sites().len(), 4);

        let event = dir.create_event(
            "Kickoff",
            at(2026, 3, 2, 10),
            at(2026, 3, 2, 11),
            vec!["alice@contoso.com".into()],
        );
        assert_eq!(event.id, "evt-new-001");
        assert_eq!(event.start.date_time, "2026-03-02T10:00:00");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["start"]["timeZone"], "UTC");
        assert!(json["onlineMeeting"]["joinUrl"].as_str().unwrap().ends_with("evt-new-001"));
    }

    #[test]
    fn test_list_events_window_follows_clock() {
        let now = Utc.with_ymd_and_hms(2026, 2, 17, 9, 30, 0).unwrap();
        let dir = MockDirectory::new().with_clock(now);
        dir.create_event("Standup", at(2026, 2, 17, 8), at(2026, 2, 17, 9), vec![]);
        dir.create_event("Quarterly review", at(2026, 3, 2, 10), at(2026, 3, 2, 11), vec![]);

        let ids = |days| -> Vec<String> { dir.list_events(days).into_iter().map(|e| e.id).collect() };
        assert_eq!(ids(7), ["evt-001", "evt-002"]);
        assert_eq!(ids(2), ["evt-001"]);
        assert_eq!(ids(14), ["evt-001", "evt-002", "evt-new-002"]);
        assert!(ids(0).is_empty());

        let first = &dir.list_events(7)[0];
        assert_eq!(first.start.date_time, "2026-02-18T15:00:00");
        assert_eq!(first.end.date_time, "2026-02-18T16:00:00");
    }

    #[test]
    fn test_document_names_use_clock() {
        let now = Utc.with_ymd_and_hms(2026, 2, 17, 9, 30, 0).unwrap();
        let dir = MockDirectory::new().with_clock(now);
        assert_eq!(dir.document_name("report", "xlsx"), "report_20260217_093000.xlsx");
    }
}
