//! Participant registry
//!
//! Participants and their hand-off edges are declared on a [`RegistryBuilder`]
//! and validated once by [`RegistryBuilder::finalize`]. After that every
//! participant is addressed by a [`ParticipantId`] handle and the registry is
//! read-only, so it can be shared between sessions behind an `Arc`.

use crate::llm::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use thiserror::Error;

const MAX_NAME_LEN: usize = 64;

/// Handle to a participant of a finalized [`Registry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(usize);

impl ParticipantId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Text only
    Plain,
    /// May request tool calls from the tool handler
    ToolUsing,
}

/// Declaration of a participant before the registry is finalized
#[derive(Debug, Clone)]
pub struct ParticipantSpec {
    pub name: String,
    pub instructions: String,
    pub capability: Capability,
    pub tools: Vec<ToolDefinition>,
}

impl ParticipantSpec {
    pub fn plain(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            capability: Capability::Plain,
            tools: vec![],
        }
    }

    pub fn tool_using(
        name: impl Into<String>,
        instructions: impl Into<String>,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            capability: Capability::ToolUsing,
            tools,
        }
    }
}

/// A finalized participant
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    instructions: String,
    capability: Capability,
    tools: Vec<ToolDefinition>,
    handoff_targets: BTreeSet<ParticipantId>,
}

impl Participant {
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn handoff_targets(&self) -> &BTreeSet<ParticipantId> {
        &self.handoff_targets
    }

    pub fn can_hand_off_to(&self, target: ParticipantId) -> bool {
        self.handoff_targets.contains(&target)
    }

    /// A participant with no outgoing edges
    pub fn is_terminal(&self) -> bool {
        self.handoff_targets.is_empty()
    }
}

/// Build-time validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("participant '{0}' is registered twice")]
    DuplicateParticipant(String),

    #[error("invalid participant name '{0}': expected 1-64 characters of [A-Za-z0-9_-]")]
    InvalidName(String),

    #[error("participant '{participant}' hands off to unknown participant '{target}'")]
    UnknownTarget { participant: String, target: String },

    #[error("participant '{0}' lists itself as a hand-off target")]
    SelfHandoff(String),

    #[error("cannot add hand-offs to unregistered participant '{0}'")]
    UnknownSource(String),

    #[error("no start participant set")]
    MissingStart,

    #[error("start participant '{0}' is not registered")]
    UnknownStart(String),

    #[error("participants unreachable from '{start}': {}", .unreachable.join(", "))]
    Unreachable {
        start: String,
        unreachable: Vec<String>,
    },

    #[error("plain participant '{0}' must not carry tools")]
    ToolsOnPlainParticipant(String),

    #[error("tool-using participant '{0}' has no tools")]
    MissingTools(String),
}

#[derive(Debug)]
struct Declared {
    spec: ParticipantSpec,
    targets: Vec<String>,
}

/// Collects participants and edges; edges may name participants registered later
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    declared: Vec<Declared>,
    by_name: HashMap<String, usize>,
    start: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant with its allowed hand-off targets
    pub fn register<I, S>(&mut self, spec: ParticipantSpec, targets: I) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_name(&spec.name)?;
        if self.by_name.contains_key(&spec.name) {
            return Err(ConfigError::DuplicateParticipant(spec.name));
        }
        match spec.capability {
            Capability::Plain if !spec.tools.is_empty() => {
                return Err(ConfigError::ToolsOnPlainParticipant(spec.name));
            }
            Capability::ToolUsing if spec.tools.is_empty() => {
                return Err(ConfigError::MissingTools(spec.name));
            }
            _ => {}
        }

        let targets = targets.into_iter().map(Into::into).collect();
        self.by_name.insert(spec.name.clone(), self.declared.len());
        self.declared.push(Declared { spec, targets });
        Ok(self)
    }

    /// Extend the edges of an already registered participant
    pub fn add_handoff<I, S>(&mut self, source: &str, targets: I) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = *self
            .by_name
            .get(source)
            .ok_or_else(|| ConfigError::UnknownSource(source.to_string()))?;
        self.declared[index]
            .targets
            .extend(targets.into_iter().map(Into::into));
        Ok(self)
    }

    pub fn with_start(&mut self, name: impl Into<String>) -> &mut Self {
        self.start = Some(name.into());
        self
    }

    /// Resolve every edge and check reachability from the start participant
    pub fn finalize(self) -> Result<Registry, ConfigError> {
        let start_name = self.start.ok_or(ConfigError::MissingStart)?;
        let start = *self
            .by_name
            .get(&start_name)
            .ok_or_else(|| ConfigError::UnknownStart(start_name.clone()))?;

        let mut participants = Vec::with_capacity(self.declared.len());
        for (index, declared) in self.declared.into_iter().enumerate() {
            let mut handoff_targets = BTreeSet::new();
            for target in &declared.targets {
                let Some(&target_index) = self.by_name.get(target) else {
                    return Err(ConfigError::UnknownTarget {
                        participant: declared.spec.name,
                        target: target.clone(),
                    });
                };
                if target_index == index {
                    return Err(ConfigError::SelfHandoff(declared.spec.name));
                }
                handoff_targets.insert(ParticipantId::new(target_index));
            }
            let ParticipantSpec {
                name,
                instructions,
                capability,
                tools,
            } = declared.spec;
            participants.push(Participant {
                id: ParticipantId::new(index),
                name,
                instructions,
                capability,
                tools,
                handoff_targets,
            });
        }

        let reached = reachable_from(&participants, start);
        let unreachable: Vec<String> = participants
            .iter()
            .filter(|p| !reached[p.id.index()])
            .map(|p| p.name.clone())
            .collect();
        if !unreachable.is_empty() {
            return Err(ConfigError::Unreachable {
                start: start_name,
                unreachable,
            });
        }

        Ok(Registry {
            participants,
            by_name: self.by_name,
            start: ParticipantId::new(start),
        })
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(name.to_string()))
    }
}

fn reachable_from(participants: &[Participant], start: usize) -> Vec<bool> {
    let mut seen = vec![false; participants.len()];
    let mut queue = VecDeque::from([start]);
    seen[start] = true;
    while let Some(index) = queue.pop_front() {
        for target in &participants[index].handoff_targets {
            if !seen[target.index()] {
                seen[target.index()] = true;
                queue.push_back(target.index());
            }
        }
    }
    seen
}

/// Finalized, read-only participant registry
#[derive(Debug)]
pub struct Registry {
    participants: Vec<Participant>,
    by_name: HashMap<String, usize>,
    start: ParticipantId,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn start(&self) -> ParticipantId {
        self.start
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(id.index())
    }

    /// Map a name back to its handle. Only used where model output names a participant.
    pub fn lookup(&self, name: &str) -> Option<ParticipantId> {
        self.by_name.get(name).copied().map(ParticipantId::new)
    }

    pub fn name(&self, id: ParticipantId) -> &str {
        self.participant(id).map_or("<unknown>", Participant::name)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_allowed(&self, from: ParticipantId, to: ParticipantId) -> bool {
        self.participant(from)
            .is_some_and(|p| p.can_hand_off_to(to))
    }

    /// Names of the participants `from` may hand off to, sorted by registration order
    pub fn allowed_names(&self, from: ParticipantId) -> Vec<String> {
        self.participant(from)
            .map(|p| {
                p.handoff_targets
                    .iter()
                    .map(|id| self.name(*id).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{name} tool"),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    fn star() -> Registry {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("coordinator", "route"), ["billing", "support"])
            .unwrap()
            .register(
                ParticipantSpec::tool_using("billing", "billing", vec![tool("refund")]),
                ["coordinator"],
            )
            .unwrap()
            .register(ParticipantSpec::plain("support", "support"), ["coordinator"])
            .unwrap()
            .with_start("coordinator");
        builder.finalize().unwrap()
    }

    #[test]
    fn test_star_topology_finalizes() {
        let registry = star();
        let coordinator = registry.lookup("coordinator").unwrap();
        let billing = registry.lookup("billing").unwrap();
        let support = registry.lookup("support").unwrap();

        assert_eq!(registry.start(), coordinator);
        assert_eq!(registry.len(), 3);
        assert!(registry.is_allowed(coordinator, billing));
        assert!(registry.is_allowed(billing, coordinator));
        assert!(!registry.is_allowed(billing, support));
        assert_eq!(registry.allowed_names(coordinator), vec!["billing", "support"]);
        assert_eq!(
            registry.participant(billing).unwrap().capability(),
            Capability::ToolUsing
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("a", "x"), Vec::<String>::new())
            .unwrap();
        let err = builder
            .register(ParticipantSpec::plain("a", "y"), Vec::<String>::new())
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateParticipant("a".into()));
    }

    #[test]
    fn test_forward_reference_resolved_at_finalize() {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("a", "x"), ["b"])
            .unwrap()
            .register(ParticipantSpec::plain("b", "y"), Vec::<String>::new())
            .unwrap()
            .with_start("a");
        let registry = builder.finalize().unwrap();
        let b = registry.lookup("b").unwrap();
        assert!(registry.participant(b).unwrap().is_terminal());
    }

    #[test]
    fn test_unresolved_target_rejected() {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("a", "x"), ["ghost"])
            .unwrap()
            .with_start("a");
        assert_eq!(
            builder.finalize().unwrap_err(),
            ConfigError::UnknownTarget {
                participant: "a".into(),
                target: "ghost".into()
            }
        );
    }

    #[test]
    fn test_start_must_be_set_and_registered() {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("a", "x"), Vec::<String>::new())
            .unwrap();
        assert_eq!(builder.finalize().unwrap_err(), ConfigError::MissingStart);

        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("a", "x"), Vec::<String>::new())
            .unwrap()
            .with_start("b");
        assert_eq!(
            builder.finalize().unwrap_err(),
            ConfigError::UnknownStart("b".into())
        );
    }

    #[test]
    fn test_unreachable_participant_rejected() {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("a", "x"), ["b"])
            .unwrap()
            .register(ParticipantSpec::plain("b", "y"), ["a"])
            .unwrap()
            .register(ParticipantSpec::plain("island", "z"), ["a"])
            .unwrap()
            .with_start("a");
        let err = builder.finalize().unwrap_err();
        assert_eq!(
            err,
            ConfigError::Unreachable {
                start: "a".into(),
                unreachable: vec!["island".into()]
            }
        );
        assert!(err.to_string().contains("island"));
    }

    #[test]
    fn test_self_handoff_rejected() {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("a", "x"), ["a"])
            .unwrap()
            .with_start("a");
        assert_eq!(builder.finalize().unwrap_err(), ConfigError::SelfHandoff("a".into()));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut builder = Registry::builder();
        let too_long = "x".repeat(65);
        for name in ["", "has space", "dots.not.allowed", too_long.as_str()] {
            let err = builder
                .register(ParticipantSpec::plain(name, "x"), Vec::<String>::new())
                .unwrap_err();
            assert_eq!(err, ConfigError::InvalidName(name.to_string()));
        }
    }

    #[test]
    fn test_capability_tool_rules() {
        let mut builder = Registry::builder();
        let mut plain = ParticipantSpec::plain("a", "x");
        plain.tools.push(tool("t"));
        assert_eq!(
            builder.register(plain, Vec::<String>::new()).unwrap_err(),
            ConfigError::ToolsOnPlainParticipant("a".into())
        );
        assert_eq!(
            builder
                .register(ParticipantSpec::tool_using("b", "x", vec![]), Vec::<String>::new())
                .unwrap_err(),
            ConfigError::MissingTools("b".into())
        );
    }

    #[test]
    fn test_add_handoff_extends_edges() {
        let mut builder = Registry::builder();
        builder
            .register(ParticipantSpec::plain("hub", "x"), Vec::<String>::new())
            .unwrap()
            .register(ParticipantSpec::plain("spoke", "y"), ["hub"])
            .unwrap()
            .add_handoff("hub", ["spoke"])
            .unwrap()
            .with_start("hub");
        let registry = builder.finalize().unwrap();
        let hub = registry.lookup("hub").unwrap();
        let spoke = registry.lookup("spoke").unwrap();
        assert!(registry.is_allowed(hub, spoke));

        let mut builder = Registry::builder();
        assert_eq!(
            builder.add_handoff("nobody", ["x"]).unwrap_err(),
            ConfigError::UnknownSource("nobody".into())
        );
    }
}
