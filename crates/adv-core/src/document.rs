use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Identifier of a story step: the digits after `STEP_`.
///
/// Ordering is numeric, so `STEP_2` sorts before `STEP_10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId(String);

impl StepId {
    /// Create a step ID from its digits. Returns `None` unless `digits` is a
    /// non-empty run of ASCII digits.
    pub fn new(digits: &str) -> Option<Self> {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(digits.to_string()))
        } else {
            None
        }
    }

    /// Parse a `STEP_<digits>` reference.
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.strip_prefix("STEP_").and_then(Self::new)
    }

    /// The step every session starts at.
    pub fn start() -> Self {
        Self("1".to_string())
    }

    /// The bare digits of this ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric_key(&self) -> (usize, &str) {
        let trimmed = self.0.trim_start_matches('0');
        (trimmed.len(), trimmed)
    }
}

impl Ord for StepId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric_key()
            .cmp(&other.numeric_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for StepId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STEP_{}", self.0)
    }
}

impl TryFrom<String> for StepId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("invalid step id: {value:?}"))
    }
}

impl From<StepId> for String {
    fn from(id: StepId) -> Self {
        id.0
    }
}

/// A choice label. Labels define display order within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Choice `A`.
    A,
    /// Choice `B`.
    B,
    /// Choice `C`.
    C,
    /// Choice `D`.
    D,
}

impl Label {
    /// All labels in display order.
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    /// Parse a single uppercase label letter.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    /// The label letter.
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One of the three fixed ending kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingKind {
    /// The player won.
    Success,
    /// The player lost.
    Failure,
    /// The story ended without a verdict.
    Neutral,
}

impl EndingKind {
    /// All ending kinds, in section order.
    pub const ALL: [EndingKind; 3] = [
        EndingKind::Success,
        EndingKind::Failure,
        EndingKind::Neutral,
    ];

    /// Section tag and choice target for this ending, e.g. `ENDING_SUCCESS`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Success => "ENDING_SUCCESS",
            Self::Failure => "ENDING_FAILURE",
            Self::Neutral => "ENDING_NEUTRAL",
        }
    }

    /// Parse an `ENDING_*` tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// Text shown when a document does not define this ending.
    pub fn default_text(self) -> &'static str {
        match self {
            Self::Success => "Congratulations! You have successfully completed the adventure.",
            Self::Failure => "Your adventure has ended. Better luck next time!",
            Self::Neutral => "Your adventure has come to an end.",
        }
    }
}

impl fmt::Display for EndingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Where a choice leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Another step.
    Step(StepId),
    /// One of the fixed endings.
    Ending(EndingKind),
}

impl Target {
    /// Parse `STEP_<digits>` or an `ENDING_*` tag.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        StepId::from_tag(s)
            .map(Self::Step)
            .or_else(|| EndingKind::from_tag(s).map(Self::Ending))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(id) => write!(f, "{id}"),
            Self::Ending(kind) => write!(f, "{}", kind.tag()),
        }
    }
}

/// A labeled option leading to another step or an ending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Label, unique within its step.
    pub label: Label,
    /// Text shown to the player.
    pub description: String,
    /// Where this choice leads.
    pub target: Target,
    /// Predicates that must all hold, in order (text after `IF`).
    pub conditions: Vec<String>,
    /// `SET`/`USE` directives applied on the forward transition, in order.
    pub consequences: Vec<String>,
}

impl Choice {
    /// Create a choice without conditions or consequences.
    pub fn new(label: Label, description: impl Into<String>, target: Target) -> Self {
        Self {
            label,
            description: description.into(),
            target,
            conditions: Vec::new(),
            consequences: Vec::new(),
        }
    }

    /// Add a condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Add a consequence.
    pub fn with_consequence(mut self, consequence: impl Into<String>) -> Self {
        self.consequences.push(consequence.into());
        self
    }
}

/// One narrative beat with its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step identifier.
    pub id: StepId,
    /// Narrative text, never empty.
    pub narrative: String,
    /// Choices in label order.
    pub choices: Vec<Choice>,
}

impl Step {
    /// Find a choice by label.
    pub fn choice(&self, label: Label) -> Option<&Choice> {
        self.choices.iter().find(|c| c.label == label)
    }

    /// A step without choices can only be left by going back.
    pub fn is_dead_end(&self) -> bool {
        self.choices.is_empty()
    }
}

/// An `IF <condition> THEN <action>` line from a `[CONDITIONS]` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Text between `IF` and `THEN`.
    pub condition: String,
    /// Text after `THEN`.
    pub action: String,
}

/// A `chance: <p>, outcome: STEP_<id>` line from a `[RANDOM_EVENT]` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEvent {
    /// Probability in `0.0..=1.0`.
    pub chance: f64,
    /// Step the event redirects to.
    pub outcome: StepId,
}

/// One line of a `[CONSEQUENCE]` block: ordered `target: value` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceSet {
    /// The pairs, in source order.
    pub entries: Vec<(String, Value)>,
}

/// A parsed adventure. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureDocument {
    /// Title of the game, never empty.
    pub game_name: String,
    /// Main menu entries, never empty.
    pub main_menu: Vec<String>,
    /// Whether the shell should ask for the player's name.
    pub ask_for_name: bool,
    /// Starting inventory.
    pub inventory: BTreeMap<String, Value>,
    /// Starting stats.
    pub stats: BTreeMap<String, Value>,
    /// Starting variables.
    pub variables: BTreeMap<String, Value>,
    /// Steps by ID, never empty.
    pub steps: BTreeMap<StepId, Step>,
    /// Ending texts defined by the document.
    pub endings: BTreeMap<EndingKind, String>,
    /// `[CONDITIONS]` rules.
    pub rules: Vec<Rule>,
    /// `[CHECKPOINT]` steps.
    pub checkpoints: Vec<StepId>,
    /// `[RANDOM_EVENT]` entries.
    pub random_events: Vec<RandomEvent>,
    /// `[CONSEQUENCE]` lines.
    pub consequence_sets: Vec<ConsequenceSet>,
}

impl AdventureDocument {
    /// Look up a step.
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    /// Text for an ending, falling back to the built-in default.
    pub fn ending_text(&self, kind: EndingKind) -> &str {
        self.endings
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_text())
    }

    /// Whether reaching `id` should trigger an autosave.
    pub fn is_checkpoint(&self, id: &StepId) -> bool {
        self.checkpoints.contains(id)
    }

    /// Total number of choices across all steps.
    pub fn choice_count(&self) -> usize {
        self.steps.values().map(|s| s.choices.len()).sum()
    }
}
