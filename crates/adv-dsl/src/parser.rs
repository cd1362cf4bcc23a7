//! Line scanner for `.adv` documents.
//!
//! The scanner walks the text once. A line may open a block with `[TAG]`,
//! close one with `[/TAG]`, or both (`[GAME_NAME] Test [/GAME_NAME]`);
//! whatever sits between the tags is content for the open block. Opening a
//! block implicitly closes the one before it, so documents that never write
//! closing tags parse the same as those that do. Content is buffered and
//! handed to a block's mini-parser when the block closes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use adv_core::{
    AdventureDocument, Choice, ConsequenceSet, EndingKind, RandomEvent, Rule, Step, StepId, Value,
};
use log::debug;
use regex::Regex;

use crate::choice::parse_choice;
use crate::error::{FormatError, FormatErrorKind};

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(STEP_[^\]\s]*|[A-Z][A-Z0-9_]*)\]").expect("opening tag regex must compile")
});

static CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[/(STEP_[^\]\s]*|[A-Z][A-Z0-9_]*)\]$").expect("closing tag regex must compile")
});

static STEP_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bSTEP_\d+\b").expect("step reference regex must compile")
});

static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^IF\s+(.+?)\s+THEN\s+(.+)$").expect("rule regex must compile")
});

/// Similarity needed before an unknown tag gets a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Top-level sections, everything except steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    GameName,
    Name,
    MainMenu,
    Inventory,
    Stats,
    Variables,
    Ending(EndingKind),
    Conditions,
    Checkpoint,
    RandomEvent,
    Consequence,
}

impl Section {
    const ALL: [Section; 13] = [
        Section::GameName,
        Section::Name,
        Section::MainMenu,
        Section::Inventory,
        Section::Stats,
        Section::Variables,
        Section::Ending(EndingKind::Success),
        Section::Ending(EndingKind::Failure),
        Section::Ending(EndingKind::Neutral),
        Section::Conditions,
        Section::Checkpoint,
        Section::RandomEvent,
        Section::Consequence,
    ];

    fn tag(self) -> &'static str {
        match self {
            Self::GameName => "GAME_NAME",
            Self::Name => "NAME",
            Self::MainMenu => "MAIN_MENU",
            Self::Inventory => "INVENTORY",
            Self::Stats => "STATS",
            Self::Variables => "VARIABLES",
            Self::Ending(kind) => kind.tag(),
            Self::Conditions => "CONDITIONS",
            Self::Checkpoint => "CHECKPOINT",
            Self::RandomEvent => "RANDOM_EVENT",
            Self::Consequence => "CONSEQUENCE",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tag() == tag)
    }

    /// Auxiliary blocks may repeat; their entries accumulate.
    fn repeatable(self) -> bool {
        matches!(
            self,
            Self::Conditions | Self::Checkpoint | Self::RandomEvent | Self::Consequence
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subsection {
    Narrative,
    Choices,
}

impl Subsection {
    fn tag(self) -> &'static str {
        match self {
            Self::Narrative => "NARRATIVE",
            Self::Choices => "CHOICES",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "NARRATIVE" => Some(Self::Narrative),
            "CHOICES" => Some(Self::Choices),
            _ => None,
        }
    }
}

/// A buffered content line.
#[derive(Debug, Clone)]
struct Line {
    number: usize,
    span: Range<usize>,
    text: String,
}

#[derive(Debug)]
struct OpenStep {
    id: StepId,
    narrative: Option<String>,
    choices: Option<Vec<Choice>>,
    sub: Option<Subsection>,
}

#[derive(Debug)]
enum Block {
    Top,
    Section(Section),
    Step(OpenStep),
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "top level"),
            Self::Section(section) => write!(f, "{}", section.tag()),
            Self::Step(step) => match step.sub {
                Some(sub) => write!(f, "{}/{}", step.id, sub.tag()),
                None => write!(f, "{}", step.id),
            },
        }
    }
}

/// Partially built document fields.
#[derive(Debug, Default)]
struct Draft {
    game_name: Option<String>,
    ask_for_name: bool,
    main_menu: Vec<String>,
    inventory: BTreeMap<String, Value>,
    stats: BTreeMap<String, Value>,
    variables: BTreeMap<String, Value>,
    steps: BTreeMap<StepId, Step>,
    endings: BTreeMap<EndingKind, String>,
    rules: Vec<Rule>,
    checkpoints: Vec<StepId>,
    random_events: Vec<RandomEvent>,
    consequence_sets: Vec<ConsequenceSet>,
}

struct Scanner {
    block: Block,
    buffer: Vec<Line>,
    seen: HashSet<Section>,
    draft: Draft,
    /// Line currently being scanned, for error locations.
    current: Option<(usize, Range<usize>)>,
}

/// Parse `.adv` text into a document. Step targets are not resolved here;
/// see [`crate::load_document`] for parsing plus graph validation.
pub fn parse_document(source: &str) -> Result<AdventureDocument, FormatError> {
    let mut scanner = Scanner {
        block: Block::Top,
        buffer: Vec::new(),
        seen: HashSet::new(),
        draft: Draft::default(),
        current: None,
    };

    let mut offset = 0;
    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let content = raw.trim_end_matches(['\n', '\r']);
        let lead = content.len() - content.trim_start().len();
        let trimmed = content.trim();
        let start = offset + lead;
        scanner.current = Some((index + 1, start..start + trimmed.len()));
        scanner.scan_line(trimmed)?;
        offset += raw.len();
    }

    scanner.current = None;
    scanner.close_block()?;
    scanner.finish()
}

impl Scanner {
    fn scan_line(&mut self, line: &str) -> Result<(), FormatError> {
        let mut rest = line;

        if let Some(caps) = OPEN_TAG.captures(rest) {
            let tag = caps[1].to_string();
            rest = rest[caps[0].len()..].trim_start();
            self.open(&tag)?;
        }

        let closing = CLOSE_TAG.captures(rest).map(|caps| {
            let tag = caps[1].to_string();
            let before = rest[..rest.len() - caps[0].len()].trim_end();
            (tag, before)
        });

        match closing {
            Some((tag, before)) => {
                self.content(before)?;
                self.close(&tag)
            }
            None => self.content(rest),
        }
    }

    fn open(&mut self, tag: &str) -> Result<(), FormatError> {
        if let Some(sub) = Subsection::from_tag(tag) {
            return self.open_subsection(sub);
        }

        if let Some(digits) = tag.strip_prefix("STEP_") {
            let id = StepId::new(digits)
                .ok_or_else(|| self.error(FormatErrorKind::InvalidStepId(tag.to_string())))?;
            self.close_block()?;
            if self.draft.steps.contains_key(&id) {
                return Err(self.error(FormatErrorKind::DuplicateStep(id)));
            }
            debug!("opening {id}");
            self.block = Block::Step(OpenStep {
                id,
                narrative: None,
                choices: None,
                sub: None,
            });
            return Ok(());
        }

        let section = Section::from_tag(tag).ok_or_else(|| {
            self.error(FormatErrorKind::UnknownTag {
                tag: tag.to_string(),
                suggestion: suggest_tag(tag),
            })
        })?;
        self.close_block()?;
        if !section.repeatable() && !self.seen.insert(section) {
            return Err(self.error(FormatErrorKind::DuplicateSection(section.tag().to_string())));
        }
        debug!("opening [{}]", section.tag());
        self.block = Block::Section(section);
        Ok(())
    }

    fn open_subsection(&mut self, sub: Subsection) -> Result<(), FormatError> {
        if !matches!(self.block, Block::Step(_)) {
            return Err(self.error(FormatErrorKind::SubsectionOutsideStep(
                sub.tag().to_string(),
            )));
        }
        self.close_subsection()?;
        if let Block::Step(step) = &mut self.block {
            step.sub = Some(sub);
        }
        Ok(())
    }

    fn close(&mut self, tag: &str) -> Result<(), FormatError> {
        let matches = match (&self.block, Subsection::from_tag(tag)) {
            (Block::Step(step), Some(sub)) => step.sub == Some(sub),
            (Block::Step(step), None) => StepId::from_tag(tag).as_ref() == Some(&step.id),
            (Block::Section(section), None) => section.tag() == tag,
            _ => false,
        };
        if !matches {
            return Err(self.error(FormatErrorKind::UnmatchedClose(tag.to_string())));
        }

        if Subsection::from_tag(tag).is_some() {
            self.close_subsection()
        } else {
            self.close_block()
        }
    }

    fn content(&mut self, text: &str) -> Result<(), FormatError> {
        let accepts = match &self.block {
            Block::Top => false,
            Block::Section(_) => true,
            Block::Step(step) => step.sub.is_some(),
        };
        if !accepts {
            if text.is_empty() {
                return Ok(());
            }
            let kind = match &self.block {
                Block::Step(step) => FormatErrorKind::TextOutsideSubsection(step.id.clone()),
                _ => FormatErrorKind::StrayText,
            };
            return Err(self.error(kind));
        }

        let (number, span) = self.current.clone().unwrap_or((0, 0..0));
        self.buffer.push(Line {
            number,
            span,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Flush the open subsection of the open step, if any.
    fn close_subsection(&mut self) -> Result<(), FormatError> {
        let Block::Step(step) = &mut self.block else {
            return Ok(());
        };
        let Some(sub) = step.sub.take() else {
            return Ok(());
        };
        let lines = std::mem::take(&mut self.buffer);
        let section = format!("{}/{}", step.id, sub.tag());
        let duplicate = FormatErrorKind::DuplicateSubsection {
            step: step.id.clone(),
            subsection: sub.tag().to_string(),
        };

        match sub {
            Subsection::Narrative => {
                if step.narrative.is_some() {
                    return Err(located(&self.current, Some(section), duplicate));
                }
                let text = join_lines(&lines, "\n");
                if !text.is_empty() {
                    step.narrative = Some(text);
                }
            }
            Subsection::Choices => {
                if step.choices.is_some() {
                    return Err(located(&self.current, Some(section), duplicate));
                }
                let mut choices: Vec<Choice> = Vec::new();
                for line in non_blank(&lines) {
                    let choice = parse_choice(&line.text)
                        .map_err(|e| line_error(line, &section, e.into()))?;
                    if choices.iter().any(|c| c.label == choice.label) {
                        return Err(line_error(
                            line,
                            &section,
                            FormatErrorKind::DuplicateLabel {
                                step: step.id.clone(),
                                label: choice.label,
                            },
                        ));
                    }
                    choices.push(choice);
                }
                choices.sort_by_key(|c| c.label);
                step.choices = Some(choices);
            }
        }
        Ok(())
    }

    /// Flush and close whatever block is open.
    fn close_block(&mut self) -> Result<(), FormatError> {
        self.close_subsection()?;
        let lines = std::mem::take(&mut self.buffer);

        match std::mem::replace(&mut self.block, Block::Top) {
            Block::Top => Ok(()),
            Block::Step(step) => {
                let Some(narrative) = step.narrative else {
                    return Err(located(
                        &self.current,
                        Some(step.id.to_string()),
                        FormatErrorKind::MissingNarrative(step.id),
                    ));
                };
                debug!("closing {}", step.id);
                self.draft.steps.insert(
                    step.id.clone(),
                    Step {
                        id: step.id,
                        narrative,
                        choices: step.choices.unwrap_or_default(),
                    },
                );
                Ok(())
            }
            Block::Section(section) => self.flush_section(section, &lines),
        }
    }

    fn flush_section(&mut self, section: Section, lines: &[Line]) -> Result<(), FormatError> {
        let tag = section.tag();
        let draft = &mut self.draft;
        match section {
            Section::GameName => {
                let name = join_lines(lines, " ");
                if !name.is_empty() {
                    draft.game_name = Some(name);
                }
            }
            Section::Name => {
                let text = join_lines(lines, " ");
                draft.ask_for_name = match text.to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(section_error(lines, tag, FormatErrorKind::InvalidBool(text)));
                    }
                };
            }
            Section::MainMenu => {
                draft.main_menu.extend(non_blank(lines).map(|l| l.text.clone()));
            }
            Section::Inventory => draft.inventory = parse_key_values(lines, tag)?,
            Section::Stats => draft.stats = parse_key_values(lines, tag)?,
            Section::Variables => draft.variables = parse_key_values(lines, tag)?,
            Section::Ending(kind) => {
                let text = join_lines(lines, "\n");
                if text.is_empty() {
                    return Err(section_error(lines, tag, FormatErrorKind::EmptyEnding(kind)));
                }
                draft.endings.insert(kind, text);
            }
            Section::Conditions => {
                for line in non_blank(lines) {
                    let caps = RULE_LINE.captures(&line.text).ok_or_else(|| {
                        line_error(line, tag, FormatErrorKind::MalformedRule(line.text.clone()))
                    })?;
                    draft.rules.push(Rule {
                        condition: caps[1].to_string(),
                        action: caps[2].to_string(),
                    });
                }
            }
            Section::Checkpoint => {
                for line in non_blank(lines) {
                    let before = draft.checkpoints.len();
                    draft.checkpoints.extend(
                        STEP_REF
                            .find_iter(&line.text)
                            .filter_map(|m| StepId::from_tag(m.as_str())),
                    );
                    if draft.checkpoints.len() == before {
                        debug!("ignoring checkpoint line {:?}", line.text);
                    }
                }
            }
            Section::RandomEvent => {
                for line in non_blank(lines) {
                    let event = parse_random_event(&line.text)
                        .map_err(|kind| line_error(line, tag, kind))?;
                    draft.random_events.push(event);
                }
            }
            Section::Consequence => {
                for line in non_blank(lines) {
                    let entries = parse_pairs(&line.text);
                    if entries.is_empty() {
                        return Err(line_error(
                            line,
                            tag,
                            FormatErrorKind::EmptyConsequence(line.text.clone()),
                        ));
                    }
                    draft.consequence_sets.push(ConsequenceSet { entries });
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<AdventureDocument, FormatError> {
        let draft = self.draft;
        let game_name = draft
            .game_name
            .ok_or_else(|| FormatError::document(FormatErrorKind::MissingGameName))?;
        if draft.main_menu.is_empty() {
            return Err(FormatError::document(FormatErrorKind::EmptyMainMenu));
        }
        if draft.steps.is_empty() {
            return Err(FormatError::document(FormatErrorKind::NoSteps));
        }

        Ok(AdventureDocument {
            game_name,
            main_menu: draft.main_menu,
            ask_for_name: draft.ask_for_name,
            inventory: draft.inventory,
            stats: draft.stats,
            variables: draft.variables,
            steps: draft.steps,
            endings: draft.endings,
            rules: draft.rules,
            checkpoints: draft.checkpoints,
            random_events: draft.random_events,
            consequence_sets: draft.consequence_sets,
        })
    }

    /// An error at the line being scanned, inside the open block.
    fn error(&self, kind: FormatErrorKind) -> FormatError {
        let section = match &self.block {
            Block::Top => None,
            block => Some(block.to_string()),
        };
        located(&self.current, section, kind)
    }
}

/// An error at the scanned line, or a whole-document one at end of input.
fn located(
    current: &Option<(usize, Range<usize>)>,
    section: Option<String>,
    kind: FormatErrorKind,
) -> FormatError {
    FormatError {
        line: current.as_ref().map(|(number, _)| *number),
        span: current.as_ref().map(|(_, span)| span.clone()),
        section,
        kind,
    }
}

fn non_blank(lines: &[Line]) -> impl Iterator<Item = &Line> {
    lines.iter().filter(|l| !l.text.is_empty())
}

fn join_lines(lines: &[Line], sep: &str) -> String {
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    texts.join(sep).trim().to_string()
}

fn line_error(line: &Line, section: &str, kind: FormatErrorKind) -> FormatError {
    FormatError {
        line: Some(line.number),
        span: Some(line.span.clone()),
        section: Some(section.to_string()),
        kind,
    }
}

/// Locate a whole-block error at the block's first content line.
fn section_error(lines: &[Line], section: &str, kind: FormatErrorKind) -> FormatError {
    match non_blank(lines).next() {
        Some(line) => line_error(line, section, kind),
        None => FormatError {
            section: Some(section.to_string()),
            ..FormatError::document(kind)
        },
    }
}

fn suggest_tag(tag: &str) -> Option<String> {
    Section::ALL
        .iter()
        .map(|s| s.tag())
        .chain(["NARRATIVE", "CHOICES"])
        .map(|known| (known, strsim::jaro_winkler(tag, known)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(known, _)| known.to_string())
}

fn parse_key_values(lines: &[Line], section: &str) -> Result<BTreeMap<String, Value>, FormatError> {
    let mut map = BTreeMap::new();
    for line in non_blank(lines) {
        let malformed = || line_error(line, section, FormatErrorKind::MalformedKeyValue(line.text.clone()));
        if line.text.matches(':').count() != 1 {
            return Err(malformed());
        }
        let (key, value) = line.text.split_once(':').ok_or_else(malformed)?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(malformed());
        }
        if map.insert(key.to_string(), Value::coerce(value)).is_some() {
            return Err(line_error(
                line,
                section,
                FormatErrorKind::DuplicateKey(key.to_string()),
            ));
        }
    }
    Ok(map)
}

fn parse_random_event(text: &str) -> Result<RandomEvent, FormatErrorKind> {
    let malformed = |reason: &str| FormatErrorKind::MalformedRandomEvent {
        line: text.to_string(),
        reason: reason.to_string(),
    };

    let mut chance = None;
    let mut outcome = None;
    for (key, value) in text.split(',').filter_map(|pair| pair.split_once(':')) {
        match key.trim() {
            "chance" => chance = Some(value.trim()),
            "outcome" => outcome = Some(value.trim()),
            _ => {}
        }
    }

    let chance = chance.ok_or_else(|| malformed("missing `chance`"))?;
    let outcome = outcome.ok_or_else(|| malformed("missing `outcome`"))?;

    let chance: f64 = chance
        .parse()
        .map_err(|_| malformed("`chance` is not a number"))?;
    if !(0.0..=1.0).contains(&chance) {
        return Err(malformed("`chance` must be between 0 and 1"));
    }
    let outcome = StepId::from_tag(outcome)
        .or_else(|| StepId::new(outcome))
        .ok_or_else(|| malformed("`outcome` must be STEP_<n>"))?;

    Ok(RandomEvent { chance, outcome })
}

/// `target: value` pairs separated by commas. Malformed pairs are skipped.
fn parse_pairs(text: &str) -> Vec<(String, Value)> {
    text.split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key.to_string(), Value::coerce(value)))
        .collect()
}
