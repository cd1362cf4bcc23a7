//! The traversal state machine.
//!
//! A [`Session`] walks one loaded adventure. It starts at the main menu,
//! moves into `STEP_1` on [`Session::start`], and from there only changes
//! through [`Session::select_choice`] and [`Session::go_back`]. Every
//! operation validates before it mutates, so an error leaves the session
//! exactly as it was.
//!
//! Going back pushes the undone move onto a redo stack. Picking the same
//! choice again replays that move without re-applying its consequences;
//! picking anything else discards the redo stack.

use std::fmt;
use std::sync::Arc;

use adv_core::{
    AdventureDocument, Choice, EndingKind, Label, Step, StepId, StoryGraph, Target,
    ValidationError,
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineResult, SessionError, SessionResult};
use crate::save::{self, SaveFile};
use crate::store::Store;

/// Where a session is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Not started yet.
    MainMenu,
    /// Reading a step.
    Step(StepId),
    /// Viewing an ending.
    Ending(EndingKind),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainMenu => write!(f, "main menu"),
            Self::Step(id) => write!(f, "{id}"),
            Self::Ending(kind) => write!(f, "{kind} ending"),
        }
    }
}

/// How a step was left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Via {
    /// The player picked this choice.
    Choice(Label),
    /// A random event moved the player on to this step.
    RandomEvent(StepId),
}

/// One move away from a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The step that was left.
    pub step: StepId,
    /// How it was left.
    pub via: Via,
}

/// All mutable state of a session. This is what saves hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current position.
    pub position: Position,
    /// Moves that led here, oldest first.
    pub history: Vec<HistoryEntry>,
    /// Moves undone by going back, most recent last.
    #[serde(default)]
    pub redo: Vec<HistoryEntry>,
    /// Inventory, stats, and variables.
    pub store: Store,
    /// Player name, when the adventure asks for one.
    pub user_name: Option<String>,
    /// Forward moves made so far.
    #[serde(default)]
    pub transitions: u64,
}

impl SessionState {
    fn main_menu() -> Self {
        Self {
            position: Position::MainMenu,
            history: Vec::new(),
            redo: Vec::new(),
            store: Store::default(),
            user_name: None,
            transitions: 0,
        }
    }

    /// Every step this state refers to.
    fn referenced_steps(&self) -> impl Iterator<Item = &StepId> {
        let current = match &self.position {
            Position::Step(id) => Some(id),
            _ => None,
        };
        let moves = self.history.iter().chain(&self.redo);
        current.into_iter().chain(moves.flat_map(|entry| {
            let landed = match &entry.via {
                Via::RandomEvent(to) => Some(to),
                Via::Choice(_) => None,
            };
            std::iter::once(&entry.step).chain(landed)
        }))
    }
}

/// Result of a successful forward move.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The session is now at a step.
    Continue {
        /// The step now shown.
        step: StepId,
        /// The step is a checkpoint; callers should autosave.
        checkpoint: bool,
        /// A random event redirected the move.
        random_event: bool,
    },
    /// The session reached an ending.
    Ending {
        /// Which ending.
        kind: EndingKind,
        /// Text to show.
        text: String,
    },
}

impl Outcome {
    /// Whether callers should autosave now.
    pub fn is_checkpoint(&self) -> bool {
        matches!(self, Self::Continue { checkpoint: true, .. })
    }
}

/// One player's walk through an adventure.
#[derive(Debug, Clone)]
pub struct Session {
    doc: Arc<AdventureDocument>,
    graph: StoryGraph,
    config: EngineConfig,
    state: SessionState,
}

impl Session {
    /// Validate the document's step graph and open a session at the main
    /// menu.
    pub fn new(
        doc: impl Into<Arc<AdventureDocument>>,
        config: EngineConfig,
    ) -> Result<Self, ValidationError> {
        let doc = doc.into();
        let graph = StoryGraph::build(&doc)?;
        Ok(Self {
            doc,
            graph,
            config,
            state: SessionState::main_menu(),
        })
    }

    /// Rebuild a session from save data.
    pub fn resume(
        doc: impl Into<Arc<AdventureDocument>>,
        config: EngineConfig,
        blob: &str,
    ) -> EngineResult<Self> {
        let save = save::deserialize_session(blob)?;
        let mut session = Self::new(doc, config)?;
        session.restore(save)?;
        Ok(session)
    }

    /// Start (or restart) at `STEP_1` with the document's starting store.
    ///
    /// The name is kept only when the adventure asks for one.
    pub fn start(&mut self, user_name: Option<&str>) {
        let user_name = user_name
            .map(str::trim)
            .filter(|name| self.doc.ask_for_name && !name.is_empty())
            .map(str::to_string);

        self.state = SessionState {
            position: Position::Step(StepId::start()),
            store: Store::from_document(&self.doc),
            user_name,
            ..SessionState::main_menu()
        };
        info!("started {:?}", self.doc.game_name);
    }

    /// The document being played.
    pub fn document(&self) -> &AdventureDocument {
        &self.doc
    }

    /// The session's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full mutable state, read-only.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current position.
    pub fn position(&self) -> &Position {
        &self.state.position
    }

    /// Inventory, stats, and variables.
    pub fn store(&self) -> &Store {
        &self.state.store
    }

    /// Moves that led here.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.state.history
    }

    /// The player's name, if one was given.
    pub fn user_name(&self) -> Option<&str> {
        self.state.user_name.as_deref()
    }

    /// The step being shown, if any.
    pub fn current_step(&self) -> Option<&Step> {
        match &self.state.position {
            Position::Step(id) => self.doc.step(id),
            _ => None,
        }
    }

    /// Whether going back is possible.
    pub fn can_go_back(&self) -> bool {
        !self.state.history.is_empty()
    }

    /// Choices of the current step the player may take, in label order.
    pub fn available_choices(&self) -> Vec<&Choice> {
        let Some(step) = self.current_step() else {
            return Vec::new();
        };
        step.choices
            .iter()
            .filter(|choice| {
                self.is_replay(&step.id, choice.label) || self.unmet_condition(choice).is_none()
            })
            .collect()
    }

    /// Take the choice labeled `label` from the current step.
    pub fn select_choice(&mut self, label: Label) -> SessionResult<Outcome> {
        let doc = Arc::clone(&self.doc);
        let from = match &self.state.position {
            Position::Step(id) => id.clone(),
            Position::MainMenu => return Err(SessionError::NotStarted),
            Position::Ending(kind) => return Err(SessionError::AtEnding(*kind)),
        };
        let choice = doc
            .step(&from)
            .and_then(|step| step.choice(label))
            .ok_or_else(|| SessionError::UnknownChoice {
                step: from.clone(),
                label,
            })?;

        let replay = self.is_replay(&from, label);
        let unmet = if replay {
            None
        } else {
            self.unmet_condition(choice)
        };
        if let Some(condition) = unmet {
            return Err(SessionError::ConditionNotMet {
                label,
                condition: condition.to_string(),
            });
        }
        if let Some(target) = self.dangling(&choice.target) {
            return Err(SessionError::DanglingTarget {
                step: from,
                label,
                target: target.clone(),
            });
        }

        // Checks are done; from here on the move happens.
        if replay {
            self.state.redo.pop();
            debug!("{from} -> {}: replaying choice {label}", choice.target);
        } else {
            self.state.redo.clear();
            for consequence in &choice.consequences {
                self.state.store.apply_consequence(consequence);
            }
            debug!("{from} -> {}: choice {label}", choice.target);
        }
        self.state.history.push(HistoryEntry {
            step: from,
            via: Via::Choice(label),
        });
        self.state.transitions += 1;

        match &choice.target {
            Target::Ending(kind) => {
                self.state.position = Position::Ending(*kind);
                info!("reached {kind} ending");
                Ok(Outcome::Ending {
                    kind: *kind,
                    text: doc.ending_text(*kind).to_string(),
                })
            }
            Target::Step(target) => {
                let mut step = target.clone();
                let redirect = if replay {
                    self.replayed_random_event(&step)
                } else if self.config.random_events {
                    self.roll_random_event(&step)
                } else {
                    None
                };
                let random_event = redirect.is_some();
                if let Some(outcome) = redirect {
                    debug!("random event: {step} -> {outcome}");
                    self.state.history.push(HistoryEntry {
                        step,
                        via: Via::RandomEvent(outcome.clone()),
                    });
                    step = outcome;
                }
                self.state.position = Position::Step(step.clone());
                Ok(Outcome::Continue {
                    checkpoint: doc.is_checkpoint(&step),
                    step,
                    random_event,
                })
            }
        }
    }

    /// Return to the step the last move left from. The store is not
    /// touched.
    pub fn go_back(&mut self) -> SessionResult<StepId> {
        let entry = self.state.history.pop().ok_or(SessionError::NoHistory)?;
        debug!("{} <- {}", entry.step, self.state.position);
        let step = entry.step.clone();
        self.state.position = Position::Step(step.clone());
        self.state.redo.push(entry);
        Ok(step)
    }

    /// Encode the session for the given slot.
    pub fn save(&self, slot: &str) -> EngineResult<String> {
        save::serialize_session(&self.state, &self.doc.game_name, slot)
    }

    /// Replace the session state with a save's, after checking it fits
    /// this adventure. On error nothing changes.
    pub fn restore(&mut self, save: SaveFile) -> SessionResult<()> {
        if save.game_name != self.doc.game_name {
            return Err(SessionError::GameMismatch {
                expected: self.doc.game_name.clone(),
                found: save.game_name,
            });
        }
        if let Some(missing) = save
            .state
            .referenced_steps()
            .find(|id| !self.graph.contains(id))
        {
            return Err(SessionError::UnknownStep(missing.clone()));
        }

        info!(
            "resumed {:?} from slot {:?} at {}",
            save.game_name, save.slot, save.state.position
        );
        self.state = save.state;
        Ok(())
    }

    fn is_replay(&self, from: &StepId, label: Label) -> bool {
        self.state.redo.last().is_some_and(|entry| {
            entry.step == *from && entry.via == Via::Choice(label)
        })
    }

    /// Pop a random event undone together with the move being replayed, so
    /// the replay lands where the original move did.
    fn replayed_random_event(&mut self, step: &StepId) -> Option<StepId> {
        let to = match self.state.redo.last() {
            Some(HistoryEntry {
                step: from,
                via: Via::RandomEvent(to),
            }) if from == step => to.clone(),
            _ => return None,
        };
        self.state.redo.pop();
        Some(to)
    }

    /// The step a target names, if the graph lacks it.
    fn dangling<'t>(&self, target: &'t Target) -> Option<&'t StepId> {
        match target {
            Target::Step(id) if self.graph.resolve(target).is_none() => Some(id),
            _ => None,
        }
    }

    /// The first condition of `choice` that does not hold.
    fn unmet_condition<'c>(&self, choice: &'c Choice) -> Option<&'c str> {
        choice
            .conditions
            .iter()
            .find(|c| {
                !self
                    .state
                    .store
                    .evaluate_condition(c, self.config.strict_conditions)
            })
            .map(String::as_str)
    }

    /// Roll the document's random events in order for a move into `step`.
    /// The RNG is derived from the seed and the move count, so the same
    /// session replays the same rolls after a resume.
    fn roll_random_event(&self, step: &StepId) -> Option<StepId> {
        let seed = self
            .config
            .seed
            .wrapping_add(self.state.transitions.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut rng = StdRng::seed_from_u64(seed);
        self.doc
            .random_events
            .iter()
            .find(|event| rng.random::<f64>() < event.chance)
            .map(|event| event.outcome.clone())
            .filter(|outcome| outcome != step && self.graph.contains(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use proptest::prelude::*;

    const DOOR: &str = "\
[GAME_NAME] Test [/GAME_NAME]
[MAIN_MENU] Start New Game [/MAIN_MENU]
[STEP_1]
[NARRATIVE] You wake. [/NARRATIVE]
[CHOICES]
A) Open the door -> STEP_2
B) Go back to sleep -> ENDING_FAILURE
[/CHOICES]
[STEP_2]
[NARRATIVE] You see light. [/NARRATIVE]
[CHOICES]
A) Walk -> ENDING_SUCCESS
[/CHOICES]
[ENDING_SUCCESS] You made it out. [/ENDING_SUCCESS]
";

    const VAULT: &str = "\
[GAME_NAME] Vault [/GAME_NAME]
[NAME] true [/NAME]
[MAIN_MENU] Start New Game [/MAIN_MENU]
[INVENTORY]
key: 1
[/INVENTORY]
[STEP_1]
[NARRATIVE] A locked door. [/NARRATIVE]
[CHOICES]
A) Use key -> STEP_3 {USE key}
B) Pick up gold -> STEP_2 {SET inventory:gold:5}
C) Force it -> STEP_2 {IF crowbar}
D) Think hard -> STEP_2 {IF wisdom > 3}
[/CHOICES]
[STEP_2]
[NARRATIVE] A side room. [/NARRATIVE]
[CHOICES]
A) Return -> STEP_1
[/CHOICES]
[STEP_3]
[NARRATIVE] The vault. [/NARRATIVE]
[CHOICES]
A) Open the chest -> ENDING_SUCCESS {IF key}
B) Leave -> ENDING_NEUTRAL
C) Look around -> STEP_2
[/CHOICES]
[CHECKPOINT] STEP_3 [/CHECKPOINT]
";

    fn started(source: &str) -> Session {
        session_with(source, EngineConfig::default())
    }

    fn session_with(source: &str, config: EngineConfig) -> Session {
        let doc = adv_dsl::load_document(source).unwrap();
        let mut session = Session::new(doc, config).unwrap();
        session.start(None);
        session
    }

    fn step(n: &str) -> Position {
        Position::Step(StepId::new(n).unwrap())
    }

    fn labels(session: &Session) -> Vec<Label> {
        session
            .available_choices()
            .iter()
            .map(|choice| choice.label)
            .collect()
    }

    #[test]
    fn new_session_waits_at_main_menu() {
        let doc = adv_dsl::load_document(DOOR).unwrap();
        let mut session = Session::new(doc, EngineConfig::default()).unwrap();
        assert_eq!(session.position(), &Position::MainMenu);
        assert!(session.available_choices().is_empty());
        assert_eq!(
            session.select_choice(Label::A),
            Err(SessionError::NotStarted)
        );
    }

    #[test]
    fn start_enters_step_one() {
        let session = started(DOOR);
        assert_eq!(session.position(), &step("1"));
        assert_eq!(session.current_step().unwrap().narrative, "You wake.");
        assert!(!session.can_go_back());
    }

    #[test]
    fn walking_to_success() {
        let mut session = started(DOOR);
        assert_eq!(
            session.select_choice(Label::A).unwrap(),
            Outcome::Continue {
                step: StepId::new("2").unwrap(),
                checkpoint: false,
                random_event: false,
            }
        );
        assert_eq!(
            session.select_choice(Label::A).unwrap(),
            Outcome::Ending {
                kind: EndingKind::Success,
                text: "You made it out.".to_string(),
            }
        );
        assert_eq!(session.position(), &Position::Ending(EndingKind::Success));
    }

    #[test]
    fn sleeping_fails_with_default_text() {
        let mut session = started(DOOR);
        let outcome = session.select_choice(Label::B).unwrap();
        assert_eq!(
            outcome,
            Outcome::Ending {
                kind: EndingKind::Failure,
                text: EndingKind::Failure.default_text().to_string(),
            }
        );
        assert_eq!(
            session.select_choice(Label::A),
            Err(SessionError::AtEnding(EndingKind::Failure))
        );
    }

    #[test]
    fn going_back_from_an_ending() {
        let mut session = started(DOOR);
        session.select_choice(Label::B).unwrap();
        assert_eq!(session.go_back().unwrap(), StepId::start());
        assert_eq!(session.position(), &step("1"));
        assert_eq!(session.go_back(), Err(SessionError::NoHistory));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let mut session = started(DOOR);
        session.select_choice(Label::A).unwrap();
        let before = session.state().clone();
        assert_eq!(
            session.select_choice(Label::B),
            Err(SessionError::UnknownChoice {
                step: StepId::new("2").unwrap(),
                label: Label::B,
            })
        );
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn using_the_key_locks_later_choices() {
        let mut session = started(VAULT);
        assert!(session.store().has("key"));
        let outcome = session.select_choice(Label::A).unwrap();
        assert!(outcome.is_checkpoint());
        assert!(!session.store().has("key"));
        assert_eq!(labels(&session), vec![Label::B, Label::C]);

        let before = session.state().clone();
        assert_eq!(
            session.select_choice(Label::A),
            Err(SessionError::ConditionNotMet {
                label: Label::A,
                condition: "key".to_string(),
            })
        );
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn unrecognized_conditions_follow_strictness() {
        let lenient = started(VAULT);
        assert_eq!(labels(&lenient), vec![Label::A, Label::B, Label::D]);

        let mut strict = session_with(VAULT, EngineConfig::default().with_strict_conditions(true));
        assert_eq!(labels(&strict), vec![Label::A, Label::B]);
        assert!(matches!(
            strict.select_choice(Label::D),
            Err(SessionError::ConditionNotMet { label: Label::D, .. })
        ));
    }

    #[test]
    fn going_back_does_not_undo_or_repeat_consequences() {
        let mut session = started(VAULT);
        session.select_choice(Label::B).unwrap();
        assert_eq!(session.store().quantity("gold"), 5);

        session.go_back().unwrap();
        assert_eq!(session.store().quantity("gold"), 5);
        session.select_choice(Label::B).unwrap();
        assert_eq!(session.store().quantity("gold"), 5);
    }

    #[test]
    fn replaying_skips_conditions_already_passed() {
        let mut session = started(VAULT);
        session.select_choice(Label::A).unwrap();
        session.go_back().unwrap();
        assert!(!session.store().has("key"));
        assert!(labels(&session).contains(&Label::A));
        assert!(session.select_choice(Label::A).unwrap().is_checkpoint());
        assert_eq!(session.position(), &step("3"));
    }

    #[test]
    fn a_different_choice_discards_the_redo_stack() {
        let mut session = started(VAULT);
        session.select_choice(Label::B).unwrap();
        session.go_back().unwrap();
        session.select_choice(Label::A).unwrap();
        assert!(session.state().redo.is_empty());

        session.go_back().unwrap();
        session.select_choice(Label::B).unwrap();
        assert_eq!(session.store().quantity("gold"), 10);
    }

    #[test]
    fn name_is_kept_only_when_asked_for() {
        let doc = adv_dsl::load_document(VAULT).unwrap();
        let mut session = Session::new(doc, EngineConfig::default()).unwrap();
        session.start(Some("  Ada "));
        assert_eq!(session.user_name(), Some("Ada"));
        session.start(Some("   "));
        assert_eq!(session.user_name(), None);

        let mut door = Session::new(adv_dsl::load_document(DOOR).unwrap(), EngineConfig::default())
            .unwrap();
        door.start(Some("Ada"));
        assert_eq!(door.user_name(), None);
    }

    #[test]
    fn restart_resets_the_store() {
        let mut session = started(VAULT);
        session.select_choice(Label::A).unwrap();
        session.start(None);
        assert!(session.store().has("key"));
        assert!(session.history().is_empty());
    }

    const EVENTS: &str = "\
[GAME_NAME] Storm [/GAME_NAME]
[MAIN_MENU] Start [/MAIN_MENU]
[STEP_1]
[NARRATIVE] Calm sea. [/NARRATIVE]
[CHOICES]
A) Sail -> STEP_2
[/CHOICES]
[STEP_2]
[NARRATIVE] Open water. [/NARRATIVE]
[CHOICES]
A) Turn back -> STEP_1
[/CHOICES]
[STEP_3]
[NARRATIVE] A storm hits. [/NARRATIVE]
[CHOICES]
A) Endure -> ENDING_NEUTRAL
[/CHOICES]
[RANDOM_EVENT]
chance: 1.0, outcome: STEP_3
[/RANDOM_EVENT]
";

    #[test]
    fn random_events_are_off_by_default() {
        let mut session = started(EVENTS);
        session.select_choice(Label::A).unwrap();
        assert_eq!(session.position(), &step("2"));
    }

    #[test]
    fn certain_random_event_redirects() {
        let mut session = session_with(EVENTS, EngineConfig::default().with_random_events(true));
        let outcome = session.select_choice(Label::A).unwrap();
        assert_eq!(
            outcome,
            Outcome::Continue {
                step: StepId::new("3").unwrap(),
                checkpoint: false,
                random_event: true,
            }
        );
        assert_eq!(
            session.history().last().unwrap(),
            &HistoryEntry {
                step: StepId::new("2").unwrap(),
                via: Via::RandomEvent(StepId::new("3").unwrap()),
            }
        );
        assert_eq!(session.go_back().unwrap(), StepId::new("2").unwrap());
    }

    #[test]
    fn replay_follows_the_original_random_event() {
        let mut session = session_with(EVENTS, EngineConfig::default().with_random_events(true));
        let first = session.select_choice(Label::A).unwrap();
        let store = session.store().clone();

        session.go_back().unwrap();
        session.go_back().unwrap();
        assert_eq!(session.position(), &step("1"));

        let again = session.select_choice(Label::A).unwrap();
        assert_eq!(again, first);
        assert_eq!(session.position(), &step("3"));
        assert_eq!(session.store(), &store);
        assert!(session.state().redo.is_empty());
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn choosing_after_undoing_a_random_event_rolls_again() {
        let mut session = session_with(EVENTS, EngineConfig::default().with_random_events(true));
        session.select_choice(Label::A).unwrap();
        assert_eq!(session.go_back().unwrap(), StepId::new("2").unwrap());

        let outcome = session.select_choice(Label::A).unwrap();
        assert!(matches!(outcome, Outcome::Continue { random_event: true, .. }));
        assert!(session.state().redo.is_empty());
    }

    #[test]
    fn random_events_repeat_for_the_same_seed() {
        let source = EVENTS.replace("chance: 1.0", "chance: 0.5");
        let walk = |seed: u64| {
            let config = EngineConfig::default()
                .with_random_events(true)
                .with_seed(seed);
            let mut session = session_with(&source, config);
            let mut positions = Vec::new();
            for _ in 0..20 {
                if matches!(session.position(), Position::Ending(_)) {
                    session.start(None);
                }
                session.select_choice(Label::A).unwrap();
                positions.push(session.position().clone());
            }
            positions
        };
        assert_eq!(walk(7), walk(7));
    }

    #[test]
    fn save_and_resume() {
        let mut session = started(VAULT);
        session.start(Some("Ada"));
        session.select_choice(Label::B).unwrap();
        session.select_choice(Label::A).unwrap();
        session.go_back().unwrap();
        let blob = session.save("slot1").unwrap();

        let doc = adv_dsl::load_document(VAULT).unwrap();
        let resumed = Session::resume(doc, EngineConfig::default(), &blob).unwrap();
        assert_eq!(resumed.state(), session.state());
        assert_eq!(resumed.user_name(), Some("Ada"));
    }

    #[test]
    fn huge_stats_survive_save_and_resume() {
        let source = "\
[GAME_NAME] Giant [/GAME_NAME]
[MAIN_MENU] Start [/MAIN_MENU]
[STATS]
hp: 1e308
[/STATS]
[STEP_1]
[NARRATIVE] Grow. [/NARRATIVE]
[CHOICES]
A) Grow more -> STEP_1 {SET stats:hp:1e308}
[/CHOICES]
";
        let mut session = started(source);
        session.select_choice(Label::A).unwrap();
        let blob = session.save("s").unwrap();

        let doc = adv_dsl::load_document(source).unwrap();
        let resumed = Session::resume(doc, EngineConfig::default(), &blob).unwrap();
        assert_eq!(resumed.state(), session.state());
    }

    #[test]
    fn resume_keeps_random_event_landings() {
        let mut session = session_with(EVENTS, EngineConfig::default().with_random_events(true));
        session.select_choice(Label::A).unwrap();
        session.go_back().unwrap();
        let blob = session.save("s").unwrap();

        let doc = adv_dsl::load_document(EVENTS).unwrap();
        let resumed = Session::resume(doc, EngineConfig::default(), &blob).unwrap();
        assert_eq!(resumed.state(), session.state());
    }

    #[test]
    fn resume_rejects_another_game() {
        let session = started(DOOR);
        let blob = session.save("s").unwrap();
        let doc = adv_dsl::load_document(VAULT).unwrap();
        match Session::resume(doc, EngineConfig::default(), &blob) {
            Err(EngineError::Session(SessionError::GameMismatch { expected, found })) => {
                assert_eq!(expected, "Vault");
                assert_eq!(found, "Test");
            }
            other => panic!("expected game mismatch, got {other:?}"),
        }
    }

    #[test]
    fn restore_rejects_unknown_steps_and_keeps_state() {
        let mut session = started(VAULT);
        session.select_choice(Label::A).unwrap();
        let blob = session.save("s").unwrap();

        let mut other = started(DOOR.replace("Test", "Vault").as_str());
        let before = other.state().clone();
        let save = save::deserialize_session(&blob).unwrap();
        assert_eq!(
            other.restore(save),
            Err(SessionError::UnknownStep(StepId::new("3").unwrap()))
        );
        assert_eq!(other.state(), &before);
    }

    #[test]
    fn resume_rejects_corrupt_blob() {
        let doc = adv_dsl::load_document(DOOR).unwrap();
        assert!(matches!(
            Session::resume(doc, EngineConfig::default(), "{\"version\": 1}"),
            Err(EngineError::CorruptSave(_))
        ));
    }

    #[derive(Debug, Clone)]
    enum Action {
        Select(char),
        Back,
        Restart,
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            4 => prop::sample::select(vec!['A', 'B', 'C', 'D']).prop_map(Action::Select),
            2 => Just(Action::Back),
            1 => Just(Action::Restart),
        ]
    }

    proptest! {
        #[test]
        fn random_walks_survive_save_and_resume(
            actions in proptest::collection::vec(action(), 0..30),
            random_events in any::<bool>(),
        ) {
            let config = EngineConfig::default().with_random_events(random_events);
            let mut session = session_with(VAULT, config.clone());
            for action in actions {
                let before = session.state().clone();
                let result = match action {
                    Action::Select(c) => session
                        .select_choice(Label::parse(&c.to_string()).unwrap())
                        .map(|_| ()),
                    Action::Back => session.go_back().map(|_| ()),
                    Action::Restart => {
                        session.start(None);
                        Ok(())
                    }
                };
                if result.is_err() {
                    prop_assert_eq!(session.state(), &before);
                }
                prop_assert!(session.store().inventory.values().all(|&q| q > 0));

                let blob = session.save("walk").unwrap();
                let doc = adv_dsl::load_document(VAULT).unwrap();
                let resumed = Session::resume(doc, config.clone(), &blob).unwrap();
                prop_assert_eq!(resumed.state(), session.state());
            }
        }
    }
}
