//! Non-fatal checks over a parsed adventure.

use std::fmt;

use adv_core::{
    AdventureDocument, Condition, Consequence, EndingKind, Label, StepId, StoryGraph,
};

/// Something an author probably wants to fix. None of these stop play.
#[derive(Debug, Clone, PartialEq)]
pub enum LintWarning {
    /// No path from `STEP_1` reaches this step.
    UnreachableStep(StepId),
    /// The step has no choices; players can only go back from it.
    DeadEnd(StepId),
    /// Step numbers skip from `after` to `next`.
    NumberingGap {
        /// Last step before the gap.
        after: StepId,
        /// First step after the gap.
        next: StepId,
    },
    /// A choice leads to an ending the document never describes.
    UndefinedEnding(EndingKind),
    /// `[CHECKPOINT]` names a step that does not exist.
    UnknownCheckpoint(StepId),
    /// A consequence the store will ignore.
    UnrecognizedConsequence {
        /// Step holding the choice.
        step: StepId,
        /// The choice.
        label: Label,
        /// Consequence text.
        text: String,
    },
    /// A condition that matches neither `item` nor `item:qty`.
    UnrecognizedCondition {
        /// Step holding the choice.
        step: StepId,
        /// The choice.
        label: Label,
        /// Condition text.
        text: String,
    },
}

impl LintWarning {
    /// The step this warning is about, if it is about one.
    pub fn step(&self) -> Option<&StepId> {
        match self {
            Self::UnreachableStep(step) | Self::DeadEnd(step) => Some(step),
            Self::NumberingGap { next, .. } => Some(next),
            Self::UnrecognizedConsequence { step, .. }
            | Self::UnrecognizedCondition { step, .. } => Some(step),
            Self::UndefinedEnding(_) | Self::UnknownCheckpoint(_) => None,
        }
    }
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreachableStep(step) => write!(f, "{step} is unreachable from STEP_1"),
            Self::DeadEnd(step) => {
                write!(f, "{step} has no choices; players can only go back")
            }
            Self::NumberingGap { after, next } => {
                write!(f, "step numbering jumps from {after} to {next}")
            }
            Self::UndefinedEnding(kind) => write!(
                f,
                "choices lead to {} but it is not defined; the default text is shown",
                kind.tag()
            ),
            Self::UnknownCheckpoint(step) => {
                write!(f, "checkpoint {step} does not name a step")
            }
            Self::UnrecognizedConsequence { step, label, text } => {
                write!(f, "{step} choice {label}: consequence {text:?} has no effect")
            }
            Self::UnrecognizedCondition { step, label, text } => write!(
                f,
                "{step} choice {label}: condition {text:?} is not `item` or `item:qty`"
            ),
        }
    }
}

/// Run every check, in a stable order.
pub fn lint(doc: &AdventureDocument) -> Vec<LintWarning> {
    let graph = StoryGraph::new(doc);
    let mut warnings = Vec::new();

    warnings.extend(
        graph
            .unreachable_steps()
            .into_iter()
            .cloned()
            .map(LintWarning::UnreachableStep),
    );
    warnings.extend(graph.dead_ends().into_iter().cloned().map(LintWarning::DeadEnd));
    warnings.extend(numbering_gaps(doc));

    for kind in graph.ending_kinds_used() {
        if !doc.endings.contains_key(&kind) {
            warnings.push(LintWarning::UndefinedEnding(kind));
        }
    }

    for checkpoint in &doc.checkpoints {
        if !graph.contains(checkpoint) {
            warnings.push(LintWarning::UnknownCheckpoint(checkpoint.clone()));
        }
    }

    for step in doc.steps.values() {
        for choice in &step.choices {
            for text in &choice.conditions {
                if let Condition::Unrecognized(text) = Condition::parse(text) {
                    warnings.push(LintWarning::UnrecognizedCondition {
                        step: step.id.clone(),
                        label: choice.label,
                        text,
                    });
                }
            }
            for text in &choice.consequences {
                if let Consequence::Unrecognized(text) = Consequence::parse(text) {
                    warnings.push(LintWarning::UnrecognizedConsequence {
                        step: step.id.clone(),
                        label: choice.label,
                        text,
                    });
                }
            }
        }
    }

    warnings
}

fn numbering_gaps(doc: &AdventureDocument) -> Vec<LintWarning> {
    let numbered: Vec<(u128, &StepId)> = doc
        .steps
        .keys()
        .filter_map(|id| id.as_str().parse().ok().map(|n| (n, id)))
        .collect();

    numbered
        .windows(2)
        .filter(|pair| pair[1].0 != pair[0].0 + 1)
        .map(|pair| LintWarning::NumberingGap {
            after: pair[0].1.clone(),
            next: pair[1].1.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    fn id(d: &str) -> StepId {
        StepId::new(d).unwrap()
    }

    #[test]
    fn clean_document_has_no_warnings() {
        let doc = parse_document(
            "\
[GAME_NAME] Clean [/GAME_NAME]
[MAIN_MENU] Start [/MAIN_MENU]
[STEP_1]
[NARRATIVE] Go. [/NARRATIVE]
[CHOICES]
A) On -> STEP_2 {IF key; USE key}
[/CHOICES]
[STEP_2]
[NARRATIVE] Done. [/NARRATIVE]
[CHOICES]
A) Finish -> ENDING_SUCCESS
[/CHOICES]
[ENDING_SUCCESS] Well done. [/ENDING_SUCCESS]
",
        )
        .unwrap();
        assert!(lint(&doc).is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let doc = parse_document(
            "\
[GAME_NAME] Messy [/GAME_NAME]
[MAIN_MENU] Start [/MAIN_MENU]
[STEP_1]
[NARRATIVE] Go. [/NARRATIVE]
[CHOICES]
A) Wait -> STEP_2 {IF health > 3; SET mood:happy}
B) Quit -> ENDING_NEUTRAL
[/CHOICES]
[STEP_2]
[NARRATIVE] Stuck. [/NARRATIVE]
[STEP_5]
[NARRATIVE] Lost. [/NARRATIVE]
[CHOICES]
A) Back -> STEP_1
[/CHOICES]
[CHECKPOINT]
STEP_7
[/CHECKPOINT]
",
        )
        .unwrap();

        assert_eq!(
            lint(&doc),
            vec![
                LintWarning::UnreachableStep(id("5")),
                LintWarning::DeadEnd(id("2")),
                LintWarning::NumberingGap {
                    after: id("2"),
                    next: id("5"),
                },
                LintWarning::UndefinedEnding(EndingKind::Neutral),
                LintWarning::UnknownCheckpoint(id("7")),
                LintWarning::UnrecognizedCondition {
                    step: id("1"),
                    label: Label::A,
                    text: "health > 3".to_string(),
                },
                LintWarning::UnrecognizedConsequence {
                    step: id("1"),
                    label: Label::A,
                    text: "SET mood:happy".to_string(),
                },
            ]
        );
    }

    #[test]
    fn only_targeted_endings_must_be_defined() {
        let doc = parse_document(
            "\
[GAME_NAME] Short [/GAME_NAME]
[MAIN_MENU] Start [/MAIN_MENU]
[STEP_1]
[NARRATIVE] Go. [/NARRATIVE]
[CHOICES]
A) Win -> ENDING_SUCCESS
B) Lose -> ENDING_FAILURE
[/CHOICES]
[ENDING_SUCCESS] Well done. [/ENDING_SUCCESS]
",
        )
        .unwrap();
        assert_eq!(
            lint(&doc),
            vec![LintWarning::UndefinedEnding(EndingKind::Failure)]
        );
    }

    #[test]
    fn warning_messages() {
        assert_eq!(
            LintWarning::DeadEnd(id("4")).to_string(),
            "STEP_4 has no choices; players can only go back"
        );
        assert_eq!(LintWarning::UndefinedEnding(EndingKind::Success).step(), None);
    }
}
