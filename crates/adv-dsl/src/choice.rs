//! Grammar for a single `CHOICES` line:
//!
//! ```text
//! <Label>) <description> -> <TARGET> { IF <cond>; SET <...>; USE <...> }
//! ```
//!
//! `→` is accepted in place of `->`. The brace block is optional.

use std::sync::LazyLock;

use adv_core::{Choice, Label, Target};
use regex::Regex;

static CHOICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z])\)\s*(.*?)\s*(?:->|→)\s*([^\s{]+)\s*(?:\{(.*)\})?\s*$")
        .expect("choice regex must compile")
});

/// Why a choice line was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChoiceSyntaxError {
    /// The line does not have the `X) description -> TARGET` shape.
    #[error("not a choice line: {0:?} (expected `A) description -> TARGET`)")]
    NoMatch(String),

    /// The label is a letter outside `A`-`D`.
    #[error("choice label {0} is not one of A, B, C, D")]
    InvalidLabel(char),

    /// Nothing between the label and the arrow.
    #[error("choice {0} has no description")]
    EmptyDescription(Label),

    /// The target is neither `STEP_<digits>` nor an ending tag.
    #[error(
        "invalid choice target {0:?}: expected STEP_<n>, ENDING_SUCCESS, ENDING_FAILURE, or ENDING_NEUTRAL"
    )]
    InvalidTarget(String),

    /// A brace extra that does not start with `IF`, `SET`, or `USE`.
    #[error("unrecognized choice directive {0:?}: expected IF, SET, or USE")]
    UnknownExtra(String),

    /// `IF` with no condition after it.
    #[error("empty condition in choice {0}")]
    EmptyCondition(Label),
}

/// Parse one non-blank line of a `CHOICES` block.
pub fn parse_choice(line: &str) -> Result<Choice, ChoiceSyntaxError> {
    let line = line.trim();
    let caps = CHOICE_LINE
        .captures(line)
        .ok_or_else(|| ChoiceSyntaxError::NoMatch(line.to_string()))?;

    let letter = &caps[1];
    let label = Label::parse(letter).ok_or_else(|| {
        ChoiceSyntaxError::InvalidLabel(letter.chars().next().unwrap_or('?'))
    })?;

    let description = caps[2].trim();
    if description.is_empty() {
        return Err(ChoiceSyntaxError::EmptyDescription(label));
    }

    let target = Target::parse(&caps[3])
        .ok_or_else(|| ChoiceSyntaxError::InvalidTarget(caps[3].to_string()))?;

    let mut choice = Choice::new(label, description, target);
    if let Some(extras) = caps.get(4) {
        for extra in extras.as_str().split(';').map(str::trim) {
            if extra.is_empty() {
                continue;
            }
            let (keyword, rest) = extra
                .split_once(char::is_whitespace)
                .unwrap_or((extra, ""));
            match keyword {
                "IF" => {
                    let condition = rest.trim();
                    if condition.is_empty() {
                        return Err(ChoiceSyntaxError::EmptyCondition(label));
                    }
                    choice.conditions.push(condition.to_string());
                }
                "SET" | "USE" if !rest.trim().is_empty() => {
                    choice.consequences.push(extra.to_string());
                }
                _ => return Err(ChoiceSyntaxError::UnknownExtra(extra.to_string())),
            }
        }
    }

    Ok(choice)
}
