use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::document::{AdventureDocument, EndingKind, Label, StepId, Target};
use crate::error::{ValidationError, ValidationResult};

/// A resolved outgoing edge of the step graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Step the edge leaves from.
    pub from: StepId,
    /// Label of the choice that forms this edge.
    pub label: Label,
    /// Where the choice leads.
    pub target: Target,
}

/// Read-only index over a document's steps and transition targets.
///
/// Built once per document. [`StoryGraph::validate`] resolves every target
/// up front so a dangling reference can never surface mid-session.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    steps: BTreeSet<StepId>,
    edges: BTreeMap<StepId, Vec<Edge>>,
    random_outcomes: Vec<StepId>,
}

impl StoryGraph {
    /// Index the steps and choices of a document.
    pub fn new(doc: &AdventureDocument) -> Self {
        let steps = doc.steps.keys().cloned().collect();
        let edges = doc
            .steps
            .values()
            .map(|step| {
                let out = step
                    .choices
                    .iter()
                    .map(|c| Edge {
                        from: step.id.clone(),
                        label: c.label,
                        target: c.target.clone(),
                    })
                    .collect();
                (step.id.clone(), out)
            })
            .collect();
        let random_outcomes = doc
            .random_events
            .iter()
            .map(|e| e.outcome.clone())
            .collect();

        Self {
            steps,
            edges,
            random_outcomes,
        }
    }

    /// Build and validate in one go.
    pub fn build(doc: &AdventureDocument) -> ValidationResult<Self> {
        let graph = Self::new(doc);
        graph.validate()?;
        Ok(graph)
    }

    /// Fail on the first structural error.
    pub fn validate(&self) -> ValidationResult<()> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every structural error, in step order.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.steps.contains(&StepId::start()) {
            errors.push(ValidationError::MissingStartStep);
        }

        let step_targets = self.edges().filter_map(|e| match &e.target {
            Target::Step(target) => Some((e, target)),
            Target::Ending(_) => None,
        });
        for (edge, target) in step_targets {
            if !self.steps.contains(target) {
                errors.push(ValidationError::DanglingTarget {
                    step: edge.from.clone(),
                    label: edge.label,
                    target: target.clone(),
                });
            }
        }

        for outcome in &self.random_outcomes {
            if !self.steps.contains(outcome) {
                errors.push(ValidationError::DanglingRandomEvent {
                    outcome: outcome.clone(),
                });
            }
        }

        errors
    }

    /// Whether `id` names a step.
    pub fn contains(&self, id: &StepId) -> bool {
        self.steps.contains(id)
    }

    /// Check that a target resolves: step targets must exist, ending kinds
    /// always do.
    pub fn resolve<'t>(&self, target: &'t Target) -> Option<&'t Target> {
        match target {
            Target::Step(id) if !self.steps.contains(id) => None,
            other => Some(other),
        }
    }

    /// Outgoing edges of a step, in label order.
    pub fn edges_from(&self, id: &StepId) -> &[Edge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All edges, by source step.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().flatten()
    }

    /// Steps directly reachable from `id`.
    pub fn successors(&self, id: &StepId) -> Vec<&StepId> {
        self.edges_from(id)
            .iter()
            .filter_map(|e| match &e.target {
                Target::Step(next) => Some(next),
                Target::Ending(_) => None,
            })
            .collect()
    }

    /// Steps reachable from `STEP_1` through choices and random events.
    pub fn reachable_from_start(&self) -> BTreeSet<StepId> {
        let mut seen = BTreeSet::new();
        let start = StepId::start();
        if !self.steps.contains(&start) {
            return seen;
        }

        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            for next in self.successors(&id) {
                if self.steps.contains(next) && !seen.contains(next) {
                    queue.push_back(next.clone());
                }
            }
            // Random events can fire on entering any step.
            for outcome in &self.random_outcomes {
                if self.steps.contains(outcome) && !seen.contains(outcome) {
                    queue.push_back(outcome.clone());
                }
            }
        }
        seen
    }

    /// Steps no path from `STEP_1` reaches.
    pub fn unreachable_steps(&self) -> Vec<&StepId> {
        let reachable = self.reachable_from_start();
        self.steps
            .iter()
            .filter(|id| !reachable.contains(*id))
            .collect()
    }

    /// Steps without any choices.
    pub fn dead_ends(&self) -> Vec<&StepId> {
        self.steps
            .iter()
            .filter(|id| self.edges_from(id).is_empty())
            .collect()
    }

    /// Ending kinds that at least one choice leads to.
    pub fn ending_kinds_used(&self) -> BTreeSet<EndingKind> {
        self.edges()
            .filter_map(|e| match e.target {
                Target::Ending(kind) => Some(kind),
                Target::Step(_) => None,
            })
            .collect()
    }

    /// Number of steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}
