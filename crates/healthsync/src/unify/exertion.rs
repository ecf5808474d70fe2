//! Per-set exertion (RPE) resolution for the strength log
//!
//! Strong stores one free-text note per exercise in a workout and repeats it on
//! every set row of that exercise. Lifters record per-set effort there as
//! `Set 2 RPE = 8.5`. The structured RPE column takes precedence when it holds
//! a positive value; otherwise the set's effort is looked up in the note.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::NotePolicy;
use crate::error::{HealthError, Result};
use crate::models::{SetRecord, StrengthSet};

const EFFORT_PATTERN: &str = r"(?i)\bset\s*(\d+)\s*(?:rpe|effort)\s*[=:]\s*(\d+(?:\.\d+)?)";

type GroupKey = (NaiveDateTime, String);

/// Distinct notes per (workout start, exercise), in first-seen order
#[derive(Debug, Default)]
pub struct NoteTable {
    groups: BTreeMap<GroupKey, Vec<String>>,
}

impl NoteTable {
    pub fn build(sets: &[StrengthSet]) -> Self {
        let mut groups: BTreeMap<GroupKey, Vec<String>> = BTreeMap::new();
        for set in sets {
            let notes = groups
                .entry((set.performed_at, set.exercise_name.clone()))
                .or_default();
            if let Some(note) = &set.note {
                if !notes.contains(note) {
                    notes.push(note.clone());
                }
            }
        }
        Self { groups }
    }

    /// The note that governs a group: the first distinct one seen
    pub fn note_for(&self, performed_at: NaiveDateTime, exercise: &str) -> Option<&str> {
        self.groups
            .get(&(performed_at, exercise.to_string()))
            .and_then(|notes| notes.first())
            .map(String::as_str)
    }

    /// Groups carrying more than one distinct note
    pub fn conflicts(&self) -> impl Iterator<Item = (&GroupKey, usize)> {
        self.groups
            .iter()
            .filter(|(_, notes)| notes.len() > 1)
            .map(|(key, notes)| (key, notes.len()))
    }
}

/// Resolves exertion for every numbered set of a strength log
#[derive(Debug)]
pub struct ExertionExtractor {
    pattern: Regex,
    policy: NotePolicy,
}

impl ExertionExtractor {
    pub fn new(policy: NotePolicy) -> Result<Self> {
        let pattern = Regex::new(EFFORT_PATTERN)
            .map_err(|e| HealthError::Other(format!("Invalid effort pattern: {}", e)))?;
        Ok(Self { pattern, policy })
    }

    /// Set number to effort mapping found in a note
    ///
    /// A set mentioned more than once takes its last value.
    pub fn efforts_in_note(&self, note: &str) -> HashMap<i32, f64> {
        self.pattern
            .captures_iter(note)
            .filter_map(|caps| {
                let set = caps.get(1)?.as_str().parse::<i32>().ok()?;
                let effort = caps.get(2)?.as_str().parse::<f64>().ok()?;
                Some((set, effort))
            })
            .collect()
    }

    /// Turn parsed sets into records with exertion resolved
    ///
    /// Sets without a numeric order (warm-ups, drop sets) are left out. Under
    /// [`NotePolicy::Strict`] a group with more than one distinct note fails
    /// the whole extraction.
    pub fn extract(&self, sets: &[StrengthSet]) -> Result<Vec<SetRecord>> {
        let notes = NoteTable::build(sets);

        for ((performed_at, exercise), count) in notes.conflicts() {
            match self.policy {
                NotePolicy::Strict => {
                    return Err(HealthError::AmbiguousNotes {
                        session: performed_at.to_string(),
                        exercise: exercise.clone(),
                        count,
                    })
                }
                NotePolicy::FirstWins => warn!(
                    session = %performed_at,
                    exercise = %exercise,
                    count,
                    "Exercise has several distinct notes, using the first"
                ),
            }
        }

        let mut parsed: HashMap<GroupKey, HashMap<i32, f64>> = HashMap::new();
        let mut skipped = 0usize;
        let mut records = Vec::with_capacity(sets.len());

        for set in sets {
            let Some(set_order) = set.set_order else {
                skipped += 1;
                continue;
            };

            let exertion = match set.explicit_effort {
                Some(effort) if effort > 0.0 => Some(effort),
                _ => parsed
                    .entry((set.performed_at, set.exercise_name.clone()))
                    .or_insert_with(|| {
                        notes
                            .note_for(set.performed_at, &set.exercise_name)
                            .map(|note| self.efforts_in_note(note))
                            .unwrap_or_default()
                    })
                    .get(&set_order)
                    .copied(),
            };

            records.push(SetRecord {
                session: set.performed_at,
                exercise_name: set.exercise_name.clone(),
                set_order,
                weight: set.weight,
                reps: set.reps.map(|r| r.trunc() as i64),
                exertion,
            });
        }

        debug!(records = records.len(), skipped, "Resolved set exertion");
        Ok(records)
    }
}
