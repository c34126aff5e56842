//! Left fold of comparator reports into the reference

use crate::aggregate::aggregate_results;
use crate::compare::data_equal;
use crate::error::JoinError;
use crate::task::JoinTask;
use chrono::{Local, NaiveDateTime};
use perfbench_report::{Attributed, ItemData, Report, StepKey, RESULT_SECTION};
use std::collections::HashSet;
use tracing::{debug, info};

/// Header prefix of every merged report
pub const JOINED_HEADER: &str = "Result of joined reports";

/// Timestamp format of the merged header
const HEADER_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Pending change to one reference item
#[derive(Debug)]
enum Update {
    /// First divergence: wrap the reference value and the comparator value
    Start(StepKey, ItemData),
    /// Item already diffed by an earlier comparator
    Append(StepKey, ItemData),
}

/// Bookkeeping carried across comparators
#[derive(Debug, Default)]
struct FoldState {
    diffed: HashSet<StepKey>,
    wrapped: HashSet<String>,
}

/// Merges named reports into one comparison report
///
/// The first report is the reference. Every other report is folded into a
/// copy of it strictly in input order: diverging items become per-report
/// lists with a `" | Diff"` header marker, `result` items are aggregated, and
/// a divergence on a must-match field aborts the whole merge.
#[derive(Debug, Clone)]
pub struct ReportJoiner {
    task: JoinTask,
}

impl ReportJoiner {
    /// Create a joiner for a task
    #[must_use]
    pub fn new(task: JoinTask) -> Self {
        Self { task }
    }

    /// The join task in use
    #[inline]
    #[must_use]
    pub fn task(&self) -> &JoinTask {
        &self.task
    }

    /// Merge `(name, report)` pairs, stamping the header with the local time
    ///
    /// # Errors
    /// See [`ReportJoiner::merge_at`].
    pub fn merge(&self, reports: &[(String, Report)]) -> Result<Report, JoinError> {
        self.merge_at(reports, Local::now().naive_local())
    }

    /// Merge `(name, report)` pairs, stamping the header with `at`
    ///
    /// # Errors
    /// Returns [`JoinError::EmptyInput`] for an empty list,
    /// [`JoinError::StructuralMismatch`] when step lists disagree and
    /// [`JoinError::AllowlistedMismatch`] when a must-match field differs.
    /// No merged report is produced in any of these cases.
    pub fn merge_at(
        &self,
        reports: &[(String, Report)],
        at: NaiveDateTime,
    ) -> Result<Report, JoinError> {
        let Some(((reference_name, reference), comparators)) = reports.split_first() else {
            return Err(JoinError::EmptyInput);
        };

        let mut merged = reference.clone();
        let mut state = FoldState::default();

        for (comparator_name, comparator) in comparators {
            info!(reference = %reference_name, comparator = %comparator_name, "joining report");
            let updates = self.compare(&merged, reference_name, comparator, comparator_name, &state)?;
            apply(&mut merged, updates, reference_name, comparator_name, &mut state);
            aggregate_results(
                &mut merged,
                comparator,
                reference_name,
                comparator_name,
                &mut state.wrapped,
            );
        }

        let names: Vec<&str> = reports.iter().map(|(name, _)| name.as_str()).collect();
        merged.header = format!("{JOINED_HEADER} {}", at.format(HEADER_TIME_FORMAT));
        merged.description = format!(
            "\nComparison Reports:\n{}\n\nJoined by:\n{}",
            names.join("\n"),
            self.task.raw_text()
        );
        info!(reports = names.len(), diffs = state.diffed.len(), "join complete");
        Ok(merged)
    }

    fn compare(
        &self,
        merged: &Report,
        reference_name: &str,
        comparator: &Report,
        comparator_name: &str,
        state: &FoldState,
    ) -> Result<Vec<Update>, JoinError> {
        let ours = merged.steps();
        let theirs = comparator.steps();

        let structural = |index: usize, detail: String| JoinError::StructuralMismatch {
            index,
            reference: reference_name.to_string(),
            comparator: comparator_name.to_string(),
            detail,
        };
        if let Some((a, b)) = ours.iter().zip(&theirs).find(|(a, b)| !a.same_slot(b)) {
            return Err(structural(a.index, format!("{} != {}", a.key(), b.key())));
        }
        if ours.len() != theirs.len() {
            return Err(structural(
                ours.len().min(theirs.len()),
                format!("{} steps != {} steps", ours.len(), theirs.len()),
            ));
        }

        let mut updates = Vec::new();
        for (a, b) in ours.iter().zip(&theirs) {
            if a.section == RESULT_SECTION {
                continue;
            }
            let key = a.key();
            if state.diffed.contains(&key) {
                updates.push(Update::Append(key, b.item.data.clone()));
                continue;
            }
            if data_equal(&a.item.data, &b.item.data) {
                continue;
            }

            let path = a.field_path();
            if self.task.is_allowlisted(&path) {
                return Err(JoinError::AllowlistedMismatch {
                    reference: reference_name.to_string(),
                    comparator: comparator_name.to_string(),
                    path,
                });
            }
            debug!(section = a.section, item = a.item_name, "values differ");
            updates.push(Update::Start(key, b.item.data.clone()));
        }
        Ok(updates)
    }
}

fn apply(
    merged: &mut Report,
    updates: Vec<Update>,
    reference_name: &str,
    comparator_name: &str,
    state: &mut FoldState,
) {
    for update in updates {
        match update {
            Update::Start(key, value) => {
                if let Some(item) = merged.item_mut(&key.section, &key.item) {
                    let own = std::mem::take(&mut item.data);
                    item.data = ItemData::Attributed(vec![
                        Attributed::new(reference_name, own),
                        Attributed::new(comparator_name, value),
                    ]);
                    item.mark_diff();
                    info!(section = %key.section, item = %key.item, "diff recorded");
                }
                state.diffed.insert(key);
            }
            Update::Append(key, value) => {
                if let Some(ItemData::Attributed(entries)) =
                    merged.item_mut(&key.section, &key.item).map(|item| &mut item.data)
                {
                    entries.push(Attributed::new(comparator_name, value));
                }
            }
        }
    }
}
