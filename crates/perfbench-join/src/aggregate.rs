//! Aggregation of `result` section items
//!
//! Result items are never diffed. Each comparator contributes its chart
//! series, its result tables and its log link to the merged report under its
//! own name.

use perfbench_report::{Attributed, ChartSeries, Item, ItemData, ItemKind, Report, Section, RESULT_SECTION};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Fold one comparator's result section into the merged report
///
/// `wrapped` tracks result items whose reference value has already been
/// turned into an attributed list, so later comparators only append.
pub(crate) fn aggregate_results(
    merged: &mut Report,
    comparator: &Report,
    reference_name: &str,
    comparator_name: &str,
    wrapped: &mut HashSet<String>,
) {
    let Some(results) = comparator.section(RESULT_SECTION) else {
        debug!(report = comparator_name, "no result section to aggregate");
        return;
    };

    for (name, item) in &results.reports {
        match item.kind() {
            ItemKind::Chart => append_series(merged, name, item, comparator_name),
            ItemKind::Table => append_rows(merged, name, item, reference_name, comparator_name, wrapped),
            ItemKind::Link => append_link(merged, name, item, reference_name, comparator_name, wrapped),
            ItemKind::PlainText => {
                debug!(item = %name, report = comparator_name, "plain text result item not aggregated");
            }
        }
    }
}

fn append_series(merged: &mut Report, name: &str, item: &Item, comparator_name: &str) {
    let Some(series) = item.data.as_chart().and_then(|chart| chart.series.first()) else {
        warn!(item = %name, report = comparator_name, "comparator chart has no series");
        return;
    };
    let Some(chart) = merged
        .item_mut(RESULT_SECTION, name)
        .and_then(|target| target.data.as_chart_mut())
    else {
        warn!(item = %name, "reference has no chart to extend");
        return;
    };
    chart
        .series
        .push(ChartSeries::new(comparator_name, series.data.clone()));
}

fn append_rows(
    merged: &mut Report,
    name: &str,
    item: &Item,
    reference_name: &str,
    comparator_name: &str,
    wrapped: &mut HashSet<String>,
) {
    let Some(target) = merged.item_mut(RESULT_SECTION, name) else {
        warn!(item = %name, "reference has no table to extend");
        return;
    };
    wrap_reference(target, name, reference_name, wrapped);
    push_attributed(target, comparator_name, item.data.clone());
}

fn append_link(
    merged: &mut Report,
    name: &str,
    item: &Item,
    reference_name: &str,
    comparator_name: &str,
    wrapped: &mut HashSet<String>,
) {
    let ItemData::Text(path) = &item.data else {
        debug!(item = %name, report = comparator_name, "comparator link is empty");
        return;
    };

    let section = merged
        .sections
        .entry(RESULT_SECTION.to_string())
        .or_insert_with(Section::new);
    let target = section.reports.entry(name.to_string()).or_insert_with(|| {
        debug!(item = %name, "materializing link on reference");
        wrapped.insert(name.to_string());
        let mut link = item.clone();
        link.data = ItemData::Attributed(Vec::new());
        link
    });
    wrap_reference(target, name, reference_name, wrapped);
    push_attributed(target, comparator_name, ItemData::Text(path.clone()));
}

fn wrap_reference(target: &mut Item, name: &str, reference_name: &str, wrapped: &mut HashSet<String>) {
    if wrapped.insert(name.to_string()) {
        let own = std::mem::take(&mut target.data);
        target.data = ItemData::Attributed(vec![Attributed::new(reference_name, own)]);
    }
}

fn push_attributed(target: &mut Item, report: &str, value: ItemData) {
    if let ItemData::Attributed(entries) = &mut target.data {
        entries.push(Attributed::new(report, value));
    }
}
