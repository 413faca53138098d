use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use vidchat_client::RunSummary;
use vidchat_normalize::{Diagnostics, RemapRule, RuleSet};

use crate::commands::FetchOutcome;

/// Run totals and non-empty diagnostics, on stderr.
pub fn print_summary(outcome: &FetchOutcome) {
    eprintln!("Video: {}", outcome.video_id);
    eprintln!("{}", run_table(&outcome.summary));
    if let Some(table) = diagnostics_table(&outcome.summary.diagnostics) {
        eprintln!();
        eprintln!("Diagnostics:");
        eprintln!("{table}");
    }
}

pub fn print_rules(rules: &RuleSet) {
    println!("{}", rules_table(rules));
}

fn run_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Mode"), header_cell(&mode_label(summary))]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    let rows = [
        ("Emitted", summary.emitted, Color::Green),
        ("Duplicates skipped", summary.duplicates_skipped, Color::Yellow),
        ("Records failed", summary.records_failed, Color::Red),
        ("Requests", summary.requests, Color::Reset),
        ("Retries", summary.retries, Color::Yellow),
        ("Windows failed", summary.windows_failed, Color::Red),
        ("Polls failed", summary.polls_failed, Color::Red),
    ];
    for (label, count, color) in rows {
        table.add_row(vec![Cell::new(label), count_cell(count, color)]);
    }
    table.add_row(vec![Cell::new("Stopped by"), stop_cell(summary)]);
    table
}

fn diagnostics_table(diagnostics: &Diagnostics) -> Option<Table> {
    let groups: [(&str, &BTreeMap<String, u64>, Color); 4] = [
        ("unknown key", &diagnostics.unknown_keys, Color::DarkGrey),
        ("unknown variant", &diagnostics.unknown_variants, Color::Yellow),
        ("transform failure", &diagnostics.transform_failures, Color::Red),
        ("missing field", &diagnostics.missing_fields, Color::Yellow),
    ];
    if groups.iter().all(|(_, entries, _)| entries.is_empty()) {
        return None;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Key"),
        header_cell("Count"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (kind, entries, color) in groups {
        for (key, count) in entries {
            table.add_row(vec![
                Cell::new(kind).fg(color),
                Cell::new(key),
                Cell::new(count),
            ]);
        }
    }
    Some(table)
}

fn rules_table(rules: &RuleSet) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Raw field"),
        header_cell("Output field"),
        header_cell("Transform"),
    ]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    for rule_table in rules.tables() {
        let entity = rule_table.entity();
        for (source, rule) in rule_table.iter() {
            let transform = match rule {
                RemapRule::Rename(_) => dim_cell("-"),
                RemapRule::Transform { transform, .. } => Cell::new(transform).fg(Color::Cyan),
            };
            table.add_row(vec![
                Cell::new(entity).fg(Color::Blue),
                Cell::new(source),
                Cell::new(rule.target()),
                transform,
            ]);
        }
    }
    table
}

fn mode_label(summary: &RunSummary) -> String {
    summary
        .mode
        .map_or_else(|| "-".to_string(), |mode| mode.to_string())
}

fn stop_cell(summary: &RunSummary) -> Cell {
    if summary.limit_reached {
        Cell::new("message limit").fg(Color::Yellow)
    } else if summary.cancelled {
        Cell::new("cancelled").fg(Color::Yellow)
    } else {
        dim_cell("end of range")
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use vidchat_client::Mode;
    use vidchat_normalize::Entity;

    use super::*;

    #[test]
    fn run_table_lists_counters() {
        let summary = RunSummary {
            mode: Some(Mode::VodPaginate),
            emitted: 12,
            requests: 4,
            windows_failed: 1,
            limit_reached: true,
            ..RunSummary::default()
        };
        let rendered = run_table(&summary).to_string();
        assert!(rendered.contains("vod_paginate"));
        assert!(rendered.contains("Windows failed"));
        assert!(rendered.contains("Emitted"));
        assert!(rendered.contains("12"));
        assert!(rendered.contains("message limit"));
    }

    #[test]
    fn clean_diagnostics_have_no_table() {
        assert!(diagnostics_table(&Diagnostics::default()).is_none());

        let mut diagnostics = Diagnostics::default();
        diagnostics.record_unknown_key(Entity::Message, "brand_new_field");
        let rendered = diagnostics_table(&diagnostics).unwrap().to_string();
        assert!(rendered.contains("message.brand_new_field"));
    }

    #[test]
    fn rules_table_has_a_row_per_rule() {
        let rules = RuleSet::builtin();
        let table = rules_table(&rules);
        let expected: usize = rules.tables().iter().map(|t| t.len()).sum();
        assert_eq!(table.row_iter().count(), expected);
    }
}
