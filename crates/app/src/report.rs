//! Coverage reports and their tabular rendering.

use std::collections::BTreeSet;
use std::fmt;

use motionlight_domain::state::UserStates;
use serde::Deserialize;

/// Label shown in place of a rule name for uncovered combinations.
pub const UNASSIGNED: &str = "UNASSIGNED";

/// Row order of a rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// By room state, then occupancy.
    #[default]
    Room,
    /// By occupancy, then room state.
    Occupancy,
    /// Enumeration order: one block per distinct user-state combination.
    Enumeration,
}

/// One evaluated combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRow {
    pub room_state: String,
    pub occupancy: String,
    /// State of every rule user, groups already folded.
    pub user_states: UserStates,
    /// Winning rule, `None` when unassigned.
    pub rule_name: Option<String>,
}

impl CoverageRow {
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.rule_name.is_none()
    }
}

/// Every reachable combination of one binding and the rule it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    binding: String,
    rows: Vec<CoverageRow>,
}

impl CoverageReport {
    #[must_use]
    pub fn new(binding: impl Into<String>, rows: Vec<CoverageRow>) -> Self {
        Self {
            binding: binding.into(),
            rows,
        }
    }

    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    #[must_use]
    pub fn rows(&self) -> &[CoverageRow] {
        &self.rows
    }

    pub fn unassigned(&self) -> impl Iterator<Item = &CoverageRow> {
        self.rows.iter().filter(|row| row.is_unassigned())
    }

    /// `true` when every combination is covered by some rule.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unassigned().next().is_none()
    }

    /// Stable sort, rows with equal keys keep their enumeration order.
    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::Room => self.rows.sort_by(|a, b| {
                (&a.room_state, &a.occupancy).cmp(&(&b.room_state, &b.occupancy))
            }),
            SortOrder::Occupancy => self.rows.sort_by(|a, b| {
                (&a.occupancy, &a.room_state).cmp(&(&b.occupancy, &b.room_state))
            }),
            SortOrder::Enumeration => {}
        }
    }

    /// Full truth table: one row per combination, with the rule name or
    /// `unassigned_label`.
    #[must_use]
    pub fn table(&self, unassigned_label: &str) -> Table {
        let users = user_columns(self.rows.iter());
        let mut table = Table::new(headers(None, &users, true));
        for row in &self.rows {
            let mut cells = Vec::with_capacity(users.len() + 3);
            cells.push(row.room_state.clone());
            cells.push(row.occupancy.clone());
            cells.extend(user_cells(row, &users));
            cells.push(
                row.rule_name
                    .clone()
                    .unwrap_or_else(|| unassigned_label.to_string()),
            );
            table.push(cells, row.is_unassigned());
        }
        table
    }
}

/// Unassigned rows of several reports in one table, prefixed with the
/// binding name and sorted by binding, room state and occupancy. User columns
/// are the union across reports; a cell is blank where a binding does not
/// depend on that user.
#[must_use]
pub fn unassigned_table(reports: &[CoverageReport]) -> Table {
    let mut rows: Vec<(&str, &CoverageRow)> = reports
        .iter()
        .flat_map(|report| report.unassigned().map(move |row| (report.binding(), row)))
        .collect();
    rows.sort_by(|(a_binding, a), (b_binding, b)| {
        (a_binding, &a.room_state, &a.occupancy).cmp(&(b_binding, &b.room_state, &b.occupancy))
    });

    let users = user_columns(rows.iter().map(|(_, row)| *row));
    let mut table = Table::new(headers(Some("light_group"), &users, false));
    for (binding, row) in rows {
        let mut cells = Vec::with_capacity(users.len() + 3);
        cells.push(binding.to_string());
        cells.push(row.room_state.clone());
        cells.push(row.occupancy.clone());
        cells.extend(user_cells(row, &users));
        table.push(cells, true);
    }
    table
}

fn user_columns<'a>(rows: impl Iterator<Item = &'a CoverageRow>) -> BTreeSet<&'a str> {
    rows.flat_map(|row| row.user_states.keys().map(String::as_str))
        .collect()
}

fn headers(prefix: Option<&str>, users: &BTreeSet<&str>, with_rule: bool) -> Vec<String> {
    let mut headers: Vec<String> = prefix.iter().map(ToString::to_string).collect();
    headers.push("room_state".into());
    headers.push("occupancy".into());
    headers.extend(users.iter().map(|user| format!("user: {user}")));
    if with_rule {
        headers.push("rule_name".into());
    }
    headers
}

fn user_cells<'a>(
    row: &'a CoverageRow,
    users: &'a BTreeSet<&str>,
) -> impl Iterator<Item = String> + 'a {
    users.iter().map(|user| {
        row.user_states
            .get(*user)
            .map(ToString::to_string)
            .unwrap_or_default()
    })
}

/// Plain-text table with left-aligned, space-padded columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<(Vec<String>, bool)>,
}

impl Table {
    fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, cells: Vec<String>, highlighted: bool) {
        self.rows.push((cells, highlighted));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Render the table, passing every highlighted line through `highlight`
    /// after padding.
    pub fn render(&self, highlight: impl Fn(&str) -> String) -> String {
        let widths = self.widths();
        let mut out = String::new();

        out.push_str(&pad_line(&self.headers, &widths));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("  "));
        out.push('\n');

        for (cells, highlighted) in &self.rows {
            let line = pad_line(cells, &widths);
            if *highlighted {
                out.push_str(&highlight(&line));
            } else {
                out.push_str(&line);
            }
            out.push('\n');
        }
        out
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for (cells, _) in &self.rows {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }
}

fn pad_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(ToString::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motionlight_domain::state::StateValue;

    fn row(room: &str, occupancy: &str, alice: &str, rule: Option<&str>) -> CoverageRow {
        CoverageRow {
            room_state: room.into(),
            occupancy: occupancy.into(),
            user_states: UserStates::from([("alice".to_string(), StateValue::from(alice))]),
            rule_name: rule.map(ToString::to_string),
        }
    }

    fn report() -> CoverageReport {
        CoverageReport::new(
            "kitchen",
            vec![
                row("night", "occupied", "awake", Some("bright")),
                row("day", "empty", "awake", None),
                row("day", "occupied", "awake", Some("bright")),
            ],
        )
    }

    #[test]
    fn should_sort_by_room_then_occupancy() {
        let mut report = report();
        report.sort(SortOrder::Room);
        let keys: Vec<(&str, &str)> = report
            .rows()
            .iter()
            .map(|r| (r.room_state.as_str(), r.occupancy.as_str()))
            .collect();
        assert_eq!(
            keys,
            [("day", "empty"), ("day", "occupied"), ("night", "occupied")]
        );
    }

    #[test]
    fn should_sort_by_occupancy_then_room() {
        let mut report = report();
        report.sort(SortOrder::Occupancy);
        let keys: Vec<(&str, &str)> = report
            .rows()
            .iter()
            .map(|r| (r.occupancy.as_str(), r.room_state.as_str()))
            .collect();
        assert_eq!(
            keys,
            [("empty", "day"), ("occupied", "day"), ("occupied", "night")]
        );
    }

    #[test]
    fn should_keep_enumeration_order() {
        let mut report = report();
        report.sort(SortOrder::Enumeration);
        assert_eq!(report.rows()[0].room_state, "night");
    }

    #[test]
    fn should_report_incomplete_when_any_row_unassigned() {
        let report = report();
        assert!(!report.is_complete());
        assert_eq!(report.unassigned().count(), 1);
    }

    #[test]
    fn should_render_unassigned_label_in_truth_table() {
        let mut report = report();
        report.sort(SortOrder::Room);
        let rendered = report.table(UNASSIGNED).to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines[0],
            "room_state  occupancy  user: alice  rule_name"
        );
        assert_eq!(lines[2], "day         empty      awake        UNASSIGNED");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn should_highlight_only_unassigned_lines() {
        let rendered = report()
            .table(UNASSIGNED)
            .render(|line| format!(">{line}"));
        let highlighted: Vec<&str> = rendered.lines().filter(|l| l.starts_with('>')).collect();
        assert_eq!(highlighted.len(), 1);
        assert!(highlighted[0].contains(UNASSIGNED));
    }

    #[test]
    fn should_collect_unassigned_rows_across_bindings() {
        let other = CoverageReport::new(
            "attic",
            vec![CoverageRow {
                room_state: "day".into(),
                occupancy: "occupied".into(),
                user_states: UserStates::from([("bob".to_string(), StateValue::from("asleep"))]),
                rule_name: None,
            }],
        );
        let table = unassigned_table(&[report(), other]);
        let rendered = table.to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(table.len(), 2);
        assert!(lines[0].starts_with("light_group"));
        assert!(lines[0].contains("user: alice"));
        assert!(lines[0].contains("user: bob"));
        assert!(!lines[0].contains("rule_name"));
        assert!(lines[2].starts_with("attic"));
        assert!(lines[3].starts_with("kitchen"));
    }

    #[test]
    fn should_render_empty_table_with_headers_only() {
        let table = unassigned_table(&[]);
        assert!(table.is_empty());
        assert_eq!(table.to_string().lines().count(), 2);
    }
}
