//! Reconciler - brings the displayed menu in line with a snapshot
//!
//! The reconciler owns the [`PresentationShell`] and one [`RenderedNode`] per
//! displayed level. Each tick it diffs the node list against the new snapshot
//! and issues the smallest set of shell mutations that makes them match.
//!
//! ## Architecture
//!
//! ```text
//! Snapshot.levels            RenderedNode list (previous tick)
//!     │                              │
//!     └──────── correlate ───────────┘   positional or by level name
//!                   │
//!      ┌────────────┼──────────────┬────────────────┐
//!      ▼            ▼              ▼                ▼
//!  survivor:     missing:       excess:         keyed only:
//!  label/value   create         destroy         move into
//!  in place,     category +                     display order
//!  rows rebuilt  rows
//!  if changed
//! ```
//!
//! Detail identity is not tracked: when any row of a category differs, all of
//! that category's rows are rebuilt.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use levelbar_types::{Level, Snapshot};
use serde::{Deserialize, Serialize};

use crate::format::count_label;
use crate::link::ResourceOpener;
use crate::shell::{DetailRow, PresentationShell};

/// How old nodes are matched with new levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correlation {
    /// Node `i` displays level `i`. A renamed level at the same index is
    /// relabeled in place.
    #[default]
    Positional,
    /// Nodes follow their level name; position only decides display order.
    ByName,
}

/// Display settings applied to every rendered node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub max_subject_length: usize,
    pub resource_base_url: String,
    pub correlation: Correlation,
}

/// Counts of what one reconciliation changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    /// Surviving nodes whose label, value or rows changed.
    pub updated: usize,
    pub destroyed: usize,
    pub moved: usize,
    /// Surviving nodes whose detail rows were rebuilt.
    pub rows_rebuilt: usize,
}

impl ReconcileReport {
    /// True when nothing on screen changed apart from the total label.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// What is displayed for one level.
struct RenderedNode<C> {
    /// Stable identity within this reconciler.
    serial: u64,
    name: String,
    value: i64,
    category: C,
    details: Vec<DetailRow>,
}

// ============================================================================
// RECONCILER
// ============================================================================

/// Owns the shell and the rendered node list.
pub struct Reconciler<S: PresentationShell> {
    shell: S,
    nodes: Vec<RenderedNode<S::Category>>,
    settings: RenderSettings,
    opener: Arc<dyn ResourceOpener>,
    next_serial: u64,
}

impl<S: PresentationShell> Reconciler<S> {
    pub fn new(shell: S, settings: RenderSettings, opener: Arc<dyn ResourceOpener>) -> Self {
        Self {
            shell,
            nodes: Vec::new(),
            settings,
            opener,
            next_serial: 0,
        }
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Number of rendered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `(name, value)` of each rendered node, in display order.
    pub fn rendered(&self) -> Vec<(String, i64)> {
        self.nodes.iter().map(|n| (n.name.clone(), n.value)).collect()
    }

    /// Reconcile the displayed menu with `snapshot`.
    ///
    /// Idempotent: applying the same snapshot twice changes nothing the second
    /// time. Never fails; a snapshot with no levels empties the menu.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        self.shell.set_total_label(&count_label(snapshot.total));

        let report = match self.settings.correlation {
            Correlation::Positional => self.reconcile_positional(&snapshot.levels),
            Correlation::ByName => self.reconcile_keyed(&snapshot.levels),
        };

        self.shell.present();
        tracing::debug!(
            total = snapshot.total,
            levels = snapshot.levels.len(),
            created = report.created,
            updated = report.updated,
            destroyed = report.destroyed,
            moved = report.moved,
            rows_rebuilt = report.rows_rebuilt,
            "reconciled menu"
        );
        report
    }

    /// Structural pass: discard every node and build the menu from scratch.
    pub fn rebuild(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        let mut report = ReconcileReport {
            destroyed: self.teardown(),
            ..Default::default()
        };

        self.shell.set_total_label(&count_label(snapshot.total));
        for level in &snapshot.levels {
            let node = self.create_node(level);
            self.nodes.push(node);
            report.created += 1;
        }
        self.shell.present();
        report
    }

    /// Value-only pass: refresh values and rows of the nodes that already
    /// exist, and drop nodes beyond the snapshot's level count.
    ///
    /// Creates nothing and leaves labels alone; pair with [`rebuild`] when
    /// the set of levels may have grown.
    ///
    /// [`rebuild`]: Self::rebuild
    pub fn refresh_values(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        self.shell.set_total_label(&count_label(snapshot.total));

        for (node, level) in self.nodes.iter_mut().zip(&snapshot.levels) {
            let rows = bind_rows(&self.settings, &self.opener, level);
            self.shell
                .set_category_value(&node.category, &count_label(level.value));
            node.value = level.value;
            replace_rows(&mut self.shell, node, rows);
            report.updated += 1;
            report.rows_rebuilt += 1;
        }

        report.destroyed = self.destroy_from(snapshot.levels.len());
        self.shell.present();
        report
    }

    /// Destroy every rendered node. Returns how many were destroyed.
    pub fn teardown(&mut self) -> usize {
        self.destroy_from(0)
    }

    // ------------------------------------------------------------------------

    fn reconcile_positional(&mut self, levels: &[Level]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (node, level) in self.nodes.iter_mut().zip(levels) {
            let rows = bind_rows(&self.settings, &self.opener, level);
            tally(&mut report, update_node(&mut self.shell, node, level, rows));
        }

        report.destroyed = self.destroy_from(levels.len());

        for level in levels.iter().skip(self.nodes.len()) {
            let node = self.create_node(level);
            self.nodes.push(node);
            report.created += 1;
        }

        report
    }

    fn reconcile_keyed(&mut self, levels: &[Level]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let old = std::mem::take(&mut self.nodes);
        let mut shell_order: Vec<u64> = old.iter().map(|n| n.serial).collect();

        // Duplicate names are matched in their old relative order.
        let mut pool: IndexMap<String, VecDeque<RenderedNode<S::Category>>> = IndexMap::new();
        for node in old {
            pool.entry(node.name.clone()).or_default().push_back(node);
        }

        let mut next = Vec::with_capacity(levels.len());
        let mut created = Vec::new();
        for level in levels {
            match pool.get_mut(&level.name).and_then(|queue| queue.pop_front()) {
                Some(mut node) => {
                    let rows = bind_rows(&self.settings, &self.opener, level);
                    tally(&mut report, update_node(&mut self.shell, &mut node, level, rows));
                    next.push(node);
                }
                None => {
                    let node = self.create_node(level);
                    created.push(node.serial);
                    next.push(node);
                    report.created += 1;
                }
            }
        }

        let mut destroyed = HashSet::new();
        for node in pool.into_values().flatten() {
            destroyed.insert(node.serial);
            self.shell.destroy_category(node.category);
            report.destroyed += 1;
        }

        // Survivors keep their old relative order, new categories were appended.
        shell_order.retain(|serial| !destroyed.contains(serial));
        shell_order.extend(created);

        for (position, node) in next.iter().enumerate() {
            if shell_order.get(position) == Some(&node.serial) {
                continue;
            }
            if let Some(from) = shell_order.iter().position(|s| *s == node.serial) {
                let serial = shell_order.remove(from);
                shell_order.insert(position, serial);
                self.shell.move_category(&node.category, position);
                report.moved += 1;
            }
        }

        self.nodes = next;
        report
    }

    fn create_node(&mut self, level: &Level) -> RenderedNode<S::Category> {
        let serial = self.next_serial;
        self.next_serial += 1;

        let category = self
            .shell
            .create_category(&level.name, &count_label(level.value));
        let details = bind_rows(&self.settings, &self.opener, level);
        for row in &details {
            self.shell.add_detail(&category, row.clone());
        }

        RenderedNode {
            serial,
            name: level.name.clone(),
            value: level.value,
            category,
            details,
        }
    }

    /// Destroy nodes at `index..`, returning how many were destroyed.
    fn destroy_from(&mut self, index: usize) -> usize {
        if index >= self.nodes.len() {
            return 0;
        }
        let excess = self.nodes.split_off(index);
        let count = excess.len();
        for node in excess {
            self.shell.destroy_category(node.category);
        }
        count
    }
}

// ============================================================================
// NODE UPDATES
// ============================================================================

/// What changed on one surviving node.
#[derive(Default)]
struct NodeChange {
    relabeled: bool,
    revalued: bool,
    rows_rebuilt: bool,
}

fn tally(report: &mut ReconcileReport, change: NodeChange) {
    if change.relabeled || change.revalued || change.rows_rebuilt {
        report.updated += 1;
    }
    if change.rows_rebuilt {
        report.rows_rebuilt += 1;
    }
}

fn bind_rows(
    settings: &RenderSettings,
    opener: &Arc<dyn ResourceOpener>,
    level: &Level,
) -> Vec<DetailRow> {
    level
        .details
        .iter()
        .map(|detail| {
            DetailRow::bind(
                detail,
                settings.max_subject_length,
                &settings.resource_base_url,
                opener.clone(),
            )
        })
        .collect()
}

/// Update a surviving node in place.
fn update_node<S: PresentationShell>(
    shell: &mut S,
    node: &mut RenderedNode<S::Category>,
    level: &Level,
    rows: Vec<DetailRow>,
) -> NodeChange {
    let mut change = NodeChange::default();

    if node.name != level.name {
        shell.set_category_label(&node.category, &level.name);
        node.name = level.name.clone();
        change.relabeled = true;
    }

    if node.value != level.value {
        shell.set_category_value(&node.category, &count_label(level.value));
        node.value = level.value;
        change.revalued = true;
    }

    let unchanged = node.details.len() == rows.len()
        && node.details.iter().zip(&rows).all(|(a, b)| a.same_as(b));
    if !unchanged {
        replace_rows(shell, node, rows);
        change.rows_rebuilt = true;
    }

    change
}

fn replace_rows<S: PresentationShell>(
    shell: &mut S,
    node: &mut RenderedNode<S::Category>,
    rows: Vec<DetailRow>,
) {
    shell.clear_details(&node.category);
    for row in &rows {
        shell.add_detail(&node.category, row.clone());
    }
    node.details = rows;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::RecordingOpener;
    use crate::memory::{MemoryShell, ShellOp};
    use levelbar_types::Detail;
    use pretty_assertions::assert_eq;

    const BASE: &str = "https://helpdesk.example/staff/index.php?";

    fn reconciler(correlation: Correlation) -> (Reconciler<MemoryShell>, MemoryShell, RecordingOpener) {
        let shell = MemoryShell::new();
        let opener = RecordingOpener::new();
        let settings = RenderSettings {
            max_subject_length: 45,
            resource_base_url: BASE.to_string(),
            correlation,
        };
        let reconciler = Reconciler::new(shell.clone(), settings, Arc::new(opener.clone()));
        (reconciler, shell, opener)
    }

    fn snapshot(levels: &[(&str, i64)]) -> Snapshot {
        let levels: Vec<Level> = levels
            .iter()
            .map(|(name, value)| {
                let mut level = Level::new(*name, *value);
                for i in 0..*value {
                    level = level.with_detail(Detail::new(format!("{name}-{i}"), format!("{name} #{i}")));
                }
                level
            })
            .collect();
        let total = levels.iter().map(|l| l.value).sum();
        Snapshot::new(total, levels)
    }

    fn labels_and_values(shell: &MemoryShell) -> Vec<(String, String)> {
        shell
            .categories()
            .into_iter()
            .map(|c| (c.label, c.value))
            .collect()
    }

    #[test]
    fn test_printer_jam_scenario() {
        let (mut reconciler, shell, opener) = reconciler(Correlation::Positional);
        let snap = Snapshot::new(
            5,
            vec![Level::new("Open", 5).with_detail(Detail::new(1u64, "Printer jam"))],
        );

        reconciler.reconcile(&snap);

        assert_eq!(shell.total_label(), "5");
        let categories = shell.categories();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].label, "Open");
        assert_eq!(categories[0].value, "5");
        assert_eq!(categories[0].details.len(), 1);
        assert_eq!(categories[0].details[0].label, "Printer jam");

        assert!(shell.activate_detail(0));
        assert_eq!(
            opener.opened(),
            vec![format!("{BASE}/Tickets/Ticket/View/1")]
        );
    }

    #[test]
    fn test_from_empty_creates_one_node_per_level() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        let snap = snapshot(&[("Open", 3), ("Hold", 1), ("Closed", 0)]);

        let report = reconciler.reconcile(&snap);

        assert_eq!(report.created, 3);
        assert_eq!(reconciler.len(), 3);
        assert_eq!(
            reconciler.rendered(),
            vec![("Open".to_string(), 3), ("Hold".to_string(), 1), ("Closed".to_string(), 0)]
        );
        assert_eq!(
            labels_and_values(&shell),
            vec![
                ("Open".to_string(), "3".to_string()),
                ("Hold".to_string(), "1".to_string()),
                ("Closed".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        for correlation in [Correlation::Positional, Correlation::ByName] {
            let (mut reconciler, shell, _) = reconciler(correlation);
            let snap = snapshot(&[("Open", 2), ("Hold", 1)]);

            reconciler.reconcile(&snap);
            let first = labels_and_values(&shell);
            shell.take_journal();

            let report = reconciler.reconcile(&snap);

            assert!(report.is_noop(), "{correlation:?}: {report:?}");
            assert_eq!(labels_and_values(&shell), first);
            assert_eq!(
                shell.take_journal(),
                vec![ShellOp::SetTotal("3".to_string()), ShellOp::Present]
            );
        }
    }

    #[test]
    fn test_shrink_destroys_trailing_nodes() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.reconcile(&snapshot(&[("Open", 3), ("Hold", 1), ("Pending", 2)]));
        let survivors: Vec<_> = shell.categories().iter().map(|c| c.id).collect();
        shell.take_journal();

        let report = reconciler.reconcile(&snapshot(&[("Open", 7)]));

        assert_eq!(report.destroyed, 2);
        assert_eq!(report.created, 0);
        let state = shell.state();
        assert_eq!(state.count_ops(|op| matches!(op, ShellOp::Destroy(_))), 2);
        assert!(state.journal.contains(&ShellOp::Destroy(survivors[1])));
        assert!(state.journal.contains(&ShellOp::Destroy(survivors[2])));
        assert_eq!(state.categories.len(), 1);
        assert_eq!(state.categories[0].id, survivors[0]);
        assert_eq!(state.categories[0].value, "7");
        assert_eq!(state.total_label, "7");
    }

    #[test]
    fn test_growth_appends_new_nodes() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.reconcile(&snapshot(&[("Open", 1)]));
        shell.take_journal();

        let report = reconciler.reconcile(&snapshot(&[("Open", 1), ("Hold", 2)]));

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(reconciler.len(), 2);
        assert_eq!(shell.categories()[1].label, "Hold");
    }

    #[test]
    fn test_empty_snapshot_destroys_everything() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.reconcile(&snapshot(&[("Open", 1), ("Hold", 2)]));

        let report = reconciler.reconcile(&Snapshot::empty());

        assert_eq!(report.destroyed, 2);
        assert!(reconciler.is_empty());
        assert!(shell.categories().is_empty());
        assert_eq!(shell.total_label(), "0");
    }

    #[test]
    fn test_positional_relabels_in_place() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.reconcile(&snapshot(&[("Open", 1), ("Hold", 1)]));
        let ids: Vec<_> = shell.categories().iter().map(|c| c.id).collect();

        let report = reconciler.reconcile(&snapshot(&[("Hold", 1), ("Open", 1)]));

        assert_eq!(report.created, 0);
        assert_eq!(report.destroyed, 0);
        assert_eq!(report.updated, 2);
        let after: Vec<_> = shell.categories().iter().map(|c| (c.id, c.label.clone())).collect();
        assert_eq!(after, vec![(ids[0], "Hold".to_string()), (ids[1], "Open".to_string())]);
    }

    #[test]
    fn test_keyed_moves_categories_with_their_level() {
        let (mut reconciler, shell, _) = reconciler(Correlation::ByName);
        reconciler.reconcile(&snapshot(&[("Open", 1), ("Hold", 2), ("Pending", 3)]));
        let before: Vec<_> = shell.categories().iter().map(|c| (c.label.clone(), c.id)).collect();

        let report = reconciler.reconcile(&snapshot(&[("Pending", 3), ("Open", 1), ("Hold", 2)]));

        assert_eq!(report.created, 0);
        assert_eq!(report.destroyed, 0);
        assert_eq!(report.updated, 0);
        assert_eq!(report.moved, 1);
        let after: Vec<_> = shell.categories().iter().map(|c| (c.label.clone(), c.id)).collect();
        assert_eq!(after, vec![before[2].clone(), before[0].clone(), before[1].clone()]);
    }

    #[test]
    fn test_keyed_insert_and_remove() {
        let (mut reconciler, shell, _) = reconciler(Correlation::ByName);
        reconciler.reconcile(&snapshot(&[("Open", 1), ("Hold", 2), ("Pending", 3)]));

        let report = reconciler.reconcile(&snapshot(&[("New", 1), ("Pending", 4), ("Open", 1)]));

        assert_eq!(report.created, 1);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(
            labels_and_values(&shell),
            vec![
                ("New".to_string(), "1".to_string()),
                ("Pending".to_string(), "4".to_string()),
                ("Open".to_string(), "1".to_string()),
            ]
        );
        assert_eq!(
            reconciler.rendered(),
            vec![("New".to_string(), 1), ("Pending".to_string(), 4), ("Open".to_string(), 1)]
        );
    }

    #[test]
    fn test_keyed_duplicate_names() {
        let (mut reconciler, shell, _) = reconciler(Correlation::ByName);
        reconciler.reconcile(&snapshot(&[("Dup", 1), ("Dup", 2)]));

        let report = reconciler.reconcile(&snapshot(&[("Dup", 1)]));

        assert_eq!(report.destroyed, 1);
        assert_eq!(labels_and_values(&shell), vec![("Dup".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_rows_rebuilt_only_when_changed() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.reconcile(&snapshot(&[("Open", 2), ("Hold", 1)]));
        shell.take_journal();

        let mut changed = snapshot(&[("Open", 2), ("Hold", 1)]);
        changed.levels[1].details[0].subject = "Rewritten".to_string();
        let report = reconciler.reconcile(&changed);

        assert_eq!(report.rows_rebuilt, 1);
        let hold = shell.categories()[1].id;
        let journal = shell.take_journal();
        assert_eq!(
            journal.iter().filter(|op| matches!(op, ShellOp::ClearDetails(_))).count(),
            1
        );
        assert!(journal.contains(&ShellOp::ClearDetails(hold)));
        assert_eq!(shell.categories()[1].details[0].label, "Rewritten");
    }

    #[test]
    fn test_long_subject_truncated_on_display_only() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        let subject = "x".repeat(60);
        let snap = Snapshot::new(1, vec![Level::new("Open", 1).with_detail(Detail::new(3u64, subject.clone()))]);

        reconciler.reconcile(&snap);

        let row = &shell.categories()[0].details[0];
        assert_eq!(row.label, format!("{}...", "x".repeat(45)));
        assert_eq!(row.subject, subject);
    }

    #[test]
    fn test_rebuild_recreates_every_node() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.reconcile(&snapshot(&[("Open", 1), ("Hold", 2)]));

        let report = reconciler.rebuild(&snapshot(&[("Open", 1), ("Hold", 2)]));

        assert_eq!(report.destroyed, 2);
        assert_eq!(report.created, 2);
        assert_eq!(reconciler.len(), 2);
        assert_eq!(shell.categories().len(), 2);
    }

    #[test]
    fn test_refresh_values_updates_and_shrinks_without_creating() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.rebuild(&snapshot(&[("Open", 1), ("Hold", 2), ("Pending", 1)]));

        let report = reconciler.refresh_values(&snapshot(&[("Open", 4)]));
        assert_eq!(report.destroyed, 2);
        assert_eq!(report.created, 0);
        assert_eq!(labels_and_values(&shell), vec![("Open".to_string(), "4".to_string())]);
        assert_eq!(shell.categories()[0].details.len(), 4);

        let report = reconciler.refresh_values(&snapshot(&[("Open", 4), ("Hold", 1)]));
        assert_eq!(report.created, 0);
        assert_eq!(reconciler.len(), 1);
    }

    #[test]
    fn test_teardown_destroys_all() {
        let (mut reconciler, shell, _) = reconciler(Correlation::Positional);
        reconciler.reconcile(&snapshot(&[("Open", 1), ("Hold", 2)]));

        assert_eq!(reconciler.teardown(), 2);
        assert_eq!(reconciler.teardown(), 0);
        assert!(shell.categories().is_empty());
    }
}
