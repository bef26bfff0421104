//! In-memory presentation shell.
//!
//! Keeps the menu as plain data plus a journal of every mutation. Used headless
//! (the console renderer draws from it) and by tests that need to count exactly
//! what the reconciler created, changed and destroyed.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::shell::{DetailRow, PresentationShell};

/// Handle to a category held by a [`MemoryShell`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(u64);

/// One mutation applied to a [`MemoryShell`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellOp {
    SetTotal(String),
    Create(CategoryId),
    SetLabel(CategoryId),
    SetValue(CategoryId),
    Move(CategoryId, usize),
    ClearDetails(CategoryId),
    AddDetail(CategoryId),
    Destroy(CategoryId),
    Present,
}

/// A category as currently displayed.
#[derive(Clone, Debug)]
pub struct CategoryEntry {
    pub id: CategoryId,
    pub label: String,
    pub value: String,
    pub details: Vec<DetailRow>,
}

/// The displayed menu plus the mutation journal.
#[derive(Debug)]
pub struct MenuState {
    pub total_label: String,
    pub categories: Vec<CategoryEntry>,
    pub journal: Vec<ShellOp>,
    next_id: u64,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            total_label: "0".to_string(),
            categories: Vec::new(),
            journal: Vec::new(),
            next_id: 0,
        }
    }
}

impl MenuState {
    fn position(&self, id: CategoryId) -> Option<usize> {
        self.categories.iter().position(|c| c.id == id)
    }

    fn entry_mut(&mut self, id: CategoryId) -> Option<&mut CategoryEntry> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    /// Count journal entries matching `pred`.
    pub fn count_ops(&self, pred: impl Fn(&ShellOp) -> bool) -> usize {
        self.journal.iter().filter(|op| pred(op)).count()
    }

    /// Detail rows in display order across all categories.
    pub fn detail_rows(&self) -> Vec<&DetailRow> {
        self.categories.iter().flat_map(|c| c.details.iter()).collect()
    }
}

/// Presentation shell backed by a shared [`MenuState`].
///
/// Clones share the same state, so a caller can keep one clone for inspection
/// after moving another into the engine.
#[derive(Clone, Default)]
pub struct MemoryShell {
    state: Arc<Mutex<MenuState>>,
}

impl MemoryShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the menu state for inspection.
    pub fn state(&self) -> MutexGuard<'_, MenuState> {
        self.state.lock()
    }

    pub fn total_label(&self) -> String {
        self.state.lock().total_label.clone()
    }

    /// Current categories in display order.
    pub fn categories(&self) -> Vec<CategoryEntry> {
        self.state.lock().categories.clone()
    }

    /// Drain the mutation journal.
    pub fn take_journal(&self) -> Vec<ShellOp> {
        std::mem::take(&mut self.state.lock().journal)
    }

    /// Activate the `index`th detail row across all categories (display order).
    ///
    /// Returns false when there is no such row.
    pub fn activate_detail(&self, index: usize) -> bool {
        // Clone out so the opener runs without the lock held.
        let row = self.state.lock().detail_rows().get(index).map(|r| (*r).clone());
        match row {
            Some(row) => {
                row.activate();
                true
            }
            None => false,
        }
    }
}

impl PresentationShell for MemoryShell {
    type Category = CategoryId;

    fn set_total_label(&mut self, text: &str) {
        let mut state = self.state.lock();
        state.total_label = text.to_string();
        state.journal.push(ShellOp::SetTotal(text.to_string()));
    }

    fn create_category(&mut self, label: &str, value: &str) -> CategoryId {
        let mut state = self.state.lock();
        let id = CategoryId(state.next_id);
        state.next_id += 1;
        state.categories.push(CategoryEntry {
            id,
            label: label.to_string(),
            value: value.to_string(),
            details: Vec::new(),
        });
        state.journal.push(ShellOp::Create(id));
        id
    }

    fn set_category_label(&mut self, category: &CategoryId, label: &str) {
        let mut state = self.state.lock();
        if let Some(entry) = state.entry_mut(*category) {
            entry.label = label.to_string();
        }
        state.journal.push(ShellOp::SetLabel(*category));
    }

    fn set_category_value(&mut self, category: &CategoryId, value: &str) {
        let mut state = self.state.lock();
        if let Some(entry) = state.entry_mut(*category) {
            entry.value = value.to_string();
        }
        state.journal.push(ShellOp::SetValue(*category));
    }

    fn move_category(&mut self, category: &CategoryId, position: usize) {
        let mut state = self.state.lock();
        if let Some(from) = state.position(*category) {
            let entry = state.categories.remove(from);
            let to = position.min(state.categories.len());
            state.categories.insert(to, entry);
        }
        state.journal.push(ShellOp::Move(*category, position));
    }

    fn clear_details(&mut self, category: &CategoryId) {
        let mut state = self.state.lock();
        if let Some(entry) = state.entry_mut(*category) {
            entry.details.clear();
        }
        state.journal.push(ShellOp::ClearDetails(*category));
    }

    fn add_detail(&mut self, category: &CategoryId, row: DetailRow) {
        let mut state = self.state.lock();
        if let Some(entry) = state.entry_mut(*category) {
            entry.details.push(row);
        }
        state.journal.push(ShellOp::AddDetail(*category));
    }

    fn destroy_category(&mut self, category: CategoryId) {
        let mut state = self.state.lock();
        if let Some(at) = state.position(category) {
            state.categories.remove(at);
        }
        state.journal.push(ShellOp::Destroy(category));
    }

    fn present(&mut self) {
        self.state.lock().journal.push(ShellOp::Present);
    }
}
