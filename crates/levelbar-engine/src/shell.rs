//! The presentation shell boundary.
//!
//! The engine never touches widgets directly. It drives a
//! [`PresentationShell`] (the host's menu, a terminal renderer, or the
//! in-memory [`MemoryShell`](crate::MemoryShell)) through a small set of
//! mutations, and hands it fully-bound [`DetailRow`]s to display.
//!
//! ```text
//! total label                     set_total_label
//! ├── category (label, value)     create / set_label / set_value / move / destroy
//! │   ├── detail row  ──click──▶  DetailRow::activate → ResourceOpener
//! │   └── detail row              clear_details / add_detail
//! └── category ...
//! ```

use std::fmt;
use std::sync::Arc;

use levelbar_types::{Detail, DetailId};

use crate::format::truncate;
use crate::link::{ResourceLink, ResourceOpener};

/// Host-provided menu the reconciler mutates.
///
/// `Category` is the host's handle to one expandable category entry.
/// Newly created categories are appended after the existing ones.
pub trait PresentationShell: Send + 'static {
    type Category: Send;

    /// Set the aggregate label text.
    fn set_total_label(&mut self, text: &str);

    /// Append a category entry showing `label` and `value`.
    fn create_category(&mut self, label: &str, value: &str) -> Self::Category;

    /// Change the label of an existing category.
    fn set_category_label(&mut self, category: &Self::Category, label: &str);

    /// Change the value display of an existing category.
    fn set_category_value(&mut self, category: &Self::Category, value: &str);

    /// Move a category to `position` among the current categories.
    fn move_category(&mut self, category: &Self::Category, position: usize);

    /// Remove every detail row of a category.
    fn clear_details(&mut self, category: &Self::Category);

    /// Append a detail row to a category.
    fn add_detail(&mut self, category: &Self::Category, row: DetailRow);

    /// Remove a category and its rows.
    fn destroy_category(&mut self, category: Self::Category);

    /// Called once after each batch of mutations.
    fn present(&mut self) {}
}

/// A clickable detail row, bound to the resource it opens.
#[derive(Clone)]
pub struct DetailRow {
    /// Display text (the subject, possibly truncated).
    pub label: String,
    /// Full subject, untouched by truncation.
    pub subject: String,
    pub id: DetailId,
    pub organization: Option<String>,
    pub link: ResourceLink,
    opener: Arc<dyn ResourceOpener>,
}

impl DetailRow {
    /// Bind a detail to its link and opener, truncating the label.
    pub fn bind(
        detail: &Detail,
        max_subject_length: usize,
        base_url: &str,
        opener: Arc<dyn ResourceOpener>,
    ) -> Self {
        Self {
            label: truncate(&detail.subject, max_subject_length),
            subject: detail.subject.clone(),
            id: detail.id.clone(),
            organization: detail.organization.clone(),
            link: ResourceLink::new(base_url, &detail.id),
            opener,
        }
    }

    /// The row's click action: ask the opener to open the link.
    pub fn activate(&self) {
        tracing::info!(id = %self.id, url = self.link.url(), "opening detail");
        self.opener.open(self.link.url());
    }

    /// True when both rows would look and act the same.
    pub fn same_as(&self, other: &DetailRow) -> bool {
        self.label == other.label
            && self.subject == other.subject
            && self.id == other.id
            && self.organization == other.organization
            && self.link == other.link
    }
}

impl fmt::Debug for DetailRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailRow")
            .field("label", &self.label)
            .field("id", &self.id)
            .field("url", &self.link.url())
            .finish_non_exhaustive()
    }
}
