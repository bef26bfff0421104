//! Console presentation shell: the menu drawn as text on a terminal.

use std::io::Write;

use levelbar_engine::{CategoryId, DetailRow, MemoryShell, MenuState, PresentationShell};

/// Presentation shell that keeps the menu in a [`MemoryShell`] and prints it
/// after every reconciliation.
pub struct ConsoleShell<W: Write + Send + 'static> {
    menu: MemoryShell,
    out: W,
}

impl<W: Write + Send + 'static> ConsoleShell<W> {
    /// `menu` may be a clone the caller keeps for activating rows.
    pub fn new(menu: MemoryShell, out: W) -> Self {
        Self { menu, out }
    }
}

/// Render the menu. Detail rows are numbered from 1 across all categories.
pub fn render_menu(state: &MenuState) -> String {
    let mut text = format!("levelbar: {}\n", state.total_label);
    let mut row_number = 0;
    for category in &state.categories {
        text.push_str(&format!("  {} ({})\n", category.label, category.value));
        for row in &category.details {
            row_number += 1;
            text.push_str(&format!("    [{row_number}] {}", row.label));
            if let Some(org) = &row.organization {
                text.push_str(&format!(" - {org}"));
            }
            text.push('\n');
        }
    }
    text
}

/// Parse a 1-based row number typed by the user into a row index.
pub fn parse_row_number(input: &str) -> Option<usize> {
    input.trim().parse::<usize>().ok()?.checked_sub(1)
}

impl<W: Write + Send + 'static> PresentationShell for ConsoleShell<W> {
    type Category = CategoryId;

    fn set_total_label(&mut self, text: &str) {
        self.menu.set_total_label(text);
    }

    fn create_category(&mut self, label: &str, value: &str) -> CategoryId {
        self.menu.create_category(label, value)
    }

    fn set_category_label(&mut self, category: &CategoryId, label: &str) {
        self.menu.set_category_label(category, label);
    }

    fn set_category_value(&mut self, category: &CategoryId, value: &str) {
        self.menu.set_category_value(category, value);
    }

    fn move_category(&mut self, category: &CategoryId, position: usize) {
        self.menu.move_category(category, position);
    }

    fn clear_details(&mut self, category: &CategoryId) {
        self.menu.clear_details(category);
    }

    fn add_detail(&mut self, category: &CategoryId, row: DetailRow) {
        self.menu.add_detail(category, row);
    }

    fn destroy_category(&mut self, category: CategoryId) {
        self.menu.destroy_category(category);
    }

    fn present(&mut self) {
        let text = {
            let mut state = self.menu.state();
            // The console has no use for the mutation journal.
            state.journal.clear();
            render_menu(&state)
        };
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to draw menu");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelbar_engine::{Correlation, RecordingOpener, Reconciler, RenderSettings};
    use levelbar_types::Snapshot;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Writer whose output the test can read back.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn reconciler(out: Captured) -> (Reconciler<ConsoleShell<Captured>>, MemoryShell, RecordingOpener) {
        let menu = MemoryShell::new();
        let opener = RecordingOpener::new();
        let settings = RenderSettings {
            max_subject_length: 10,
            resource_base_url: "https://h.example".to_string(),
            correlation: Correlation::Positional,
        };
        let reconciler = Reconciler::new(
            ConsoleShell::new(menu.clone(), out),
            settings,
            Arc::new(opener.clone()),
        );
        (reconciler, menu, opener)
    }

    #[test]
    fn test_present_draws_menu() {
        let out = Captured::default();
        let (mut reconciler, menu, opener) = reconciler(out.clone());

        let snapshot = Snapshot::from_json(
            br#"{"total": 3, "levels": [
                {"level": "Open", "value": 2, "details": [
                    {"id": 1, "subject": "Printer jam"},
                    {"id": 2, "subject": "VPN down", "userorganization": "Acme"}
                ]},
                {"level": "Waiting", "value": 1, "details": [{"id": "x9", "subject": "Refund"}]}
            ]}"#,
        )
        .unwrap();
        reconciler.reconcile(&snapshot);

        assert_eq!(
            out.text(),
            "levelbar: 3\n\
             \x20 Open (2)\n\
             \x20   [1] Printer ja...\n\
             \x20   [2] VPN down - Acme\n\
             \x20 Waiting (1)\n\
             \x20   [3] Refund\n"
        );
        assert!(menu.state().journal.is_empty());

        assert!(menu.activate_detail(parse_row_number("3").unwrap()));
        assert_eq!(opener.opened(), vec!["https://h.example/Tickets/Ticket/View/x9"]);
    }

    #[test]
    fn test_empty_menu() {
        let out = Captured::default();
        let (mut reconciler, _menu, _opener) = reconciler(out.clone());
        reconciler.reconcile(&Snapshot::empty());
        assert_eq!(out.text(), "levelbar: 0\n");
    }

    #[test]
    fn test_parse_row_number() {
        assert_eq!(parse_row_number(" 2\n"), Some(1));
        assert_eq!(parse_row_number("1"), Some(0));
        assert_eq!(parse_row_number("0"), None);
        assert_eq!(parse_row_number("two"), None);
        assert_eq!(parse_row_number(""), None);
    }
}
