//! Suggestion menu state
//!
//! Tracks the options offered for the autocomplete token under the cursor:
//! - Refreshed after every applied action
//! - Up/Down move the highlight, wrapping at both ends
//! - Escape hides it until the token's text changes

use crate::editor::ast::NodeId;
use crate::editor::autocomplete::Suggestion;

/// Suggestion menu state
#[derive(Debug, Clone, Default)]
pub struct SuggestionMenu {
    /// Options for the current token
    options: Vec<Suggestion>,

    /// Highlighted option
    selected: usize,

    /// Whether the menu is shown
    visible: bool,

    /// Token the options were computed for
    token: Option<NodeId>,

    /// Token and text the user dismissed the menu for
    dismissed: Option<(NodeId, String)>,
}

impl SuggestionMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show options for `token` holding `text`, unless dismissed for exactly that
    pub fn show(&mut self, token: NodeId, text: &str, options: Vec<Suggestion>) {
        if let Some((dismissed_token, dismissed_text)) = &self.dismissed {
            if *dismissed_token == token && dismissed_text == text {
                self.hide();
                return;
            }
        }
        self.dismissed = None;
        let keep_selection = self.token == Some(token) && self.options == options;
        if !keep_selection {
            self.selected = 0;
        }
        self.options = options;
        self.token = Some(token);
        self.visible = !self.options.is_empty();
    }

    /// Hide menu
    pub fn hide(&mut self) {
        self.visible = false;
        self.options.clear();
        self.selected = 0;
        self.token = None;
    }

    /// Hide until the token's text changes
    pub fn dismiss(&mut self, text: &str) {
        if let Some(token) = self.token {
            self.dismissed = Some((token, text.to_string()));
        }
        self.hide();
    }

    /// Clear state tied to constructs the tree released
    pub fn forget(&mut self, released: &[NodeId]) {
        if matches!(&self.dismissed, Some((token, _)) if released.contains(token)) {
            self.dismissed = None;
        }
        if self.token.map_or(false, |token| released.contains(&token)) {
            self.hide();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn token(&self) -> Option<NodeId> {
        self.token
    }

    pub fn options(&self) -> &[Suggestion] {
        &self.options
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Get selected suggestion
    pub fn selected_option(&self) -> Option<&Suggestion> {
        if !self.visible {
            return None;
        }
        self.options.get(self.selected)
    }

    /// Move selection up
    pub fn select_previous(&mut self) {
        if self.options.is_empty() {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.options.len() - 1;
        }
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        if self.options.is_empty() {
            return;
        }
        if self.selected < self.options.len() - 1 {
            self.selected += 1;
        } else {
            self.selected = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::autocomplete::Insertion;

    fn option(name: &str) -> Suggestion {
        Suggestion {
            label: name.to_string(),
            insertion: Insertion::VariableReference {
                name: name.to_string(),
            },
        }
    }

    #[test]
    fn test_selection_wraps() {
        let mut menu = SuggestionMenu::new();
        menu.show(NodeId(3), "a", vec![option("a"), option("ab")]);
        assert!(menu.is_visible());
        menu.select_previous();
        assert_eq!(menu.selected_index(), 1);
        menu.select_next();
        assert_eq!(menu.selected_index(), 0);
    }

    #[test]
    fn test_dismissal_lasts_until_text_changes() {
        let mut menu = SuggestionMenu::new();
        menu.show(NodeId(3), "a", vec![option("a")]);
        menu.dismiss("a");
        assert!(!menu.is_visible());

        menu.show(NodeId(3), "a", vec![option("a")]);
        assert!(!menu.is_visible());

        menu.show(NodeId(3), "ab", vec![option("ab")]);
        assert!(menu.is_visible());
        assert_eq!(menu.selected_option().unwrap().label, "ab");
    }

    #[test]
    fn test_empty_options_hide_menu() {
        let mut menu = SuggestionMenu::new();
        menu.show(NodeId(1), "zz", Vec::new());
        assert!(!menu.is_visible());
        assert!(menu.selected_option().is_none());
    }
}
