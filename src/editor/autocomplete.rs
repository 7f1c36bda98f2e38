//! Matching in-progress autocomplete text against the catalog
//!
//! Every keystroke into an autocomplete token is evaluated to one of:
//! - `Commit` when the text names exactly one insertion
//! - `Partial` when it may still grow into something
//! - `NoMatch` when no construct or variable can start this way

use crate::editor::ast::AutocompleteContext;
use crate::editor::catalog::{Catalog, ConstructShape};
use crate::editor::patterns::{is_keyword, EditorPatterns};
use crate::editor::scope::VisibleVariable;

/// What committing an autocomplete token inserts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// Catalog template, with the name captured by its pattern
    Definition { id: String, capture: Option<String> },
    VariableReference { name: String },
    /// `name.method(` typed at the start of a line
    MethodOnVariable { variable: String, method: String },
    /// `name[` typed at the start of a line
    ListAccessOnVariable { variable: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Commit(Insertion),
    Partial,
    NoMatch,
}

/// One entry of the suggestion menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub insertion: Insertion,
}

/// Matcher over a catalog and the variables visible at the token
pub struct AutocompleteMatcher<'a> {
    catalog: &'a Catalog,
    variables: &'a [VisibleVariable],
}

fn is_identifier(text: &str) -> bool {
    EditorPatterns::identifier().is_match(text) && !is_keyword(text)
}

impl<'a> AutocompleteMatcher<'a> {
    pub fn new(catalog: &'a Catalog, variables: &'a [VisibleVariable]) -> Self {
        Self { catalog, variables }
    }

    /// Classify `text` typed in `context`
    pub fn evaluate(&self, text: &str, context: AutocompleteContext) -> MatchOutcome {
        if text.is_empty() {
            return MatchOutcome::NoMatch;
        }

        for definition in self.catalog.in_context(context) {
            if let Some(capture) = definition.capture(text) {
                if capture.as_deref().map(is_keyword).unwrap_or(false) {
                    continue;
                }
                return MatchOutcome::Commit(Insertion::Definition {
                    id: definition.id.clone(),
                    capture,
                });
            }
            if definition.commits_immediately(text) {
                return MatchOutcome::Commit(Insertion::Definition {
                    id: definition.id.clone(),
                    capture: None,
                });
            }
        }

        if context == AutocompleteContext::StartOfLine {
            if let Some(outcome) = self.evaluate_on_variable(text) {
                return outcome;
            }
        }

        if self.catalog.in_context(context).any(|d| d.is_partial(text)) {
            return MatchOutcome::Partial;
        }

        match context {
            AutocompleteContext::StartOfLine
                if EditorPatterns::assignment_prefix().is_match(text) =>
            {
                MatchOutcome::Partial
            }
            AutocompleteContext::Expression
                if EditorPatterns::identifier().is_match(text) =>
            {
                MatchOutcome::Partial
            }
            _ => MatchOutcome::NoMatch,
        }
    }

    /// `name.method(` and `name[` at the start of a line
    fn evaluate_on_variable(&self, text: &str) -> Option<MatchOutcome> {
        if let Some(captures) = EditorPatterns::list_access_on_variable().captures(text) {
            let variable = captures[1].to_string();
            if is_keyword(&variable) {
                return Some(MatchOutcome::NoMatch);
            }
            return Some(MatchOutcome::Commit(Insertion::ListAccessOnVariable { variable }));
        }
        let captures = EditorPatterns::method_on_variable_prefix().captures(text)?;
        let variable = captures[1].to_string();
        if is_keyword(&variable) {
            return Some(MatchOutcome::NoMatch);
        }
        let tail = &captures[2];
        let methods = self
            .catalog
            .in_context(AutocompleteContext::RightOfExpression)
            .filter(|d| matches!(d.shape, ConstructShape::MethodCall { .. }));
        let mut partial = false;
        for definition in methods {
            if definition.triggers.iter().any(|t| t == tail) {
                return Some(MatchOutcome::Commit(Insertion::MethodOnVariable {
                    variable,
                    method: definition.id.clone(),
                }));
            }
            partial |= definition.triggers.iter().any(|t| t.starts_with(tail));
        }
        Some(if partial {
            MatchOutcome::Partial
        } else {
            MatchOutcome::NoMatch
        })
    }

    /// Insertion for a complete word committed by space, Enter or navigation
    pub fn exact_word(&self, text: &str, context: AutocompleteContext) -> Option<Insertion> {
        let word = text.trim_end();
        if word.is_empty() {
            return None;
        }
        if let Some(definition) = self.catalog.in_context(context).find(|d| d.matches_word(word)) {
            return Some(Insertion::Definition {
                id: definition.id.clone(),
                capture: None,
            });
        }
        if context != AutocompleteContext::RightOfExpression && is_identifier(word) {
            return Some(Insertion::VariableReference {
                name: word.to_string(),
            });
        }
        None
    }

    /// What committing `text` right now would insert
    pub fn commit_target(&self, text: &str, context: AutocompleteContext) -> Option<Insertion> {
        match self.evaluate(text, context) {
            MatchOutcome::Commit(insertion) => Some(insertion),
            _ => self.exact_word(text, context),
        }
    }

    /// Menu entries for `text`: templates, visible variables, then an undefined name
    pub fn suggestions(&self, text: &str, context: AutocompleteContext) -> Vec<Suggestion> {
        let mut out = Vec::new();
        if text.is_empty() {
            return out;
        }
        for definition in self.catalog.in_context(context) {
            if definition.needs_capture() {
                continue;
            }
            if definition.triggers.iter().any(|t| t.starts_with(text)) {
                out.push(Suggestion {
                    label: definition.label.clone(),
                    insertion: Insertion::Definition {
                        id: definition.id.clone(),
                        capture: None,
                    },
                });
            }
        }
        if context == AutocompleteContext::RightOfExpression {
            return out;
        }
        for variable in self.variables {
            if variable.name.starts_with(text) {
                out.push(Suggestion {
                    label: format!("{}: {}", variable.name, variable.data_type),
                    insertion: Insertion::VariableReference {
                        name: variable.name.clone(),
                    },
                });
            }
        }
        if is_identifier(text) && !self.variables.iter().any(|v| v.name == text) {
            out.push(Suggestion {
                label: format!("{} (undefined)", text),
                insertion: Insertion::VariableReference {
                    name: text.to_string(),
                },
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ast::{DataType, NodeId};
    use crate::editor::scope::{Reference, ScopeId};
    use AutocompleteContext::*;

    fn variable(name: &str, data_type: DataType) -> VisibleVariable {
        VisibleVariable {
            name: name.to_string(),
            data_type,
            reference: Reference {
                token: NodeId(1),
                scope: ScopeId(0),
            },
        }
    }

    #[test]
    fn test_print_commits_on_open_paren() {
        let catalog = Catalog::builtin();
        let matcher = AutocompleteMatcher::new(&catalog, &[]);
        assert_eq!(matcher.evaluate("p", StartOfLine), MatchOutcome::Partial);
        assert_eq!(matcher.evaluate("print", StartOfLine), MatchOutcome::Partial);
        assert_eq!(
            matcher.evaluate("print(", StartOfLine),
            MatchOutcome::Commit(Insertion::Definition { id: "print".into(), capture: None })
        );
    }

    #[test]
    fn test_assignment_pattern_captures_name() {
        let catalog = Catalog::builtin();
        let matcher = AutocompleteMatcher::new(&catalog, &[]);
        assert_eq!(matcher.evaluate("total ", StartOfLine), MatchOutcome::Partial);
        assert_eq!(
            matcher.evaluate("total =", StartOfLine),
            MatchOutcome::Commit(Insertion::Definition {
                id: "assign".into(),
                capture: Some("total".into())
            })
        );
        assert_eq!(
            matcher.evaluate("total +=", StartOfLine),
            MatchOutcome::Commit(Insertion::Definition {
                id: "add_assign".into(),
                capture: Some("total".into())
            })
        );
    }

    #[test]
    fn test_keywords_are_not_captured() {
        let catalog = Catalog::builtin();
        let matcher = AutocompleteMatcher::new(&catalog, &[]);
        assert_ne!(
            matcher.evaluate("while =", StartOfLine),
            MatchOutcome::Commit(Insertion::Definition {
                id: "assign".into(),
                capture: Some("while".into())
            })
        );
        assert_eq!(matcher.exact_word("while", Expression), None);
    }

    #[test]
    fn test_method_on_variable() {
        let catalog = Catalog::builtin();
        let matcher = AutocompleteMatcher::new(&catalog, &[]);
        assert_eq!(matcher.evaluate("names.ap", StartOfLine), MatchOutcome::Partial);
        assert_eq!(
            matcher.evaluate("names.append(", StartOfLine),
            MatchOutcome::Commit(Insertion::MethodOnVariable {
                variable: "names".into(),
                method: "append".into()
            })
        );
        assert_eq!(matcher.evaluate("names.zz", StartOfLine), MatchOutcome::NoMatch);
        assert_eq!(
            matcher.evaluate("names[", StartOfLine),
            MatchOutcome::Commit(Insertion::ListAccessOnVariable { variable: "names".into() })
        );
    }

    #[test]
    fn test_word_triggers_wait_for_commit() {
        let catalog = Catalog::builtin();
        let matcher = AutocompleteMatcher::new(&catalog, &[]);
        assert_eq!(matcher.evaluate("True", Expression), MatchOutcome::Partial);
        assert_eq!(
            matcher.exact_word("True ", Expression),
            Some(Insertion::Definition { id: "true".into(), capture: None })
        );
        assert_eq!(
            matcher.exact_word("count", Expression),
            Some(Insertion::VariableReference { name: "count".into() })
        );
    }

    #[test]
    fn test_right_of_expression_rejects_garbage() {
        let catalog = Catalog::builtin();
        let matcher = AutocompleteMatcher::new(&catalog, &[]);
        assert_eq!(matcher.evaluate(".up", RightOfExpression), MatchOutcome::Partial);
        assert_eq!(matcher.evaluate("an", RightOfExpression), MatchOutcome::Partial);
        assert_eq!(matcher.evaluate("x", RightOfExpression), MatchOutcome::NoMatch);
        assert_eq!(matcher.exact_word("x", RightOfExpression), None);
    }

    #[test]
    fn test_suggestions_offer_undefined_name() {
        let catalog = Catalog::builtin();
        let variables = vec![variable("score", DataType::Number)];
        let matcher = AutocompleteMatcher::new(&catalog, &variables);

        let labels: Vec<String> = matcher
            .suggestions("s", Expression)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["str(...)", "score: Number", "s (undefined)"]);

        let exact = matcher.suggestions("score", Expression);
        assert!(exact.iter().all(|s| !s.label.contains("undefined")));
    }
}
