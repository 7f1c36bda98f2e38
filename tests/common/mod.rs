//! Common test utilities and helpers

#![allow(dead_code)]

use arbor_core::editor::ast::{NodeKind, TokenKind};
use arbor_core::editor::NodeId;
use arbor_core::{EditorConfig, Key, Module, Position};

/// Fresh module on an empty program
pub fn module() -> Module {
    Module::new(EditorConfig::default())
}

/// Module after typing `text` key by key
pub fn typed(text: &str) -> Module {
    let mut module = module();
    module.type_text(text);
    module
}

/// Put the caret at the end of `line`
pub fn end_of_line(module: &mut Module, line: usize) {
    module.click(Position::new(line, 500));
    module.press(Key::End);
}

/// Host buffer and tree rendering must agree after every action
pub fn assert_in_sync(module: &Module) {
    assert_eq!(
        module.buffer_text(),
        module.text(),
        "host buffer drifted from the tree"
    );
}

/// Currently selected leaf, if it is an empty expression hole
pub fn selected_hole(module: &Module) -> Option<NodeId> {
    let selected = module.context().selected?;
    match module.session().ast.kind(selected) {
        Some(NodeKind::Token(TokenKind::EmptyExpression)) => Some(selected),
        _ => None,
    }
}

/// Bodies of the program and of every compound statement are never empty
pub fn assert_bodies_non_empty(module: &Module) {
    let ast = &module.session().ast;
    for id in ast.descendants(ast.root()) {
        let Some(node) = ast.get(id) else {
            continue;
        };
        let has_body = match &node.kind {
            NodeKind::Program => true,
            NodeKind::Statement(kind) => kind.has_body(),
            _ => false,
        };
        if has_body {
            assert!(!node.body.is_empty(), "{} has an empty body", id);
        }
    }
}
