//! Property tests: whatever the keystrokes, the tree stays well formed

mod common;

use arbor_core::editor::ast::{ExpressionKind, NodeKind};
use arbor_core::editor::{Ast, InsertionType, NodeId};
use arbor_core::{Key, KeyEvent, Module, Position};
use common::{assert_bodies_non_empty, assert_in_sync, module, selected_hole, typed};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = KeyEvent> {
    prop_oneof![
        4 => prop::sample::select(vec!['x', '=', ' ', '5', '(', '+', '"', '[', ',', '<', 'p', 'i', 'a'])
            .prop_map(|c| KeyEvent::plain(Key::Char(c))),
        1 => prop::sample::select(vec![
            Key::Backspace,
            Key::Delete,
            Key::Enter,
            Key::Tab,
            Key::Escape,
            Key::Left,
            Key::Right,
            Key::Up,
            Key::Down,
            Key::Home,
            Key::End,
        ])
        .prop_map(KeyEvent::plain),
        1 => Just(KeyEvent::shift(Key::Tab)),
        1 => Just(KeyEvent::ctrl(Key::Char('z'))),
    ]
}

#[derive(Debug, Clone)]
enum Input {
    Key(KeyEvent),
    Click(Position),
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        5 => key_strategy().prop_map(Input::Key),
        1 => (1usize..6, 1usize..24).prop_map(|(line, column)| Input::Click(Position::new(line, column))),
    ]
}

fn apply(module: &mut Module, input: &Input) {
    match input {
        Input::Key(key) => {
            module.press_with(*key);
        }
        Input::Click(position) => {
            module.click(*position);
        }
    }
}

fn is_variable(ast: &Ast, id: NodeId) -> bool {
    matches!(
        ast.kind(id),
        Some(NodeKind::Expression(ExpressionKind::VariableReference { .. }))
    )
}

/// Attached expressions their slot rejects outright
///
/// Uses of a variable whose assignment was retyped later are draft mode
/// territory, so anything whose type or operand type a variable decides is
/// left out.
fn mismatched(module: &Module) -> Vec<NodeId> {
    let session = module.session();
    let ast = &session.ast;
    ast.descendants(ast.root())
        .into_iter()
        .filter(|id| ast.is_filled(*id) && ast.is_attached(*id))
        .filter(|id| ast.get(*id).map_or(false, |node| node.slot.is_some()))
        .filter(|id| {
            let reach = ast.parent(*id).filter(|p| {
                matches!(ast.kind(*p), Some(NodeKind::Expression(ExpressionKind::BinaryOperator)))
            });
            !ast.descendants(reach.unwrap_or(*id))
                .into_iter()
                .any(|node| is_variable(ast, node))
        })
        .filter(|id| {
            ast.insertion_type(*id, ast.returns(*id), &session.conversions) == InsertionType::Invalid
        })
        .collect()
}

fn layout_of(ast: &Ast) -> Vec<(usize, usize, usize)> {
    ast.descendants(ast.root())
        .into_iter()
        .filter_map(|id| ast.get(id).map(|node| (node.line, node.left, node.right)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_buffer_matches_tree_after_every_key(keys in prop::collection::vec(key_strategy(), 1..40)) {
        let mut module = module();
        for key in keys {
            module.press_with(key);
            assert_in_sync(&module);
            assert_bodies_non_empty(&module);
        }
    }

    #[test]
    fn prop_no_expression_sits_in_a_slot_that_rejects_it(
        inputs in prop::collection::vec(input_strategy(), 1..40)
    ) {
        let mut module = module();
        for input in &inputs {
            apply(&mut module, input);
            let offenders = mismatched(&module);
            prop_assert!(
                offenders.is_empty(),
                "{:?} left {:?} in a rejecting slot: {:?}",
                input,
                offenders,
                module.text()
            );
            assert_in_sync(&module);
        }
    }

    #[test]
    fn prop_relayout_is_idempotent(keys in prop::collection::vec(key_strategy(), 1..30)) {
        let mut module = module();
        for key in keys {
            module.press_with(key);
        }
        let mut ast = module.session().ast.clone();
        ast.relayout();
        let once = (ast.render_text(), layout_of(&ast));
        ast.relayout();
        let twice = (ast.render_text(), layout_of(&ast));
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.0, module.text());
    }

    #[test]
    fn prop_number_round_trips_to_hole(digits in "[0-9]{1,4}") {
        let mut module = typed("x = abs(");
        let hole = selected_hole(&module).unwrap();
        let (slot, range) = {
            let node = module.session().ast.get(hole).unwrap();
            (node.slot.clone(), node.range())
        };

        module.type_text(&digits);
        prop_assert_eq!(module.text(), format!("x = abs({})", digits));

        for _ in 0..digits.len() {
            module.press(Key::Backspace);
        }
        prop_assert_eq!(module.text(), "x = abs(___)");
        let restored = selected_hole(&module).unwrap();
        let node = module.session().ast.get(restored).unwrap();
        prop_assert_eq!(&node.slot, &slot);
        prop_assert_eq!(node.range(), range);
    }
}
