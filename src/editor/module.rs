//! One editor instance
//!
//! [`Module`] owns the session and wires the pieces together: host events
//! go through the [`EventRouter`], the resulting action through the
//! [`ActionExecutor`], and the outcome back out to the host text buffer and
//! message sink. Nothing here is global; hosts may run as many modules as
//! they like.

use crate::config::EditorConfig;
use crate::editor::action::EditAction;
use crate::editor::ast::NodeId;
use crate::editor::buffer::{RopeBuffer, TextBufferAdapter};
use crate::editor::catalog::Catalog;
use crate::editor::draft::DraftRecord;
use crate::editor::events::{CallbackType, Notification, SubscriptionId};
use crate::editor::executor::{ActionExecutor, ActionOutcome};
use crate::editor::focus::Context;
use crate::editor::messages::{MessageSink, RecordingSink};
use crate::editor::position::Position;
use crate::editor::router::{EventRouter, Key, KeyEvent, RawEvent};
use crate::editor::session::EditorSession;
use tracing::{debug, info, warn};

/// Editor session plus its host-side buffer and message sink
pub struct Module<B: TextBufferAdapter = RopeBuffer, M: MessageSink = RecordingSink> {
    session: EditorSession,
    router: EventRouter,
    buffer: B,
    sink: M,
}

impl Module {
    /// Empty program with the built-in catalog, an in-memory buffer and a
    /// recording sink
    pub fn new(config: EditorConfig) -> Self {
        Self::with_host(config, Catalog::builtin(), RopeBuffer::new(), RecordingSink::new())
    }
}

impl<B: TextBufferAdapter, M: MessageSink> Module<B, M> {
    pub fn with_host(config: EditorConfig, catalog: Catalog, mut buffer: B, sink: M) -> Self {
        let session = EditorSession::with_catalog(config, catalog);
        buffer.replace_all(session.rendered());
        let mut router = EventRouter::new();
        router.note_cursor(session.focus.cursor);
        info!("Editor module ready");
        Self {
            session,
            router,
            buffer,
            sink,
        }
    }

    /// Route a host event and run whatever it maps to
    pub fn handle_event(&mut self, event: RawEvent) -> ActionOutcome {
        let action = self.router.route(&event, &self.session);
        if action.is_none() {
            return ActionOutcome::default();
        }
        self.execute(action)
    }

    pub fn press(&mut self, key: Key) -> ActionOutcome {
        self.press_with(KeyEvent::plain(key))
    }

    pub fn press_with(&mut self, event: KeyEvent) -> ActionOutcome {
        self.handle_event(RawEvent::Key(event))
    }

    /// Type each character as its own key press
    pub fn type_text(&mut self, text: &str) -> Vec<ActionOutcome> {
        text.chars().map(|ch| self.press(Key::Char(ch))).collect()
    }

    pub fn click(&mut self, position: Position) -> ActionOutcome {
        self.handle_event(RawEvent::Click(position))
    }

    /// Run an action directly, as a toolbox button or a draft fix would
    pub fn execute(&mut self, action: EditAction) -> ActionOutcome {
        let outcome = ActionExecutor::new(&mut self.session).execute(&action);
        if outcome.applied {
            debug!("Applied {}", action.kind());
            self.sync_buffer(&outcome);
        }
        for message in &outcome.messages {
            message.deliver(&mut self.sink);
        }
        self.router.note_cursor(self.session.focus.cursor);
        outcome
    }

    /// Push the outcome's edit to the host and check the two texts agree
    fn sync_buffer(&mut self, outcome: &ActionOutcome) {
        if let Some(edit) = &outcome.edit {
            if let Err(e) = self.buffer.apply(edit) {
                warn!("Buffer rejected edit at {}: {}", edit.range.start, e);
                self.buffer.replace_all(self.session.rendered());
                return;
            }
        }
        let expected = self.session.rendered();
        if self.buffer.text() != expected {
            warn!("Host buffer drifted from the tree, resynchronising");
            self.buffer.replace_all(expected);
        }
    }

    pub fn context(&self) -> Context {
        self.session.context()
    }

    /// Render text of the tree
    pub fn text(&self) -> String {
        self.session.text()
    }

    pub fn buffer_text(&self) -> String {
        self.buffer.text()
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn drafts(&self) -> Vec<&DraftRecord> {
        self.session.drafts.records().collect()
    }

    pub fn subscribe(&mut self, construct: NodeId, kind: CallbackType) -> SubscriptionId {
        self.session.events.subscribe(construct, kind)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.session.events.unsubscribe(id)
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.session.events.drain()
    }

    pub fn sink(&self) -> &M {
        &self.sink
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::buffer::BufferEdit;
    use crate::error::Result;

    #[test]
    fn test_buffer_follows_every_applied_action() {
        let mut module = Module::new(EditorConfig::default());
        module.type_text("x = 5");
        assert_eq!(module.text(), "x = 5");
        assert_eq!(module.buffer_text(), module.text());
        module.press(Key::End);
        module.press(Key::Enter);
        assert_eq!(module.buffer_text(), "x = 5\n");
    }

    #[test]
    fn test_unknown_key_changes_nothing() {
        let mut module = Module::new(EditorConfig::default());
        let outcome = module.press(Key::Delete);
        assert!(!outcome.applied);
        assert!(outcome.edit.is_none());
        assert_eq!(module.buffer_text(), "");
    }

    /// Buffer that drops every edit it is given
    #[derive(Default)]
    struct DeafBuffer {
        text: String,
    }

    impl TextBufferAdapter for DeafBuffer {
        fn apply(&mut self, _edit: &BufferEdit) -> Result<()> {
            Ok(())
        }

        fn text(&self) -> String {
            self.text.clone()
        }

        fn replace_all(&mut self, text: &str) {
            self.text = text.to_string();
        }
    }

    #[test]
    fn test_drifting_buffer_is_resynchronised() {
        let mut module = Module::with_host(
            EditorConfig::default(),
            Catalog::builtin(),
            DeafBuffer::default(),
            RecordingSink::new(),
        );
        module.type_text("print(");
        assert_eq!(module.buffer().text(), "print(___)");
    }

    #[test]
    fn test_invalid_insertion_pops_up_message() {
        let mut module = Module::new(EditorConfig::default());
        module.type_text("x = 5");
        let outcome = module.execute(EditAction::InsertModifier {
            definition: "upper".to_string(),
        });
        assert!(!outcome.applied);
        assert_eq!(module.text(), "x = 5");
    }
}
