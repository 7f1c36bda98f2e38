//! Diagnostics sink
//!
//! The engine never renders messages itself. It produces [`MessageEffect`]s
//! and hands them to whatever [`MessageSink`] the host plugged in.

use crate::editor::ast::NodeId;

/// Host-side receiver of diagnostics
pub trait MessageSink {
    /// Attach a hover message to a construct
    fn add_hover_message(&mut self, construct: NodeId, text: &str);

    fn remove_message_from_construct(&mut self, construct: NodeId);

    /// Transient popup, e.g. why an edit was refused
    fn add_popup_message(&mut self, text: &str);
}

/// A message the executor wants delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageEffect {
    Hover { construct: NodeId, text: String },
    Remove { construct: NodeId },
    Popup { text: String },
}

impl MessageEffect {
    pub fn deliver(&self, sink: &mut dyn MessageSink) {
        match self {
            MessageEffect::Hover { construct, text } => sink.add_hover_message(*construct, text),
            MessageEffect::Remove { construct } => sink.remove_message_from_construct(*construct),
            MessageEffect::Popup { text } => sink.add_popup_message(text),
        }
    }
}

/// Sink that keeps the current hover messages and a popup log
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub hovers: Vec<(NodeId, String)>,
    pub popups: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hover_for(&self, construct: NodeId) -> Option<&str> {
        self.hovers
            .iter()
            .find(|(node, _)| *node == construct)
            .map(|(_, text)| text.as_str())
    }
}

impl MessageSink for RecordingSink {
    fn add_hover_message(&mut self, construct: NodeId, text: &str) {
        self.hovers.retain(|(node, _)| *node != construct);
        self.hovers.push((construct, text.to_string()));
    }

    fn remove_message_from_construct(&mut self, construct: NodeId) {
        self.hovers.retain(|(node, _)| *node != construct);
    }

    fn add_popup_message(&mut self, text: &str) {
        self.popups.push(text.to_string());
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn add_hover_message(&mut self, _construct: NodeId, _text: &str) {}
    fn remove_message_from_construct(&mut self, _construct: NodeId) {}
    fn add_popup_message(&mut self, _text: &str) {}
}
