use keyboard_types::Modifiers;
use serde::{Deserialize, Serialize};

use crate::runtime::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Main,
    Auxiliary,
    Secondary,
    Fourth,
    Fifth,
}

/// A raw DOM event as seen by the delegated listener.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    event_type: String,
    target: ElementId,
    modifiers: Modifiers,
    button: Option<MouseButton>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl ActionEvent {
    pub fn new(event_type: impl Into<String>, target: ElementId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            modifiers: Modifiers::empty(),
            button: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> ElementId {
        self.target
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Pressed button, `None` for events that carry no button.
    pub fn button(&self) -> Option<MouseButton> {
        self.button
    }

    pub fn alt_key(&self) -> bool {
        self.modifiers.alt()
    }

    pub fn shift_key(&self) -> bool {
        self.modifiers.shift()
    }

    pub fn meta_key(&self) -> bool {
        self.modifiers.meta()
    }

    pub fn ctrl_key(&self) -> bool {
        self.modifiers.ctrl()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// What the delegated listener did with one event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub actions_scheduled: usize,
}
