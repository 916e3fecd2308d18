use thiserror::Error;

use crate::runtime::{DomError, NodeId};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(
        "You specified a quoteless path to the action helper which did not resolve to an \
         action name (a string), found {found}. Perhaps you meant to use a quoted actionName? \
         (e.g. {{{{action 'save'}}}})."
    )]
    NonStringActionName { found: &'static str },
    #[error("action name must not be empty")]
    EmptyActionName,
    #[error("The action '{action}' did not exist on {target}")]
    MissingAction { action: String, target: String },
    #[error("invalid value for action option '{name}': expected {expected}")]
    InvalidOption {
        name: &'static str,
        expected: &'static str,
    },
    #[error("unknown allowed key '{0}' (expected alt, shift, meta, ctrl or any)")]
    InvalidAllowedKey(String),
    #[error("unknown template node {0}")]
    UnknownNode(NodeId),
    #[error("failed to tag element: {0}")]
    Dom(#[from] DomError),
    #[error("action '{action}' failed: {source}")]
    Handler {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ActionError {
    /// Template authoring mistakes, as opposed to runtime failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ActionError::NonStringActionName { .. }
                | ActionError::EmptyActionName
                | ActionError::MissingAction { .. }
                | ActionError::InvalidOption { .. }
                | ActionError::InvalidAllowedKey(_)
        )
    }
}
