use std::str::FromStr;

use keyboard_types::Modifiers;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::event::{ActionEvent, MouseButton};

/// Modifier keys checked by the gate, in the order they are checked.
pub const MODIFIERS: [ModifierKey; 4] = [
    ModifierKey::Alt,
    ModifierKey::Shift,
    ModifierKey::Meta,
    ModifierKey::Ctrl,
];

const ANY_KEY: &str = "any";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Alt,
    Shift,
    Meta,
    Ctrl,
}

impl ModifierKey {
    pub fn name(self) -> &'static str {
        match self {
            ModifierKey::Alt => "alt",
            ModifierKey::Shift => "shift",
            ModifierKey::Meta => "meta",
            ModifierKey::Ctrl => "ctrl",
        }
    }

    pub fn flag(self) -> Modifiers {
        match self {
            ModifierKey::Alt => Modifiers::ALT,
            ModifierKey::Shift => Modifiers::SHIFT,
            ModifierKey::Meta => Modifiers::META,
            ModifierKey::Ctrl => Modifiers::CONTROL,
        }
    }

    pub fn is_active(self, event: &ActionEvent) -> bool {
        event.modifiers().contains(self.flag())
    }

    fn parse(name: &str) -> Option<Self> {
        MODIFIERS.into_iter().find(|key| key.name() == name)
    }
}

/// Modifier keys that may be held without suppressing the action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    any: bool,
    keys: Vec<ModifierKey>,
}

impl AllowList {
    /// Approve regardless of modifiers.
    pub fn any() -> Self {
        Self {
            any: true,
            keys: Vec::new(),
        }
    }

    pub fn of(keys: impl IntoIterator<Item = ModifierKey>) -> Self {
        let mut list = Self::default();
        for key in keys {
            list.insert(key);
        }
        list
    }

    /// Parse modifier names plus the `any` sentinel.
    pub fn parse<I, S>(names: I) -> Result<Self, ActionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if name == ANY_KEY {
                list.any = true;
                continue;
            }
            let key =
                ModifierKey::parse(name).ok_or_else(|| ActionError::InvalidAllowedKey(name.to_string()))?;
            list.insert(key);
        }
        Ok(list)
    }

    fn insert(&mut self, key: ModifierKey) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn allows_any(&self) -> bool {
        self.any
    }

    pub fn permits(&self, key: ModifierKey) -> bool {
        self.any || self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        !self.any && self.keys.is_empty()
    }
}

impl FromStr for AllowList {
    type Err = ActionError;

    /// Accepts `"shift ctrl"` as well as `"shift,ctrl"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw.split(|c: char| c.is_whitespace() || c == ','))
    }
}

/// Decides whether a pointer event is a plain primary click.
pub trait ClickHeuristic {
    fn is_simple_click(&self, event: &ActionEvent) -> bool;
}

/// Primary (or no) button and no modifier held.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleClick;

impl ClickHeuristic for SimpleClick {
    fn is_simple_click(&self, event: &ActionEvent) -> bool {
        let modified = MODIFIERS.iter().any(|key| key.is_active(event));
        let secondary = event
            .button()
            .is_some_and(|button| button != MouseButton::Main);
        !modified && !secondary
    }
}

/// Matches `/^click|mouse|touch/`: starts with `click`, or mentions
/// `mouse` or `touch` anywhere.
pub fn is_pointer_event(event_type: &str) -> bool {
    event_type.starts_with("click") || event_type.contains("mouse") || event_type.contains("touch")
}

/// Event gate with the default click heuristic.
pub fn decide(event: &ActionEvent, allowed_keys: Option<&AllowList>) -> bool {
    decide_with(event, allowed_keys, &SimpleClick)
}

pub fn decide_with(
    event: &ActionEvent,
    allowed_keys: Option<&AllowList>,
    clicks: &dyn ClickHeuristic,
) -> bool {
    let empty = AllowList::default();
    let allowed = match allowed_keys {
        Some(list) if !list.is_empty() => list,
        _ => {
            if is_pointer_event(event.event_type()) {
                return clicks.is_simple_click(event);
            }
            &empty
        }
    };

    if allowed.allows_any() {
        return true;
    }

    MODIFIERS
        .iter()
        .all(|key| !key.is_active(event) || allowed.permits(*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ElementId;

    fn event(event_type: &str, modifiers: Modifiers) -> ActionEvent {
        ActionEvent::new(event_type, ElementId(0)).with_modifiers(modifiers)
    }

    #[test]
    fn pointer_pattern_is_anchored_only_for_click() {
        assert!(is_pointer_event("click"));
        assert!(is_pointer_event("mouseup"));
        assert!(is_pointer_event("touchstart"));
        assert!(is_pointer_event("pointermouse"));
        assert!(!is_pointer_event("dblclick"));
        assert!(!is_pointer_event("keydown"));
        assert!(!is_pointer_event("submit"));
    }

    #[test]
    fn parses_names_and_sentinel() {
        let list: AllowList = "shift, ctrl".parse().unwrap();
        assert!(list.permits(ModifierKey::Shift));
        assert!(list.permits(ModifierKey::Ctrl));
        assert!(!list.permits(ModifierKey::Alt));
        assert!(!list.allows_any());

        let list = AllowList::parse(["any"]).unwrap();
        assert!(list.allows_any());
        assert!(list.permits(ModifierKey::Meta));

        assert!(AllowList::parse(Vec::<String>::new()).unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_key_names() {
        let err = AllowList::parse(["shift", "hyper"]).unwrap_err();
        assert!(matches!(err, ActionError::InvalidAllowedKey(name) if name == "hyper"));
    }

    #[test]
    fn secondary_button_is_not_simple() {
        let click = ActionEvent::new("click", ElementId(0)).with_button(MouseButton::Secondary);
        assert!(!decide(&click, None));
        let click = ActionEvent::new("click", ElementId(0)).with_button(MouseButton::Main);
        assert!(decide(&click, None));
    }

    #[test]
    fn empty_list_on_pointer_event_uses_click_heuristic() {
        let click = ActionEvent::new("click", ElementId(0)).with_button(MouseButton::Auxiliary);
        assert!(!decide(&click, Some(&AllowList::default())));
    }

    #[test]
    fn keyboard_event_without_list_rejects_any_modifier() {
        assert!(decide(&event("keydown", Modifiers::empty()), None));
        assert!(!decide(&event("keydown", Modifiers::ALT), None));
        // Modifiers outside the four checked ones are ignored.
        assert!(decide(&event("keydown", Modifiers::CAPS_LOCK), None));
    }

    #[test]
    fn custom_heuristic_is_consulted_for_pointer_events() {
        struct Never;
        impl ClickHeuristic for Never {
            fn is_simple_click(&self, _event: &ActionEvent) -> bool {
                false
            }
        }
        let plain = event("click", Modifiers::empty());
        assert!(!decide_with(&plain, None, &Never));
        assert!(decide_with(&plain, Some(&AllowList::any()), &Never));
    }
}
