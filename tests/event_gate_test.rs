use delegated_actions::action::{decide, is_pointer_event, AllowList, ModifierKey};
use delegated_actions::{ActionError, ActionEvent, ElementId, MouseButton};
use keyboard_types::Modifiers;

const EVENTS: &[&str] = &[
    "click",
    "dblclick",
    "mousedown",
    "mouseup",
    "touchstart",
    "keydown",
    "keyup",
    "submit",
    "input",
];

fn all_modifier_sets() -> Vec<Modifiers> {
    let flags = [
        Modifiers::ALT,
        Modifiers::SHIFT,
        Modifiers::META,
        Modifiers::CONTROL,
    ];
    (0..16u8)
        .map(|mask| {
            flags
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .fold(Modifiers::empty(), |acc, (_, flag)| acc | *flag)
        })
        .collect()
}

fn event(event_type: &str, modifiers: Modifiers) -> ActionEvent {
    ActionEvent::new(event_type, ElementId(0)).with_modifiers(modifiers)
}

#[test]
fn any_approves_every_event() {
    let any = AllowList::any();
    for event_type in EVENTS {
        for modifiers in all_modifier_sets() {
            let secondary = event(event_type, modifiers).with_button(MouseButton::Secondary);
            assert!(decide(&event(event_type, modifiers), Some(&any)));
            assert!(decide(&secondary, Some(&any)));
        }
    }
}

#[test]
fn pointer_events_without_allow_list_need_a_simple_click() {
    for event_type in ["click", "mousedown", "mouseup", "touchstart", "touchend"] {
        assert!(is_pointer_event(event_type));
        for modifiers in all_modifier_sets() {
            let approved = decide(&event(event_type, modifiers), None);
            assert_eq!(approved, modifiers.is_empty(), "{event_type} {modifiers:?}");
        }
        let right = event(event_type, Modifiers::empty()).with_button(MouseButton::Secondary);
        assert!(!decide(&right, None));
        let left = event(event_type, Modifiers::empty()).with_button(MouseButton::Main);
        assert!(decide(&left, None));
    }
}

#[test]
fn non_pointer_events_without_allow_list_reject_any_modifier() {
    for event_type in ["keydown", "keyup", "submit", "input", "dblclick"] {
        assert!(!is_pointer_event(event_type));
        for modifiers in all_modifier_sets() {
            let approved = decide(&event(event_type, modifiers), None);
            assert_eq!(approved, modifiers.is_empty(), "{event_type} {modifiers:?}");
        }
    }
}

#[test]
fn explicit_subset_rejects_only_unlisted_modifiers() {
    let lists = [
        vec![ModifierKey::Shift],
        vec![ModifierKey::Alt, ModifierKey::Ctrl],
        vec![ModifierKey::Meta, ModifierKey::Shift, ModifierKey::Ctrl],
        vec![
            ModifierKey::Alt,
            ModifierKey::Shift,
            ModifierKey::Meta,
            ModifierKey::Ctrl,
        ],
    ];
    for keys in lists {
        let allowed = AllowList::of(keys.iter().copied());
        let permitted = keys
            .iter()
            .fold(Modifiers::empty(), |acc, key| acc | key.flag());
        for event_type in EVENTS {
            for modifiers in all_modifier_sets() {
                let expected = modifiers.difference(permitted).is_empty();
                assert_eq!(
                    decide(&event(event_type, modifiers), Some(&allowed)),
                    expected,
                    "{event_type} {modifiers:?} against {keys:?}"
                );
            }
        }
    }
}

#[test]
fn explicit_allow_list_skips_the_click_heuristic() {
    let allowed = AllowList::of([ModifierKey::Shift]);
    let right = event("click", Modifiers::empty()).with_button(MouseButton::Secondary);
    assert!(decide(&right, Some(&allowed)));
}

#[test]
fn allow_lists_parse_from_template_strings() {
    let parsed: AllowList = "shift, ctrl".parse().expect("parse allow list");
    assert_eq!(parsed, AllowList::of([ModifierKey::Shift, ModifierKey::Ctrl]));
    assert!("any".parse::<AllowList>().expect("parse any").allows_any());

    let err = "shift hyper".parse::<AllowList>().unwrap_err();
    assert!(matches!(err, ActionError::InvalidAllowedKey(ref name) if name == "hyper"));
    assert!(err.is_configuration());
}
