//! Property tests for the reconciliation rules

use std::cell::RefCell;

use proptest::prelude::*;

use crate::{default_prop_name, AutoControlledManager, Props, State, Value};

const FIELDS: [&str; 4] = ["active", "level", "checked", "value"];

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::Int),
        "[a-z]{0,3}".prop_map(Value::String),
    ]
}

/// Props over the auto-controlled fields, their `default*` props, an unrelated
/// `name` and the `multiple` flag
fn props_strategy() -> impl Strategy<Value = Props> {
    let mut keys: Vec<String> = FIELDS.iter().map(|f| f.to_string()).collect();
    keys.extend(FIELDS.iter().map(|f| default_prop_name(f)));
    keys.push("name".to_string());
    keys.push("multiple".to_string());

    proptest::collection::vec(
        (proptest::sample::select(keys), value_strategy()),
        0..8,
    )
    .prop_map(|pairs| Props::from_pairs(pairs))
}

fn state_strategy() -> impl Strategy<Value = State> {
    proptest::collection::vec(
        (
            proptest::sample::select(vec!["active", "level", "checked", "value", "extra"]),
            value_strategy(),
        ),
        0..6,
    )
    .prop_map(|pairs| State::from_pairs(pairs))
}

fn manager_with_base(base: State) -> AutoControlledManager {
    AutoControlledManager::new(FIELDS).with_initial_state(move |_| base.clone())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn initial_state_resolution_order(props in props_strategy(), base in state_strategy()) {
        let state = manager_with_base(base.clone()).initial_state(&props);

        for field in FIELDS {
            let expected = props
                .get(field)
                .or_else(|| props.get(&default_prop_name(field)))
                .or_else(|| base.get(field))
                .cloned()
                .or_else(|| match field {
                    "checked" => Some(Value::Bool(false)),
                    "value" if props.get("multiple").is_some_and(Value::is_truthy) => {
                        Some(Value::Array(vec![]))
                    }
                    "value" => Some(Value::from("")),
                    _ => None,
                });
            prop_assert_eq!(state.get(field).cloned(), expected);
        }

        // Base fields outside the auto-controlled set pass through untouched
        prop_assert_eq!(state.get("extra"), base.get("extra"));
    }

    #[test]
    fn derived_state_only_echoes_supplied_fields(props in props_strategy(), prev in state_strategy()) {
        let manager = AutoControlledManager::new(FIELDS);
        let next = manager.derived_state(&props, &prev);

        for (field, value) in &next {
            prop_assert!(FIELDS.contains(&field.as_str()));
            prop_assert_eq!(props.get(field), Some(value));
        }
        for field in FIELDS {
            prop_assert_eq!(next.contains(field), props.contains(field));
        }
    }

    #[test]
    fn derived_state_is_deterministic(props in props_strategy(), prev in state_strategy()) {
        let manager = AutoControlledManager::new(FIELDS).with_state_from_props(|props, state| {
            State::from_pairs([("seen", Value::from(props.len() + state.len() > 3))])
        });

        prop_assert_eq!(manager.derived_state(&props, &prev), manager.derived_state(&props, &prev));
    }

    #[test]
    fn derived_state_upholds_controlled_invariant(props in props_strategy(), prev in state_strategy()) {
        let manager = AutoControlledManager::new(FIELDS);
        let mut state = prev.clone();
        state.merge(manager.derived_state(&props, &prev));

        for field in FIELDS {
            if let Some(value) = props.get(field) {
                prop_assert_eq!(state.get(field), Some(value));
            } else {
                prop_assert_eq!(state.get(field), prev.get(field));
            }
        }
    }

    #[test]
    fn try_set_state_applies_uncontrolled_subset(props in props_strategy(), attempted in state_strategy()) {
        let manager = AutoControlledManager::new(FIELDS);
        let applied = RefCell::new(Vec::new());

        let called = manager.try_set_state(
            attempted.clone(),
            &props,
            |state, _| applied.borrow_mut().push(state),
            None,
        );

        let expected: State = attempted
            .into_iter()
            .filter(|(field, _)| !props.contains(field))
            .collect();
        let applied = applied.into_inner();

        if expected.is_empty() {
            prop_assert!(!called);
            prop_assert!(applied.is_empty());
        } else {
            prop_assert!(called);
            prop_assert_eq!(applied, vec![expected]);
        }
    }
}
