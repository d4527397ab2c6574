//! Auto-controlled state manager
//!
//! A component declares which of its state fields may be controlled by its
//! owner. For each of those fields the owner either passes the value as a prop
//! (controlled) or leaves it out (uncontrolled), optionally seeding it with a
//! `default<Field>` prop. The manager implements the three lifecycle hooks that
//! keep state consistent with that choice:
//!
//! - [`AutoControlledManager::initial_state`] once, when the component is built
//! - [`AutoControlledManager::derived_state`] on every props update, including
//!   the one before the first render
//! - [`AutoControlledManager::try_set_state`] whenever the component wants to
//!   change its own state
//!
//! Whether a field is controlled is never stored. It is re-read from the props
//! snapshot on every call.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::fallback::{Fallback, FallbackRules};
use crate::snapshot::{Props, State};
use crate::value::Value;

/// Computes the base state a component starts from
pub type InitialStateFn = Arc<dyn Fn(&Props) -> State + Send + Sync>;

/// Contributes extra derived fields on every props update
pub type StateFromPropsFn = Arc<dyn Fn(&Props, &State) -> State + Send + Sync>;

/// Completion callback passed through to the host's state setter
pub type Callback = Box<dyn FnOnce()>;

/// Name of the prop that seeds an uncontrolled field: `active` → `defaultActive`
pub fn default_prop_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("default{}{}", first.to_uppercase(), chars.as_str()),
        None => "default".to_string(),
    }
}

/// Whether `field` is currently supplied by the owner
pub fn is_controlled(field: &str, props: &Props) -> bool {
    props.contains(field)
}

/// Reconciles component state with owner-supplied props
#[derive(Clone)]
pub struct AutoControlledManager {
    fields: Arc<[String]>,
    initial_state: Option<InitialStateFn>,
    state_from_props: Option<StateFromPropsFn>,
    fallbacks: FallbackRules,
}

impl AutoControlledManager {
    /// Create a manager for the given auto-controlled fields.
    ///
    /// Starts with [`FallbackRules::form_controls`] and no derivers.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            initial_state: None,
            state_from_props: None,
            fallbacks: FallbackRules::form_controls(),
        }
    }

    /// Seed the base state (non-auto-controlled fields, and last-resort values
    /// for auto-controlled ones)
    pub fn with_initial_state<F>(mut self, f: F) -> Self
    where
        F: Fn(&Props) -> State + Send + Sync + 'static,
    {
        self.initial_state = Some(Arc::new(f));
        self
    }

    /// Derive additional fields on each props update. The function receives the
    /// next props and the previous state with the prop echo already applied.
    pub fn with_state_from_props<F>(mut self, f: F) -> Self
    where
        F: Fn(&Props, &State) -> State + Send + Sync + 'static,
    {
        self.state_from_props = Some(Arc::new(f));
        self
    }

    /// Add or replace one fallback rule
    pub fn with_fallback(mut self, field: impl Into<String>, rule: Fallback) -> Self {
        self.fallbacks.insert(field, rule);
        self
    }

    /// Replace the whole fallback table
    pub fn with_fallbacks(mut self, rules: FallbackRules) -> Self {
        self.fallbacks = rules;
        self
    }

    /// Auto-controlled fields in declaration order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn fallbacks(&self) -> &FallbackRules {
        &self.fallbacks
    }

    /// Build the full initial state.
    ///
    /// Each auto-controlled field takes the first of: its prop, its
    /// `default<Field>` prop, its base-state value, its fallback rule. Fields
    /// that resolve to nothing are left out.
    pub fn initial_state(&self, props: &Props) -> State {
        let mut state = match &self.initial_state {
            Some(f) => f(props),
            None => State::new(),
        };

        let mut resolved = State::new();
        for field in self.fields.iter() {
            if let Some(value) = self.initial_value(field, props, &state) {
                resolved.insert(field.clone(), value);
            }
        }

        state.merge(resolved);
        state
    }

    fn initial_value(&self, field: &str, props: &Props, base: &State) -> Option<Value> {
        if let Some(value) = props.get(field) {
            return Some(value.clone());
        }
        if let Some(value) = props.get(&default_prop_name(field)) {
            return Some(value.clone());
        }
        if let Some(value) = base.get(field) {
            return Some(value.clone());
        }
        self.fallbacks.resolve(field, props)
    }

    /// Compute the partial state to merge on a props update.
    ///
    /// Controlled fields are echoed from `next_props`; uncontrolled ones are
    /// omitted so the previous state survives the merge. An empty result means
    /// nothing changes.
    pub fn derived_state(&self, next_props: &Props, prev_state: &State) -> State {
        let from_props: State = self
            .fields
            .iter()
            .filter_map(|field| {
                next_props
                    .get(field)
                    .map(|value| (field.clone(), value.clone()))
            })
            .collect();

        match &self.state_from_props {
            Some(f) => {
                let merged = prev_state.clone().merged(from_props.clone());
                let computed = f(next_props, &merged);
                from_props.merged(computed)
            }
            None => from_props,
        }
    }

    /// Keep only the fields of `maybe_state` that the owner is not supplying.
    /// Returns `None` when nothing is left.
    pub fn uncontrolled_subset(&self, maybe_state: State, props: &Props) -> Option<State> {
        let allowed: State = maybe_state
            .into_iter()
            .filter(|(field, _)| {
                let controlled = is_controlled(field, props);
                if controlled {
                    trace!(field = %field, "ignoring write to controlled field");
                }
                !controlled
            })
            .collect();

        (!allowed.is_empty()).then_some(allowed)
    }

    /// Ask the host to apply `maybe_state`, minus every field the owner
    /// controls. `apply` is the host's state setter; it is called at most
    /// once, synchronously, and receives `callback` unchanged. If every field
    /// is controlled neither `apply` nor `callback` runs.
    ///
    /// Returns whether `apply` was called.
    pub fn try_set_state<F>(
        &self,
        maybe_state: State,
        props: &Props,
        apply: F,
        callback: Option<Callback>,
    ) -> bool
    where
        F: FnOnce(State, Option<Callback>),
    {
        match self.uncontrolled_subset(maybe_state, props) {
            Some(state) => {
                apply(state, callback);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for AutoControlledManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoControlledManager")
            .field("fields", &self.fields)
            .field("initial_state", &self.initial_state.is_some())
            .field("state_from_props", &self.state_from_props.is_some())
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    fn toggle_manager() -> AutoControlledManager {
        AutoControlledManager::new(["active", "level"]).with_initial_state(|_| {
            State::from_pairs([("active", Value::from(false)), ("level", Value::from(0))])
        })
    }

    #[test]
    fn test_default_prop_name() {
        assert_eq!(default_prop_name("active"), "defaultActive");
        assert_eq!(default_prop_name("searchQuery"), "defaultSearchQuery");
        assert_eq!(default_prop_name("x"), "defaultX");
        assert_eq!(default_prop_name(""), "default");
    }

    #[test]
    fn test_initial_state_without_derivers() {
        let manager = AutoControlledManager::new(["active", "level"]);
        assert!(manager.initial_state(&Props::new()).is_empty());
    }

    #[test]
    fn test_initial_state_from_base() {
        let state = toggle_manager().initial_state(&Props::new());
        assert_eq!(
            state,
            State::from_pairs([("active", Value::from(false)), ("level", Value::from(0))])
        );
    }

    #[test]
    fn test_initial_state_precedence() {
        let manager = toggle_manager();

        let props = Props::from_pairs([
            ("active", Value::from(true)),
            ("defaultActive", Value::from(false)),
            ("defaultLevel", Value::from(7)),
        ]);
        let state = manager.initial_state(&props);

        assert_eq!(state.get("active"), Some(&Value::Bool(true)));
        assert_eq!(state.get("level"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_initial_state_null_prop_wins() {
        let props = Props::from_pairs([("active", Value::Null)]);
        let state = toggle_manager().initial_state(&props);
        assert_eq!(state.get("active"), Some(&Value::Null));
    }

    #[test]
    fn test_initial_state_keeps_other_base_fields() {
        let manager = AutoControlledManager::new(["open"]).with_initial_state(|_| {
            State::from_pairs([("open", Value::from(false)), ("hovered", Value::from(false))])
        });

        let state = manager.initial_state(&Props::from_pairs([("defaultOpen", true)]));
        assert_eq!(state.get("open"), Some(&Value::Bool(true)));
        assert_eq!(state.get("hovered"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_form_control_fallbacks() {
        let manager = AutoControlledManager::new(["checked", "value", "open"]);

        let state = manager.initial_state(&Props::new());
        assert_eq!(state.get("checked"), Some(&Value::Bool(false)));
        assert_eq!(state.get("value"), Some(&Value::from("")));
        assert!(!state.contains("open"));

        let state = manager.initial_state(&Props::from_pairs([("multiple", true)]));
        assert_eq!(state.get("value"), Some(&Value::Array(vec![])));
    }

    #[test]
    fn test_custom_fallbacks() {
        let manager = AutoControlledManager::new(["checked", "level"])
            .with_fallbacks(FallbackRules::none())
            .with_fallback("level", Fallback::constant(1));

        let state = manager.initial_state(&Props::new());
        assert!(!state.contains("checked"));
        assert_eq!(state.get("level"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_derived_state_echoes_controlled_fields() {
        let manager = toggle_manager();
        let prev = State::from_pairs([("active", Value::from(false)), ("level", Value::from(0))]);

        let next = manager.derived_state(&Props::from_pairs([("active", true)]), &prev);
        assert_eq!(next, State::from_pairs([("active", true)]));

        let next = manager.derived_state(&Props::from_pairs([("name", "demo")]), &prev);
        assert!(next.is_empty());
    }

    #[test]
    fn test_derived_state_with_deriver() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let seen_in = seen.clone();

        let manager = toggle_manager().with_state_from_props(move |_, merged| {
            *seen_in.lock().unwrap() = Some(merged.clone());
            let level = merged.get_as::<i64>("level").unwrap_or(0);
            State::from_pairs([("label", Value::from(format!("L{level}"))), ("active", false.into())])
        });

        let prev = State::from_pairs([("active", Value::from(false)), ("level", Value::from(2))]);
        let next = manager.derived_state(&Props::from_pairs([("level", 5), ("active", 1)]), &prev);

        // The deriver sees previous state with the echo applied, and wins on conflicts
        assert_eq!(
            seen.lock().unwrap().clone().unwrap(),
            State::from_pairs([("active", Value::from(1)), ("level", Value::from(5))])
        );
        assert_eq!(
            next,
            State::from_pairs([
                ("active", Value::from(false)),
                ("label", Value::from("L5")),
                ("level", Value::from(5)),
            ])
        );
    }

    #[test]
    fn test_try_set_state_filters_controlled() {
        let manager = toggle_manager();
        let props = Props::from_pairs([("active", true)]);
        let applied = RefCell::new(Vec::new());

        let called = manager.try_set_state(
            State::from_pairs([("active", Value::from(false)), ("level", Value::from(5))]),
            &props,
            |state, _| applied.borrow_mut().push(state),
            None,
        );

        assert!(called);
        assert_eq!(applied.into_inner(), vec![State::from_pairs([("level", 5)])]);
    }

    #[test]
    fn test_try_set_state_uncontrolled_passthrough() {
        let manager = toggle_manager();
        let applied = RefCell::new(None);

        manager.try_set_state(
            State::from_pairs([("active", false)]),
            &Props::new(),
            |state, _| *applied.borrow_mut() = Some(state),
            None,
        );

        assert_eq!(applied.into_inner(), Some(State::from_pairs([("active", false)])));
    }

    #[test]
    fn test_try_set_state_all_controlled_is_noop() {
        let manager = toggle_manager();
        let props = Props::from_pairs([("active", Value::from(true)), ("level", Value::Null)]);
        let fired = Rc::new(Cell::new(false));
        let fired_cb = fired.clone();
        let mut applies = 0;

        let called = manager.try_set_state(
            State::from_pairs([("active", Value::from(false)), ("level", Value::from(1))]),
            &props,
            |_, _| applies += 1,
            Some(Box::new(move || fired_cb.set(true))),
        );

        assert!(!called);
        assert_eq!(applies, 0);
        assert!(!fired.get());
    }

    #[test]
    fn test_try_set_state_passes_callback_through() {
        let manager = toggle_manager();
        let fired = Rc::new(Cell::new(0));
        let fired_cb = fired.clone();

        manager.try_set_state(
            State::from_pairs([("level", 1)]),
            &Props::new(),
            |_, callback| {
                if let Some(cb) = callback {
                    cb();
                }
            },
            Some(Box::new(move || fired_cb.set(fired_cb.get() + 1))),
        );

        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_non_auto_controlled_props_also_block_writes() {
        let manager = toggle_manager();
        let props = Props::from_pairs([("name", "owner")]);
        let subset = manager.uncontrolled_subset(
            State::from_pairs([("name", Value::from("self")), ("level", Value::from(1))]),
            &props,
        );
        assert_eq!(subset, Some(State::from_pairs([("level", 1)])));
    }
}
