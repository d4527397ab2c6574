//! Minimal synchronous component host
//!
//! Drives a [`Component`] through the lifecycle points the manager hooks into:
//! mount, props updates and event handlers. State writes requested from a
//! handler are queued and committed together once the handler returns, and
//! their callbacks run after the commit.

use tracing::debug;

use crate::manager::{AutoControlledManager, Callback};
use crate::snapshot::{Props, State};

/// A component whose state is reconciled by an [`AutoControlledManager`]
pub trait Component {
    /// Manager describing the component's auto-controlled fields
    fn manager(&self) -> &AutoControlledManager;

    /// Render a frame from the current props and state
    fn render(&self, props: &Props, state: &State) -> String;
}

/// Handle given to event handlers
pub struct Context<'a> {
    manager: &'a AutoControlledManager,
    props: &'a Props,
    state: &'a State,
    pending: &'a mut Vec<(State, Option<Callback>)>,
}

impl<'a> Context<'a> {
    pub fn props(&self) -> &Props {
        self.props
    }

    /// State as of the start of the handler; queued writes are not visible yet
    pub fn state(&self) -> &State {
        self.state
    }

    /// Request a state change. Fields the owner controls are dropped; if none
    /// remain the request is ignored and `callback` never runs.
    pub fn try_set_state(&mut self, maybe_state: State, callback: Option<Callback>) -> bool {
        let pending = &mut *self.pending;
        self.manager.try_set_state(
            maybe_state,
            self.props,
            |state, callback| pending.push((state, callback)),
            callback,
        )
    }
}

/// A mounted component instance
pub struct Host<C: Component> {
    component: C,
    props: Props,
    state: State,
    last_frame: String,
    render_count: usize,
}

impl<C: Component> Host<C> {
    /// Build initial state, reconcile with the initial props and render once
    pub fn mount(component: C, props: Props) -> Self {
        let manager = component.manager();
        let mut state = manager.initial_state(&props);
        state.merge(manager.derived_state(&props, &state));
        debug!(props = %props, state = %state, "mounted component");

        let mut host = Self {
            component,
            props,
            state,
            last_frame: String::new(),
            render_count: 0,
        };
        host.render();
        host
    }

    /// Replace the props and reconcile state with them
    pub fn set_props(&mut self, props: Props) {
        let derived = self.component.manager().derived_state(&props, &self.state);
        debug!(props = %props, derived = %derived, "props updated");

        self.props = props;
        self.state.merge(derived);
        self.render();
    }

    /// Run an event handler, then commit whatever state it requested.
    ///
    /// Returns the number of committed state updates.
    pub fn dispatch<F>(&mut self, handler: F) -> usize
    where
        F: FnOnce(&C, &mut Context<'_>),
    {
        let mut pending = Vec::new();
        {
            let mut cx = Context {
                manager: self.component.manager(),
                props: &self.props,
                state: &self.state,
                pending: &mut pending,
            };
            handler(&self.component, &mut cx);
        }

        if pending.is_empty() {
            return 0;
        }

        let count = pending.len();
        let mut callbacks = Vec::new();
        for (partial, callback) in pending {
            debug!(update = %partial, "committing state");
            self.state.merge(partial);
            callbacks.extend(callback);
        }
        self.render();

        for callback in callbacks {
            callback();
        }
        count
    }

    /// Re-render from the current props and state
    pub fn render(&mut self) -> &str {
        self.last_frame = self.component.render(&self.props, &self.state);
        self.render_count += 1;
        &self.last_frame
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::value::Value;

    struct Counter {
        manager: AutoControlledManager,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                manager: AutoControlledManager::new(["count"])
                    .with_initial_state(|_| State::from_pairs([("count", 0)])),
            }
        }

        fn increment(&self, cx: &mut Context<'_>) {
            let count = cx.state().get_as::<i64>("count").unwrap_or(0);
            cx.try_set_state(State::from_pairs([("count", count + 1)]), None);
        }
    }

    impl Component for Counter {
        fn manager(&self) -> &AutoControlledManager {
            &self.manager
        }

        fn render(&self, _props: &Props, state: &State) -> String {
            format!("count={}", state.get("count").and_then(Value::as_i64).unwrap_or(0))
        }
    }

    #[test]
    fn test_mount_renders_once() {
        let host = Host::mount(Counter::new(), Props::from_pairs([("defaultCount", 3)]));
        assert_eq!(host.last_frame(), "count=3");
        assert_eq!(host.render_count(), 1);
    }

    #[test]
    fn test_uncontrolled_dispatch() {
        let mut host = Host::mount(Counter::new(), Props::new());

        assert_eq!(host.dispatch(|c, cx| c.increment(cx)), 1);
        assert_eq!(host.dispatch(|c, cx| c.increment(cx)), 1);

        assert_eq!(host.state().get_as::<i64>("count").unwrap(), 2);
        assert_eq!(host.last_frame(), "count=2");
        assert_eq!(host.render_count(), 3);
    }

    #[test]
    fn test_controlled_dispatch_is_ignored() {
        let mut host = Host::mount(Counter::new(), Props::from_pairs([("count", 10)]));

        assert_eq!(host.dispatch(|c, cx| c.increment(cx)), 0);
        assert_eq!(host.state().get_as::<i64>("count").unwrap(), 10);
        assert_eq!(host.render_count(), 1);
    }

    #[test]
    fn test_set_props_switches_mode() {
        let mut host = Host::mount(Counter::new(), Props::new());
        host.dispatch(|c, cx| c.increment(cx));

        host.set_props(Props::from_pairs([("count", 42)]));
        assert_eq!(host.last_frame(), "count=42");
        host.dispatch(|c, cx| c.increment(cx));
        assert_eq!(host.last_frame(), "count=42");

        // Dropping the prop hands the field back to the component, keeping its value
        host.set_props(Props::new());
        assert_eq!(host.state().get_as::<i64>("count").unwrap(), 42);
        host.dispatch(|c, cx| c.increment(cx));
        assert_eq!(host.last_frame(), "count=43");
    }

    #[test]
    fn test_batched_writes_and_callbacks() {
        let mut host = Host::mount(Counter::new(), Props::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = log.clone();
        let second = log.clone();
        let committed = host.dispatch(move |_, cx| {
            cx.try_set_state(
                State::from_pairs([("count", 1)]),
                Some(Box::new(move || first.borrow_mut().push("first"))),
            );
            cx.try_set_state(
                State::from_pairs([("count", 5)]),
                Some(Box::new(move || second.borrow_mut().push("second"))),
            );
            // Writes are queued until the handler returns
            assert_eq!(cx.state().get_as::<i64>("count").unwrap(), 0);
        });

        assert_eq!(committed, 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(host.state().get_as::<i64>("count").unwrap(), 5);
        assert_eq!(host.render_count(), 2);
    }
}
