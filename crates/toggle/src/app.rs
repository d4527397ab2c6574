//! Toggle App
//!
//! A button showing a click level next to an active/inactive checkbox. Both
//! `active` and `level` are auto-controlled: pass them as props to drive the
//! component from outside, or pass `defaultActive`/`defaultLevel` (or nothing)
//! and let clicks update them.

use serde::{Deserialize, Serialize};

use auto_controlled::{AutoControlledManager, Component, Context, Props, State, Value};

/// Typed props accepted by [`ToggleApp`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleProps {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub level: Option<i64>,
    pub default_active: Option<bool>,
    pub default_level: Option<i64>,
}

impl ToggleProps {
    /// Overlay every field set in `other`
    pub fn merge(&mut self, other: ToggleProps) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.active.is_some() {
            self.active = other.active;
        }
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.default_active.is_some() {
            self.default_active = other.default_active;
        }
        if other.default_level.is_some() {
            self.default_level = other.default_level;
        }
    }

    /// Props snapshot; unset fields are left out rather than nulled
    pub fn to_props(&self) -> Props {
        let mut props = Props::new();
        if let Some(name) = &self.name {
            props.insert("name", name.as_str());
        }
        if let Some(active) = self.active {
            props.insert("active", active);
        }
        if let Some(level) = self.level {
            props.insert("level", level);
        }
        if let Some(active) = self.default_active {
            props.insert("defaultActive", active);
        }
        if let Some(level) = self.default_level {
            props.insert("defaultLevel", level);
        }
        props
    }
}

/// The demo component
#[derive(Debug, Clone)]
pub struct ToggleApp {
    manager: AutoControlledManager,
}

impl ToggleApp {
    pub fn new() -> Self {
        let manager = AutoControlledManager::new(["active", "level"]).with_initial_state(|_| {
            State::from_pairs([("active", Value::from(false)), ("level", Value::from(0))])
        });
        Self { manager }
    }

    /// Flip `active` and bump `level`. Controlled fields stay as the owner set them.
    pub fn handle_click(&self, cx: &mut Context<'_>) -> bool {
        let state = cx.state();
        let active = state.get("active").is_some_and(Value::is_truthy);
        let level = next_level(state.get("level"));

        cx.try_set_state(
            State::from_pairs([("active", Value::from(!active)), ("level", level)]),
            None,
        )
    }
}

/// One step up from `level`. Floats stay floats, integers saturate at
/// `i64::MAX`, anything else starts over from zero.
fn next_level(level: Option<&Value>) -> Value {
    match level {
        Some(Value::Float(f)) => Value::Float(f + 1.0),
        Some(Value::Int(i)) => Value::Int(i.saturating_add(1)),
        _ => Value::Int(1),
    }
}

impl Default for ToggleApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ToggleApp {
    fn manager(&self) -> &AutoControlledManager {
        &self.manager
    }

    fn render(&self, props: &Props, state: &State) -> String {
        let mut lines = Vec::new();
        if let Some(name) = props.get("name").and_then(Value::as_str) {
            lines.push(name.to_string());
        }

        let level = match state.get("level") {
            Some(Value::Int(i)) => i.to_string(),
            Some(other) => serde_json::Value::from(other.clone()).to_string(),
            None => String::new(),
        };
        lines.push(format!("[ {level} ]"));

        if state.get("active").is_some_and(Value::is_truthy) {
            lines.push("[x] Active".to_string());
        } else {
            lines.push("[ ] Inactive".to_string());
        }

        lines.join("\n")
    }
}
