//! Fallback values for auto-controlled fields
//!
//! When neither the props, their `default*` counterparts, nor the base state
//! supply a field at construction time, the field's fallback rule decides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::Props;
use crate::value::Value;

/// How a single field resolves when nothing else supplies it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Fallback {
    /// Leave the field absent
    Absent,
    /// Always use this value
    Constant { value: Value },
    /// `when_set` if the props carry a truthy `flag`, otherwise `otherwise`
    ByFlag {
        flag: String,
        when_set: Value,
        otherwise: Value,
    },
}

impl Fallback {
    pub fn constant(value: impl Into<Value>) -> Self {
        Fallback::Constant {
            value: value.into(),
        }
    }

    pub fn by_flag(
        flag: impl Into<String>,
        when_set: impl Into<Value>,
        otherwise: impl Into<Value>,
    ) -> Self {
        Fallback::ByFlag {
            flag: flag.into(),
            when_set: when_set.into(),
            otherwise: otherwise.into(),
        }
    }

    /// Evaluate the rule against the props being mounted with
    pub fn resolve(&self, props: &Props) -> Option<Value> {
        match self {
            Fallback::Absent => None,
            Fallback::Constant { value } => Some(value.clone()),
            Fallback::ByFlag {
                flag,
                when_set,
                otherwise,
            } => {
                let set = props.get(flag).is_some_and(Value::is_truthy);
                Some(if set { when_set } else { otherwise }.clone())
            }
        }
    }
}

/// Per-field fallback table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackRules {
    rules: BTreeMap<String, Fallback>,
}

impl FallbackRules {
    /// No fallbacks; every unresolved field stays absent
    pub fn none() -> Self {
        Self::default()
    }

    /// Form-control fallbacks: `checked` starts `false`, and `value` starts as
    /// `[]` for multi-selects (truthy `multiple` prop) or `""` otherwise.
    /// A component that starts uncontrolled with these fields therefore never
    /// renders an undefined checked/value.
    pub fn form_controls() -> Self {
        Self::none()
            .with("checked", Fallback::constant(false))
            .with("value", Fallback::by_flag("multiple", Vec::<Value>::new(), ""))
    }

    /// Add or replace the rule for `field`
    pub fn with(mut self, field: impl Into<String>, rule: Fallback) -> Self {
        self.insert(field, rule);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, rule: Fallback) {
        self.rules.insert(field.into(), rule);
    }

    pub fn get(&self, field: &str) -> Option<&Fallback> {
        self.rules.get(field)
    }

    /// Resolve `field`; fields without a rule resolve to absent
    pub fn resolve(&self, field: &str, props: &Props) -> Option<Value> {
        self.get(field).and_then(|rule| rule.resolve(props))
    }
}
