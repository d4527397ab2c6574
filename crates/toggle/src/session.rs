//! Scripted Sessions
//!
//! A session mounts a [`ToggleApp`] and plays steps against it, acting as
//! both the user (clicks) and the owning context (prop changes).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use auto_controlled::{Host, Props, Value};

use crate::app::ToggleApp;

/// One scripted action
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Click the button
    Click,
    /// Print the current output again
    Show,
    /// Owner supplies a prop: `set <field> <json>`
    Set { field: String, value: Value },
    /// Owner stops supplying a prop: `unset <field>`
    Unset { field: String },
}

/// Error when parsing a step
#[derive(Debug, thiserror::Error)]
pub enum StepParseError {
    #[error("Empty step")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Missing argument for `{command}`: expected {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid JSON value: {0}")]
    InvalidValue(#[from] serde_json::Error),
}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (command, rest) = match s.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (s, ""),
        };

        match command.to_ascii_lowercase().as_str() {
            "" => Err(StepParseError::Empty),
            "click" | "show" if !rest.is_empty() => {
                Err(StepParseError::UnexpectedArgument(rest.to_string()))
            }
            "click" => Ok(Step::Click),
            "show" => Ok(Step::Show),
            "set" => {
                let (field, raw) = rest.split_once(char::is_whitespace).ok_or(
                    StepParseError::MissingArgument {
                        command: "set",
                        expected: "<field> <json-value>",
                    },
                )?;
                let json: serde_json::Value = serde_json::from_str(raw.trim())?;
                Ok(Step::Set {
                    field: field.to_string(),
                    value: json.into(),
                })
            }
            "unset" => {
                if rest.is_empty() {
                    return Err(StepParseError::MissingArgument {
                        command: "unset",
                        expected: "<field>",
                    });
                }
                if rest.contains(char::is_whitespace) {
                    return Err(StepParseError::UnexpectedArgument(rest.to_string()));
                }
                Ok(Step::Unset {
                    field: rest.to_string(),
                })
            }
            _ => Err(StepParseError::UnknownCommand(command.to_string())),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Click => write!(f, "click"),
            Step::Show => write!(f, "show"),
            Step::Set { field, value } => {
                write!(f, "set {} {}", field, serde_json::Value::from(value.clone()))
            }
            Step::Unset { field } => write!(f, "unset {field}"),
        }
    }
}

/// How a session reports the component after each step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The rendered frame
    #[default]
    Text,
    /// State snapshot as JSON
    Json,
    /// State snapshot as TOML
    Toml,
}

/// Error when formatting session output
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// A mounted toggle driven by script steps
pub struct Session {
    host: Host<ToggleApp>,
    format: OutputFormat,
}

impl Session {
    /// Mount the component with the given props
    pub fn new(props: Props, format: OutputFormat) -> Self {
        info!(props = %props, "mounting toggle");
        Self {
            host: Host::mount(ToggleApp::new(), props),
            format,
        }
    }

    /// Apply one step. Returns whether the component re-rendered.
    pub fn apply(&mut self, step: &Step) -> bool {
        debug!(%step, "applying step");
        match step {
            Step::Click => {
                let committed = self.host.dispatch(|app, cx| {
                    app.handle_click(cx);
                });
                if committed == 0 {
                    info!("click ignored: every field is controlled");
                }
                committed > 0
            }
            Step::Show => false,
            Step::Set { field, value } => {
                let mut props = self.host.props().clone();
                props.insert(field.clone(), value.clone());
                self.host.set_props(props);
                true
            }
            Step::Unset { field } => {
                let mut props = self.host.props().clone();
                if props.remove(field).is_none() {
                    return false;
                }
                self.host.set_props(props);
                true
            }
        }
    }

    /// Current output in the session's format
    pub fn output(&self) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Text => Ok(self.host.last_frame().to_string()),
            OutputFormat::Json => {
                let json = serde_json::Value::from(self.host.state().clone());
                Ok(serde_json::to_string(&json)?)
            }
            OutputFormat::Toml => {
                let table: toml::Table = self
                    .host
                    .state()
                    .iter()
                    .filter_map(|(field, value)| Some((field.clone(), to_toml(value)?)))
                    .collect();
                Ok(toml::to_string(&table)?)
            }
        }
    }

    pub fn host(&self) -> &Host<ToggleApp> {
        &self.host
    }
}

/// TOML has no null: null fields, array elements and object entries are
/// left out of the output.
fn to_toml(value: &Value) -> Option<toml::Value> {
    Some(match value {
        Value::Null => return None,
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Int(i) => toml::Value::Integer(*i),
        Value::Float(f) => toml::Value::Float(*f),
        Value::String(s) => toml::Value::String(s.clone()),
        Value::Array(items) => toml::Value::Array(items.iter().filter_map(to_toml).collect()),
        Value::Object(fields) => toml::Value::Table(
            fields
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), to_toml(v)?)))
                .collect(),
        ),
    })
}
