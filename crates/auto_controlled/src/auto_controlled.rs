//! Auto-Controlled State - controlled/uncontrolled state reconciliation for components
//!
//! A component can let its owner drive some of its state through props
//! ("controlled") or manage that state itself, optionally seeded by a
//! `default<Field>` prop ("uncontrolled"). [`AutoControlledManager`] computes
//! the initial state, reconciles state on every props update so supplied props
//! always win, and filters the component's own writes so controlled fields are
//! never overwritten.
//!
//! [`Host`] is a small synchronous lifecycle driver for components built on the
//! manager.

mod fallback;
mod host;
mod manager;
mod snapshot;
mod value;

pub use fallback::*;
pub use host::*;
pub use manager::*;
pub use snapshot::*;
pub use value::*;

#[cfg(test)]
mod proptests;
