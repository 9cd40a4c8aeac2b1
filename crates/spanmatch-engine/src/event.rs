//! Trace event record with by-name argument access.
//!
//! An [`Event`] is immutable once built: the upstream decoding stage produces
//! the input sequence, and the engine only ever reads it. Span events emitted
//! by the engine reuse the same type.

use bon::bon;
use serde::{Deserialize, Serialize};

/// One record in a trace: either a decoded input event or an emitted span.
///
/// Arguments form an ordered name/value mapping. Names are not required to be
/// unique; lookups by name return the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub(crate) name: String,
    pub(crate) kind: String,
    pub(crate) category: String,
    pub(crate) process: String,
    pub(crate) thread: String,
    pub(crate) start_ns: i64,
    pub(crate) end_ns: i64,
    pub(crate) arg_set_id: u64,
    pub(crate) args: Vec<(String, String)>,
}

#[bon]
impl Event {
    /// Build an event. Only `name` and `start_ns` are required.
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        #[builder(into, default)] kind: String,
        #[builder(into, default)] category: String,
        #[builder(into, default)] process: String,
        #[builder(into, default)] thread: String,
        /// Nanoseconds since trace origin.
        start_ns: i64,
        /// Defaults to `start_ns` (instantaneous event).
        end_ns: Option<i64>,
        #[builder(default)] arg_set_id: u64,
        #[builder(default)] args: Vec<(String, String)>,
    ) -> Self {
        Event {
            name,
            kind,
            category,
            process,
            thread,
            start_ns,
            end_ns: end_ns.unwrap_or(start_ns),
            arg_set_id,
            args,
        }
    }
}

impl Event {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The event type string (named `kind` because `type` is reserved).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// Start timestamp in nanoseconds since trace origin.
    pub fn start_ns(&self) -> i64 {
        self.start_ns
    }

    /// End timestamp in nanoseconds; equals `start_ns` for instantaneous events.
    pub fn end_ns(&self) -> i64 {
        self.end_ns
    }

    pub fn duration_ns(&self) -> i64 {
        self.end_ns - self.start_ns
    }

    /// Opaque identifier of the decoded argument set.
    pub fn arg_set_id(&self) -> u64 {
        self.arg_set_id
    }

    /// The ordered argument name/value pairs.
    pub fn args(&self) -> &[(String, String)] {
        &self.args
    }

    /// Argument names in order.
    pub fn arg_keys(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(k, _)| k.as_str())
    }

    /// Argument values in order.
    pub fn arg_values(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(_, v)| v.as_str())
    }

    /// Look up an argument value by name; first occurrence wins.
    ///
    /// Returns the empty string when the name is absent.
    pub fn arg_value(&self, key: &str) -> &str {
        self.args
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Whether an argument with the given name is present.
    pub fn has_arg(&self, key: &str) -> bool {
        self.args.iter().any(|(k, _)| k == key)
    }
}
