//! The default configurable correlation rule.
//!
//! `PatternRule` classifies events by name pattern and/or opcode and builds
//! correlation keys from a selectable set of event fields plus optional
//! argument pairs. Following the compile-then-evaluate model, the name
//! patterns are compiled once at construction; classification on the hot
//! path is `Regex::is_match` plus argument lookups.

use bitflags::bitflags;
use regex::Regex;

use crate::error::{CorrelateError, Result};
use crate::event::Event;
use crate::rule::{Action, EventKey, Rule, StopBehavior};

/// Argument name under which the upstream decoder exposes the event opcode.
pub const OPCODE_ARG: &str = "debug.OPCODE";

bitflags! {
    /// Event fields contributing to the correlation key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyFields: u8 {
        const EVENT_NAME = 1 << 0;
        const OPCODE = 1 << 1;
        const PROCESS = 1 << 2;
        const THREAD = 1 << 3;
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for [`PatternRule`].
///
/// At least one of `start_name`/`start_opcode` and one of
/// `stop_name`/`stop_opcode` must be set; [`PatternRule::new`] rejects the
/// config otherwise.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    /// Regex matched against the event name to recognize a start.
    pub start_name: Option<String>,
    /// Regex matched against the event name to recognize a stop.
    pub stop_name: Option<String>,
    /// Opcode value (the `debug.OPCODE` argument) recognizing a start.
    pub start_opcode: Option<String>,
    /// Opcode value recognizing a stop.
    pub stop_opcode: Option<String>,
    /// Event fields included in the correlation key.
    pub key_fields: KeyFields,
    /// Whether nested starts stack up (`Push`) or displace each other
    /// (`Replace`).
    pub allow_recursion: bool,
    /// Threshold handed to the driver after this rule acts on an event.
    pub stop_behavior: StopBehavior,
    /// `(start_arg, stop_arg)` pairs whose values extend the key.
    ///
    /// A start is only recognized when every start-side name is present in
    /// the event's arguments; likewise for stops and stop-side names. The
    /// looked-up values (empty string when absent) become the key's `extra`
    /// entries, in order.
    pub key_args: Vec<(String, String)>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            start_name: None,
            stop_name: None,
            start_opcode: None,
            stop_opcode: None,
            key_fields: KeyFields::PROCESS | KeyFields::THREAD,
            allow_recursion: false,
            stop_behavior: StopBehavior::OnAction,
            key_args: Vec::new(),
        }
    }
}

// =============================================================================
// Rule
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Side {
    Start,
    Stop,
}

/// The default configurable rule, compiled from a [`PatternConfig`].
#[derive(Debug)]
pub struct PatternRule {
    start_name: Option<Regex>,
    stop_name: Option<Regex>,
    start_opcode: Option<String>,
    stop_opcode: Option<String>,
    key_fields: KeyFields,
    allow_recursion: bool,
    stop_behavior: StopBehavior,
    key_args: Vec<(String, String)>,
}

impl PatternRule {
    /// Compile a configuration into a rule.
    ///
    /// Fails with [`CorrelateError::MissingStartMatcher`] /
    /// [`CorrelateError::MissingStopMatcher`] when a side has no predicate at
    /// all, and with [`CorrelateError::InvalidRegex`] when a name pattern
    /// does not compile.
    pub fn new(config: PatternConfig) -> Result<Self> {
        if config.start_name.is_none() && config.start_opcode.is_none() {
            return Err(CorrelateError::MissingStartMatcher);
        }
        if config.stop_name.is_none() && config.stop_opcode.is_none() {
            return Err(CorrelateError::MissingStopMatcher);
        }
        let start_name = config.start_name.as_deref().map(Regex::new).transpose()?;
        let stop_name = config.stop_name.as_deref().map(Regex::new).transpose()?;
        Ok(PatternRule {
            start_name,
            stop_name,
            start_opcode: config.start_opcode,
            stop_opcode: config.stop_opcode,
            key_fields: config.key_fields,
            allow_recursion: config.allow_recursion,
            stop_behavior: config.stop_behavior,
            key_args: config.key_args,
        })
    }

    /// All configured predicates for one side must hold; missing predicates
    /// are wildcards (construction guarantees at least one is set).
    fn matches_side(&self, event: &Event, side: Side) -> bool {
        let (name_re, opcode) = match side {
            Side::Start => (&self.start_name, &self.start_opcode),
            Side::Stop => (&self.stop_name, &self.stop_opcode),
        };
        if let Some(re) = name_re
            && !re.is_match(event.name())
        {
            return false;
        }
        if let Some(op) = opcode
            && event.arg_value(OPCODE_ARG) != op
        {
            return false;
        }
        self.key_args.iter().all(|(start_arg, stop_arg)| {
            event.has_arg(match side {
                Side::Start => start_arg,
                Side::Stop => stop_arg,
            })
        })
    }

    fn key_for(&self, event: &Event, side: Side) -> EventKey {
        EventKey {
            name: self
                .key_fields
                .contains(KeyFields::EVENT_NAME)
                .then(|| event.name().to_string()),
            opcode: self
                .key_fields
                .contains(KeyFields::OPCODE)
                .then(|| event.arg_value(OPCODE_ARG).to_string()),
            process: self
                .key_fields
                .contains(KeyFields::PROCESS)
                .then(|| event.process().to_string()),
            thread: self
                .key_fields
                .contains(KeyFields::THREAD)
                .then(|| event.thread().to_string()),
            extra: self
                .key_args
                .iter()
                .map(|(start_arg, stop_arg)| {
                    let arg = match side {
                        Side::Start => start_arg,
                        Side::Stop => stop_arg,
                    };
                    Some(event.arg_value(arg).to_string())
                })
                .collect(),
        }
    }
}

impl Rule for PatternRule {
    /// Start predicates are tested before stop predicates, so an event that
    /// could match both sides classifies as a start.
    fn examine(&self, event: &Event) -> Action {
        if self.matches_side(event, Side::Start) {
            let key = self.key_for(event, Side::Start);
            if self.allow_recursion {
                Action::Push(key)
            } else {
                Action::Replace(key)
            }
        } else if self.matches_side(event, Side::Stop) {
            Action::PopProcess(self.key_for(event, Side::Stop))
        } else {
            Action::None
        }
    }

    fn stop_behavior(&self) -> StopBehavior {
        self.stop_behavior
    }
}

// =============================================================================
// Tests
// =============================================================================
