//! Rule strategy surface: classification actions, stop behavior, correlation
//! keys, and span construction.
//!
//! A [`Rule`] decides which events are starts, which are stops, and how they
//! are bucketed; [`crate::context::RuleContext`] owns the per-bucket state.

use std::fmt;

use crate::event::Event;

const START_SUFFIX: &str = "_Start";
const STOP_SUFFIX: &str = "_Stop";

/// Structural identifier grouping events into a correlation bucket.
///
/// Two keys are equal iff all fields are equal; `None` equals `None`.
/// Keys never reference their source event.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct EventKey {
    pub name: Option<String>,
    pub opcode: Option<String>,
    pub process: Option<String>,
    pub thread: Option<String>,
    /// Additional key values, in rule-configuration order.
    pub extra: Vec<Option<String>>,
}

impl EventKey {
    /// A key with every field unset. Useful as a struct-update base.
    pub fn empty() -> Self {
        EventKey {
            name: None,
            opcode: None,
            process: None,
            thread: None,
            extra: Vec::new(),
        }
    }
}

/// How a rule classified one event.
///
/// Variants that operate on a pending-start stack carry the [`EventKey`]
/// selecting that stack, so an action can never require a key it does not have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The event is irrelevant to this rule.
    None,
    /// The event is recognized but intentionally skipped.
    Ignore,
    /// The event is a start: push its index onto the key's stack.
    Push(EventKey),
    /// Non-recursive start: discard the key's current top, then push.
    Replace(EventKey),
    /// Stop that removes the key's top start without emitting.
    PopDiscard(EventKey),
    /// Stop that pairs with the key's top start and emits a span.
    PopProcess(EventKey),
}

/// Threshold controlling whether later rules see an event this rule acted on.
///
/// Ordered strictly by looseness: `OnMatch < OnAction < OnProcess < Never`.
/// The driver continues to the next rule only when the rule's stop behavior
/// is strictly looser than the threshold its outcome reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StopBehavior {
    /// Stop as soon as the rule recognizes the event at all.
    OnMatch,
    /// Stop once the event changed this rule's pending state.
    OnAction,
    /// Stop only when the event completed a pairing.
    OnProcess,
    /// Never stop; later rules always see the event.
    Never,
}

impl fmt::Display for StopBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopBehavior::OnMatch => "on-match",
            StopBehavior::OnAction => "on-action",
            StopBehavior::OnProcess => "on-process",
            StopBehavior::Never => "never",
        };
        f.write_str(s)
    }
}

/// Strategy deciding which events are starts, which are stops, and how a
/// matched pair becomes a span.
pub trait Rule {
    /// Classify an event relative to this rule.
    fn examine(&self, event: &Event) -> Action;

    /// Build a span from a matched pair.
    ///
    /// The default covers the standard contract: the span inherits the
    /// start's identity fields, runs from the start's start timestamp to the
    /// stop's start timestamp, and takes the start's name with a trailing
    /// `_Start`/`_Stop` removed.
    fn process(&self, start: &Event, stop: &Event) -> Event {
        span_between(start, stop)
    }

    /// Threshold used by the driver after this rule acts on an event.
    fn stop_behavior(&self) -> StopBehavior;
}

/// Remove a trailing `_Start` or `_Stop` from an event name.
///
/// Removes exactly the suffix and nothing else; names without either suffix
/// pass through unchanged.
pub fn strip_start_stop(name: &str) -> &str {
    name.strip_suffix(START_SUFFIX)
        .or_else(|| name.strip_suffix(STOP_SUFFIX))
        .unwrap_or(name)
}

/// Build a span event from a start/stop pair.
///
/// The span runs from `start.start_ns()` to `stop.start_ns()`; everything
/// except the name and the timestamps is inherited from the start.
pub fn span_between(start: &Event, stop: &Event) -> Event {
    Event {
        name: strip_start_stop(start.name()).to_string(),
        kind: start.kind().to_string(),
        category: start.category().to_string(),
        process: start.process().to_string(),
        thread: start.thread().to_string(),
        start_ns: start.start_ns(),
        end_ns: stop.start_ns(),
        arg_set_id: start.arg_set_id(),
        args: start.args().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_strip_removes_exactly_the_suffix() {
        assert_eq!(strip_start_stop("Frame_Start"), "Frame");
        assert_eq!(strip_start_stop("Frame_Stop"), "Frame");
        assert_eq!(strip_start_stop("Frame"), "Frame");
        assert_eq!(strip_start_stop("_Start"), "");
        // Only the trailing suffix is removed.
        assert_eq!(strip_start_stop("A_Start_Stop"), "A_Start");
        assert_eq!(strip_start_stop("Start"), "Start");
    }

    #[test]
    fn test_span_inherits_start_fields() {
        let start = Event::builder()
            .name("Parse_Start")
            .kind("generic")
            .category("loading")
            .process("renderer")
            .thread("main")
            .start_ns(100)
            .arg_set_id(9)
            .args(vec![("url".to_string(), "/index".to_string())])
            .build();
        let stop = Event::builder()
            .name("Parse_Stop")
            .process("renderer")
            .thread("main")
            .start_ns(160)
            .args(vec![("status".to_string(), "ok".to_string())])
            .build();

        let span = span_between(&start, &stop);
        assert_eq!(span.name(), "Parse");
        assert_eq!(span.kind(), "generic");
        assert_eq!(span.category(), "loading");
        assert_eq!(span.process(), "renderer");
        assert_eq!(span.thread(), "main");
        assert_eq!(span.start_ns(), 100);
        assert_eq!(span.end_ns(), 160);
        assert_eq!(span.duration_ns(), 60);
        assert_eq!(span.arg_set_id(), 9);
        // Args come from the start, not the stop.
        assert_eq!(span.arg_value("url"), "/index");
        assert_eq!(span.arg_value("status"), "");
    }

    #[test]
    fn test_keys_compare_structurally() {
        let a = EventKey {
            process: Some("app".to_string()),
            thread: Some("t1".to_string()),
            ..EventKey::empty()
        };
        let b = EventKey {
            process: Some("app".to_string()),
            thread: Some("t1".to_string()),
            ..EventKey::empty()
        };
        let c = EventKey {
            process: Some("app".to_string()),
            thread: Some("t2".to_string()),
            ..EventKey::empty()
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
        // None is not the same as an empty string.
        let d = EventKey {
            process: Some("app".to_string()),
            thread: Some("t1".to_string()),
            name: Some(String::new()),
            ..EventKey::empty()
        };
        assert_ne!(a, d);
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        let mut map: HashMap<EventKey, usize> = HashMap::new();
        let a = EventKey {
            thread: Some("t1".to_string()),
            extra: vec![Some("7".to_string())],
            ..EventKey::empty()
        };
        let b = a.clone();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn test_stop_behavior_orders_by_looseness() {
        assert!(StopBehavior::OnMatch < StopBehavior::OnAction);
        assert!(StopBehavior::OnAction < StopBehavior::OnProcess);
        assert!(StopBehavior::OnProcess < StopBehavior::Never);
    }
}
