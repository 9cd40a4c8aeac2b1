//! # spanmatch-engine
//!
//! Start/stop span correlation for chronologically ordered trace events.
//!
//! The engine scans a finalized input sequence once, offers every event to an
//! ordered list of rules, and synthesizes *span* events by pairing starts with
//! stops. Pairing is keyed: each rule buckets its pending starts by an
//! [`EventKey`] built from event fields, and stops pop the most recent start
//! in their bucket, so recursive nesting resolves innermost-first.
//!
//! ## Architecture
//!
//! - **Rules** (stateless): classify events into start/stop/ignore actions.
//!   The default [`PatternRule`] matches by name regex and/or opcode and is
//!   compiled once at construction.
//! - **Rule contexts** (stateful): per-rule maps from key to a LIFO stack of
//!   pending start indices, pruned as stacks drain.
//! - **Driver**: walks the input in index order; a rule's
//!   [`StopBehavior`] decides whether later rules see the same event.
//!
//! Unmatched starts and stops are discarded silently at end of input; real
//! traces are truncated at both ends.
//!
//! ## Quick Start
//!
//! ```rust
//! use spanmatch_engine::{Engine, Event, KeyFields, PatternConfig};
//!
//! let mut engine = Engine::default();
//! engine
//!     .add_pattern_rule(PatternConfig {
//!         start_name: Some("Frame_Start".to_string()),
//!         stop_name: Some("Frame_Stop".to_string()),
//!         key_fields: KeyFields::PROCESS | KeyFields::THREAD,
//!         ..PatternConfig::default()
//!     })
//!     .unwrap();
//!
//! let events = vec![
//!     Event::builder()
//!         .name("Frame_Start")
//!         .process("compositor")
//!         .thread("render")
//!         .start_ns(100)
//!         .build(),
//!     Event::builder()
//!         .name("Frame_Stop")
//!         .process("compositor")
//!         .thread("render")
//!         .start_ns(150)
//!         .build(),
//! ];
//!
//! let spans = engine.run(&events).unwrap();
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].name(), "Frame");
//! assert_eq!(spans[0].duration_ns(), 50);
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod pattern;
pub mod rule;
pub mod sink;

// Re-export the most commonly used types at crate root
pub use context::{Flow, RuleContext};
pub use engine::{Engine, EngineConfig};
pub use error::{CorrelateError, Result};
pub use event::Event;
pub use pattern::{KeyFields, OPCODE_ARG, PatternConfig, PatternRule};
pub use rule::{Action, EventKey, Rule, StopBehavior, span_between, strip_start_stop};
pub use sink::{SpanLog, SpanSink};
