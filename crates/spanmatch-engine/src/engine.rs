//! Engine driver: one chronological pass over a finalized input sequence.
//!
//! The driver owns an ordered list of rule contexts sharing a single output
//! sink. Rule order is significant and caller-supplied; it is the only way to
//! express "try this specialization before the fallback".

use log::debug;

use crate::context::{Flow, RuleContext};
use crate::error::{CorrelateError, Result};
use crate::event::Event;
use crate::pattern::{PatternConfig, PatternRule};
use crate::rule::Rule;
use crate::sink::{SpanLog, SpanSink};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the engine driver.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Check the upstream guarantee that input events are sorted by start
    /// timestamp (non-decreasing) before running, and abort with
    /// [`CorrelateError::UnsortedInput`] on violation.
    ///
    /// Default: `true`.
    pub validate_order: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            validate_order: true,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Span correlation engine.
///
/// Walks the input sequence in index order; each event is offered to each
/// rule context in insertion order until one of them reports [`Flow::Stop`].
/// Pending starts without stops and stops without starts are discarded
/// silently at end of input.
pub struct Engine {
    contexts: Vec<RuleContext>,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with no rules.
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            contexts: Vec::new(),
            config,
        }
    }

    /// Append a rule; rules are consulted in insertion order.
    pub fn add_rule<R: Rule + 'static>(&mut self, rule: R) {
        self.contexts.push(RuleContext::new(Box::new(rule)));
    }

    /// Compile a [`PatternConfig`] and append the resulting rule.
    pub fn add_pattern_rule(&mut self, config: PatternConfig) -> Result<()> {
        self.add_rule(PatternRule::new(config)?);
        Ok(())
    }

    /// Number of rules loaded.
    pub fn rule_count(&self) -> usize {
        self.contexts.len()
    }

    /// Run one full pass over `events` and return the finalized output.
    ///
    /// State is reset at the start of every run, so running twice on the same
    /// input yields identical output. On error the run aborts and any partial
    /// output is discarded.
    pub fn run(&mut self, events: &[Event]) -> Result<SpanLog> {
        if self.config.validate_order {
            validate_order(events)?;
        }
        for ctx in &mut self.contexts {
            ctx.reset();
        }

        let mut sink = SpanSink::new();
        for index in 0..events.len() {
            for ctx in &mut self.contexts {
                if let Flow::Stop = ctx.process_event(events, index, &mut sink)? {
                    break;
                }
            }
        }

        debug!(
            "correlated {} events into {} spans across {} rules",
            events.len(),
            sink.len(),
            self.contexts.len()
        );
        Ok(sink.finalize())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn validate_order(events: &[Event]) -> Result<()> {
    for (i, pair) in events.windows(2).enumerate() {
        if pair[1].start_ns() < pair[0].start_ns() {
            return Err(CorrelateError::UnsortedInput { index: i + 1 });
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Property-based tests
// =============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::pattern::KeyFields;
    use proptest::prelude::*;

    fn scripted_events(script: &[(bool, u8)]) -> Vec<Event> {
        script
            .iter()
            .enumerate()
            .map(|(i, (is_start, thread))| {
                Event::builder()
                    .name(if *is_start { "Op_Start" } else { "Op_Stop" })
                    .process("app")
                    .thread(format!("t{thread}"))
                    .start_ns(i as i64 * 5)
                    .build()
            })
            .collect()
    }

    fn op_engine(allow_recursion: bool) -> Engine {
        let mut engine = Engine::default();
        engine
            .add_pattern_rule(PatternConfig {
                start_name: Some("Op_Start".to_string()),
                stop_name: Some("Op_Stop".to_string()),
                key_fields: KeyFields::THREAD,
                allow_recursion,
                ..PatternConfig::default()
            })
            .unwrap();
        engine
    }

    // -------------------------------------------------------------------------
    // 1. Every span has a non-negative duration and the stripped name
    // -------------------------------------------------------------------------
    proptest! {
        #[test]
        fn spans_are_well_formed(
            script in prop::collection::vec((any::<bool>(), 0u8..3), 0..40),
            recursion in any::<bool>(),
        ) {
            let events = scripted_events(&script);
            let log = op_engine(recursion).run(&events).unwrap();
            for span in &log {
                prop_assert_eq!(span.name(), "Op");
                prop_assert!(span.duration_ns() >= 0,
                    "span has negative duration: {:?}", span);
                prop_assert_eq!(span.duration_ns(), span.end_ns() - span.start_ns());
            }
        }
    }

    // -------------------------------------------------------------------------
    // 2. Emission order follows stop order: end timestamps never go backwards
    // -------------------------------------------------------------------------
    proptest! {
        #[test]
        fn emission_follows_stop_order(
            script in prop::collection::vec((any::<bool>(), 0u8..3), 0..40),
            recursion in any::<bool>(),
        ) {
            let events = scripted_events(&script);
            let log = op_engine(recursion).run(&events).unwrap();
            // Timestamps are strictly increasing by construction, so strictly
            // increasing end timestamps mean strictly increasing stop indices.
            for pair in log.spans().windows(2) {
                prop_assert!(pair[0].end_ns() < pair[1].end_ns(),
                    "spans emitted out of stop order: {:?}", log.spans());
            }
        }
    }

    // -------------------------------------------------------------------------
    // 3. Span count never exceeds the rarer side of the pairing
    // -------------------------------------------------------------------------
    proptest! {
        #[test]
        fn span_count_is_bounded(
            script in prop::collection::vec((any::<bool>(), 0u8..3), 0..40),
            recursion in any::<bool>(),
        ) {
            let events = scripted_events(&script);
            let starts = script.iter().filter(|(s, _)| *s).count();
            let stops = script.len() - starts;
            let log = op_engine(recursion).run(&events).unwrap();
            prop_assert!(log.len() <= starts.min(stops));
        }
    }

    // -------------------------------------------------------------------------
    // 4. Runs are deterministic, including across engine reuse
    // -------------------------------------------------------------------------
    proptest! {
        #[test]
        fn reruns_are_byte_identical(
            script in prop::collection::vec((any::<bool>(), 0u8..3), 0..40),
            recursion in any::<bool>(),
        ) {
            let events = scripted_events(&script);
            let mut engine = op_engine(recursion);
            let first = engine.run(&events).unwrap();
            let second = engine.run(&events).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
