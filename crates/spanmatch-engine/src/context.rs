//! Per-rule correlation state.
//!
//! A [`RuleContext`] wraps one rule with its mutable state: a map from
//! [`EventKey`] to a LIFO stack of input indices for starts that have not
//! been paired yet. Stacks are removed as soon as they drain so transient
//! keys cannot grow the map without bound.

use std::collections::HashMap;

use crate::error::{CorrelateError, Result};
use crate::event::Event;
use crate::rule::{Action, EventKey, Rule, StopBehavior};
use crate::sink::SpanSink;

/// Whether the driver should keep offering the current event to later rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// One rule plus its per-key pending-start stacks.
pub struct RuleContext {
    rule: Box<dyn Rule>,
    pending: HashMap<EventKey, Vec<usize>>,
}

impl RuleContext {
    pub fn new(rule: Box<dyn Rule>) -> Self {
        RuleContext {
            rule,
            pending: HashMap::new(),
        }
    }

    /// Offer the event at `index` to this rule and apply the resulting action.
    ///
    /// Successful `PopProcess` pairings append their span to `sink`. The
    /// returned [`Flow`] tells the driver whether later rules see this event:
    /// the rule's stop behavior must be strictly looser than the threshold
    /// the outcome reached.
    ///
    /// | Outcome | Threshold |
    /// |---|---|
    /// | not recognized | always `Continue` |
    /// | ignored | `OnMatch` |
    /// | stack changed (push / replace / discard) | `OnAction` |
    /// | stop with no pending start | `OnMatch` |
    /// | pairing emitted | `OnProcess` |
    pub fn process_event(
        &mut self,
        events: &[Event],
        index: usize,
        sink: &mut SpanSink,
    ) -> Result<Flow> {
        let event = events.get(index).ok_or(CorrelateError::IndexOutOfBounds {
            index,
            len: events.len(),
        })?;
        let behavior = self.rule.stop_behavior();

        match self.rule.examine(event) {
            Action::None => Ok(Flow::Continue),
            Action::Ignore => Ok(continue_past(behavior, StopBehavior::OnMatch)),
            Action::Push(key) => {
                self.pending.entry(key).or_default().push(index);
                Ok(continue_past(behavior, StopBehavior::OnAction))
            }
            Action::Replace(key) => {
                let stack = self.pending.entry(key).or_default();
                stack.pop();
                stack.push(index);
                Ok(continue_past(behavior, StopBehavior::OnAction))
            }
            Action::PopDiscard(key) => {
                self.pop_pending(&key);
                Ok(continue_past(behavior, StopBehavior::OnAction))
            }
            Action::PopProcess(key) => match self.pop_pending(&key) {
                Some(start_index) => {
                    let start =
                        events
                            .get(start_index)
                            .ok_or(CorrelateError::IndexOutOfBounds {
                                index: start_index,
                                len: events.len(),
                            })?;
                    sink.append(self.rule.process(start, event));
                    Ok(continue_past(behavior, StopBehavior::OnProcess))
                }
                None => Ok(continue_past(behavior, StopBehavior::OnMatch)),
            },
        }
    }

    /// Pop the top pending start for `key`, pruning the stack if it drains.
    fn pop_pending(&mut self, key: &EventKey) -> Option<usize> {
        let popped = self.pending.get_mut(key).and_then(|stack| stack.pop());
        if self.pending.get(key).is_some_and(|stack| stack.is_empty()) {
            self.pending.remove(key);
        }
        popped
    }

    /// Drop all pending state; called by the driver at the start of a run.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Number of keys with a live pending-start stack (for monitoring).
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }
}

fn continue_past(behavior: StopBehavior, threshold: StopBehavior) -> Flow {
    if behavior > threshold {
        Flow::Continue
    } else {
        Flow::Stop
    }
}

// =============================================================================
// Tests
// =============================================================================
