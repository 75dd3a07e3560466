//! Per-request execution context.
//!
//! The context is the sole vehicle for inter-step communication: a mutable
//! mapping from emit names to step results, seeded with `input`. It lives
//! for exactly one `/route` invocation; the second planning phase reuses
//! and extends it.

use serde_json::Value;

/// Mutable name→value mapping owned by one `/route` invocation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: serde_json::Map<String, Value>,
}

impl Context {
    /// A context seeded with `input`.
    pub fn seeded(input: Value) -> Self {
        let mut ctx = Self::default();
        ctx.set_input(input);
        ctx
    }

    /// Replace the `input` binding (phase B re-seeds it with the
    /// phase-A output text).
    pub fn set_input(&mut self, input: Value) {
        self.values.insert("input".to_string(), input);
    }

    /// Bind a step result under its emit name, replacing any prior
    /// binding from an earlier phase.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Resolve a dotted path against the context.
    ///
    /// Descends through maps only; an absent segment or a non-map at an
    /// intermediate position resolves to `None`.
    pub fn resolve_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// `input.text` as a string, or empty when absent. This is what model
    /// steps receive as the user message.
    pub fn input_text(&self) -> &str {
        self.resolve_path("input.text")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}
