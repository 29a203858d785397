//! Logger adapter forwarding structured events to `tracing`.
//!
//! Fields are redacted before they leave the process; the subscriber
//! installed by the binary decides the output format.

use knowledge_search_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use knowledge_search_shared::{REDACTED, is_secret_key};
use serde_json::Value;

const TARGET: &str = "knowledge_search";

/// Logger emitting one `tracing` event per log call.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    base_fields: LogFields,
    min_level: LogLevel,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    /// Logger at `info` with no base fields.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_fields: LogFields::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Set the minimum log level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Lowest level that is emitted.
    #[must_use]
    pub const fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

/// Event ready for emission: redacted and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PreparedEvent {
    fields: Option<String>,
    error: Option<String>,
}

impl TracingLogger {
    fn prepare(&self, event: &mut LogEvent) -> PreparedEvent {
        let mut fields = self.base_fields.clone();
        if let Some(extra) = event.fields.take() {
            fields.extend(extra);
        }
        redact_fields(&mut fields);

        let error = event.error.take().map(|mut error| {
            redact_value(&mut error);
            error.to_string()
        });
        let fields = (!fields.is_empty()).then(|| fields_to_json(&fields).to_string());
        PreparedEvent { fields, error }
    }
}

macro_rules! emit {
    ($level:expr, $event:expr, $prepared:expr) => {
        tracing::event!(
            target: TARGET,
            $level,
            event = %$event.event,
            fields = $prepared.fields.as_deref(),
            error = $prepared.error.as_deref(),
            "{}",
            $event.message
        )
    };
}

impl LoggerPort for TracingLogger {
    fn log(&self, mut event: LogEvent) {
        if event.level < self.min_level {
            return;
        }
        let prepared = self.prepare(&mut event);
        match event.level {
            LogLevel::Debug => emit!(tracing::Level::DEBUG, event, prepared),
            LogLevel::Info => emit!(tracing::Level::INFO, event, prepared),
            LogLevel::Warn => emit!(tracing::Level::WARN, event, prepared),
            LogLevel::Error => emit!(tracing::Level::ERROR, event, prepared),
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

/// Map a config level label onto the port level. Unknown labels read as `info`.
#[must_use]
pub fn parse_log_level(label: &str) -> LogLevel {
    match label.trim().to_ascii_lowercase().as_str() {
        "trace" | "debug" => LogLevel::Debug,
        "warn" | "warning" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

fn fields_to_json(fields: &LogFields) -> Value {
    let mut map = serde_json::Map::new();
    for (key, value) in fields {
        map.insert(key.to_string(), value.clone());
    }
    Value::Object(map)
}

fn redact_fields(fields: &mut LogFields) {
    for (key, value) in fields.iter_mut() {
        if is_secret_key(key) {
            *value = Value::String(REDACTED.to_owned());
        } else {
            redact_value(value);
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::String(REDACTED.to_owned());
                } else {
                    redact_value(nested);
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                redact_value(item);
            }
        },
        _ => {},
    }
}
