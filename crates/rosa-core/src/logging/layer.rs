//! Custom tracing layer for JSONL output.
//!
//! This layer produces machine-parseable JSONL logs on stderr while
//! keeping stdout clean for command payloads. Every string and debug
//! value is passed through the redactor before it is encoded.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use rosa_redact::Redactor;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Storage for span context data.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    run_id: Option<String>,
    test_case: Option<String>,
    stage: Option<String>,
}

/// A visitor that extracts field values from tracing events.
struct JsonFieldVisitor {
    redactor: Redactor<'static>,
    fields: serde_json::Map<String, serde_json::Value>,
    message: Option<String>,
}

impl JsonFieldVisitor {
    fn new(redactor: Redactor<'static>) -> Self {
        JsonFieldVisitor {
            redactor,
            fields: serde_json::Map::new(),
            message: None,
        }
    }

    fn record_text(&mut self, field: &tracing::field::Field, value: &str) {
        let redacted = self.redactor.redact(value);
        if field.name() == "message" {
            self.message = Some(redacted);
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(redacted),
            );
        }
    }
}

impl tracing::field::Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record_text(field, value);
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_text(field, &format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(
            field.name().to_string(),
            serde_json::Value::Number(value.into()),
        );
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(
            field.name().to_string(),
            serde_json::Value::Number(serde_json::Number::from(value)),
        );
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.fields
                .insert(field.name().to_string(), serde_json::Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::Bool(value));
    }
}

/// A visitor for extracting span context. Values are redacted on record.
struct SpanContextVisitor {
    redactor: Redactor<'static>,
    context: SpanContext,
}

impl SpanContextVisitor {
    fn new(redactor: Redactor<'static>) -> Self {
        SpanContextVisitor {
            redactor,
            context: SpanContext::default(),
        }
    }

    fn set(&mut self, name: &str, value: &str) {
        let slot = match name {
            "run_id" => &mut self.context.run_id,
            "test_case" => &mut self.context.test_case,
            "stage" => &mut self.context.stage,
            _ => return,
        };
        *slot = Some(self.redactor.redact(value));
    }
}

impl tracing::field::Visit for SpanContextVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.set(field.name(), value);
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.set(field.name(), &format!("{:?}", value));
    }
}

/// JSONL tracing layer that outputs to stderr.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
    redactor: Redactor<'static>,
}

impl JsonlLayer<io::Stderr> {
    /// Create a new JSONL layer writing to stderr.
    pub fn stderr() -> Self {
        JsonlLayer::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    /// Create a new JSONL layer with a custom writer.
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
            redactor: Redactor::global(),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = SpanContextVisitor::new(self.redactor);
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(visitor.context);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        // Innermost span wins for each context field
        let mut context = SpanContext::default();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(span_ctx) = span.extensions().get::<SpanContext>() {
                    if context.run_id.is_none() {
                        context.run_id.clone_from(&span_ctx.run_id);
                    }
                    if context.test_case.is_none() {
                        context.test_case.clone_from(&span_ctx.test_case);
                    }
                    if context.stage.is_none() {
                        context.stage.clone_from(&span_ctx.stage);
                    }
                }
            }
        }

        let mut visitor = JsonFieldVisitor::new(self.redactor);
        event.record(&mut visitor);

        // Context passed on the event itself beats the span context
        if let Some(serde_json::Value::String(id)) = visitor.fields.remove("run_id") {
            context.run_id = Some(id);
        }
        if let Some(serde_json::Value::String(case)) = visitor.fields.remove("test_case") {
            context.test_case = Some(case);
        }
        if let Some(serde_json::Value::String(stage)) = visitor.fields.remove("stage") {
            context.stage = Some(stage);
        }

        let level: Level = (*event.metadata().level()).into();
        let mut obj = serde_json::Map::new();

        obj.insert("ts".to_string(), serde_json::json!(ts.to_rfc3339()));
        obj.insert("level".to_string(), serde_json::json!(level));
        obj.insert(
            "event".to_string(),
            serde_json::json!(event.metadata().target()),
        );

        if let Some(id) = context.run_id {
            obj.insert("run_id".to_string(), serde_json::json!(id));
        }
        if let Some(case) = context.test_case {
            obj.insert("test_case".to_string(), serde_json::json!(case));
        }
        if let Some(s) = context.stage {
            obj.insert("stage".to_string(), serde_json::json!(s));
        }
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), serde_json::json!(msg));
        }

        if !visitor.fields.is_empty() {
            obj.insert(
                "fields".to_string(),
                serde_json::Value::Object(visitor.fields),
            );
        }

        let json = serde_json::to_string(&serde_json::Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}
