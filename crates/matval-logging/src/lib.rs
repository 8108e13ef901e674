//! Logging setup for matval.
//!
//! The library crates log through the `log` facade. [`init_logging`] routes
//! those records into `tracing`, filters them, and hands every surviving
//! event to the hook registered with [`set_log_hook`] as a [`LogRecord`].

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::subscriber::DefaultGuard;
use tracing::Subscriber;
use tracing_log::{LogTracer, NormalizeEvent};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

/// Filter variable consulted when `RUST_LOG` is unset.
pub const LOG_ENV: &str = "MATVAL_LOG";

#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub ts: String,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<JsonValue>,
}

type LogHook = Arc<dyn Fn(&LogRecord) + Send + Sync>;

static LOG_HOOK: OnceCell<LogHook> = OnceCell::new();

/// Keeps a thread-scoped subscriber alive when a global one was already
/// installed by someone else.
pub struct LoggingGuard {
    _guard: Option<DefaultGuard>,
}

impl LoggingGuard {
    pub fn is_global(&self) -> bool {
        self._guard.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Directive used when neither `RUST_LOG` nor `MATVAL_LOG` is set.
    pub default_filter: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
        }
    }
}

/// Register the receiver of every log record. Only the first hook sticks.
pub fn set_log_hook<F>(hook: F) -> bool
where
    F: Fn(&LogRecord) + Send + Sync + 'static,
{
    LOG_HOOK.set(Arc::new(hook)).is_ok()
}

pub fn init_logging(opts: LoggingOptions) -> LoggingGuard {
    // log:: macros flow into tracing from here on
    let _ = LogTracer::init();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .or_else(|_| EnvFilter::try_new(&opts.default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let build_subscriber = || {
        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(LogBridgeLayer)
    };

    let guard = match tracing::subscriber::set_global_default(build_subscriber()) {
        Ok(()) => None,
        Err(_) => Some(tracing::subscriber::set_default(build_subscriber())),
    };
    LoggingGuard { _guard: guard }
}

struct LogBridgeLayer;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

impl<S> Layer<S> for LogBridgeLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let Some(hook) = LOG_HOOK.get() else {
            return;
        };
        // events coming from `log` carry their real target in fields
        let normalized = event.normalized_metadata();
        let meta = normalized.as_ref().unwrap_or_else(|| event.metadata());

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord {
            ts: now_rfc3339(),
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message: visitor.message.unwrap_or_else(|| meta.name().to_string()),
            span_id: tracing::Span::current().id().map(|id| id.into_u64().to_string()),
            fields: (!visitor.fields.is_empty()).then_some(JsonValue::Object(visitor.fields)),
        };
        hook(&record);
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, JsonValue>,
}

impl JsonVisitor {
    fn put(&mut self, field: &tracing::field::Field, entry: JsonValue) {
        match field.name() {
            "message" => {
                self.message = Some(match entry {
                    JsonValue::String(s) => s,
                    other => other.to_string(),
                })
            }
            name if name.starts_with("log.") => {}
            name => {
                self.fields.insert(name.to_string(), entry);
            }
        }
    }
}

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.put(field, JsonValue::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.put(field, JsonValue::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.put(field, JsonValue::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.put(field, JsonValue::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.put(field, JsonValue::from(value));
    }
}
