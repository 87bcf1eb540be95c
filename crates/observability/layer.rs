use super::config::ServiceContext;
use crate::notifications::queue::DeliveryQueue;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Events from the queue itself are never forwarded, or a failing sink would feed itself.
const QUEUE_TARGET: &str = "sakina_core::notifications::queue";

#[derive(Clone, Debug)]
pub(crate) struct AlertEvent {
    pub(crate) level: Level,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
    pub(crate) target: String,
    pub(crate) location: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) spans: Vec<String>,
}

/// Forwards events at or above `min_level` to the alert queue.
pub(crate) struct AlertLayer {
    queue: DeliveryQueue<AlertEvent>,
    service_context: ServiceContext,
    min_level: Level,
}

impl AlertLayer {
    pub(crate) fn new(
        queue: DeliveryQueue<AlertEvent>,
        service_context: ServiceContext,
        min_level: Level,
    ) -> Self {
        Self {
            queue,
            service_context,
            min_level,
        }
    }
}

#[derive(Default)]
struct RedactingVisitor {
    values: BTreeMap<String, String>,
}

impl RedactingVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        let name = field.name();
        let value = if is_sensitive_key(name) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.values.insert(name.to_string(), value);
    }
}

impl Visit for RedactingVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // `Level` orders more verbose levels as greater.
        if *metadata.level() > self.min_level || metadata.target() == QUEUE_TARGET {
            return;
        }

        let mut visitor = RedactingVisitor::default();
        event.record(&mut visitor);
        let message = visitor
            .values
            .remove("message")
            .map(|raw| unquote_debug_string(&raw));

        let spans = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| s.metadata().name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let location = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            _ => None,
        };

        self.queue.try_enqueue(AlertEvent {
            level: *metadata.level(),
            timestamp: Utc::now(),
            service_name: self.service_context.service_name.clone(),
            environment: self.service_context.environment.clone(),
            component: self.service_context.component.clone(),
            target: metadata.target().to_string(),
            location,
            message,
            fields: visitor.values,
            spans,
        });
    }
}

fn unquote_debug_string(input: &str) -> String {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Credentials and customer contact details never leave the process.
fn is_sensitive_key(field_name: &str) -> bool {
    let field = field_name.to_ascii_lowercase();
    [
        "webhook",
        "secret",
        "password",
        "token",
        "authorization",
        "phone",
        "email",
    ]
    .iter()
    .any(|needle| field.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_credentials_and_contact_fields() {
        assert!(is_sensitive_key("ALIF_SECRET_KEY"));
        assert!(is_sensitive_key("token"));
        assert!(is_sensitive_key("customer_phone"));
        assert!(is_sensitive_key("customer_email"));
        assert!(!is_sensitive_key("alif_order_id"));
        assert!(!is_sensitive_key("amount"));
    }

    #[test]
    fn strips_debug_quotes() {
        assert_eq!(unquote_debug_string("\"payment failed\""), "payment failed");
        assert_eq!(unquote_debug_string("plain"), "plain");
    }
}
