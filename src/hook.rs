//! Glue between an HTTP client's completion callback and the recorder.

use crate::builder::{build_entry_with, BuildOptions};
use crate::error::MalformedExchange;
use crate::recorder::Recorder;
use crate::snapshot::Exchange;
use log::debug;
use std::sync::Arc;

/// Response hook: builds an entry from each completed exchange and ingests
/// it into the owning recorder. Holds no state of its own.
#[derive(Debug, Clone)]
pub struct ResponseHook {
    recorder: Arc<Recorder>,
    options: BuildOptions,
}

impl ResponseHook {
    pub fn new(recorder: Arc<Recorder>) -> Self {
        ResponseHook {
            recorder,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(recorder: Arc<Recorder>, options: BuildOptions) -> Self {
        ResponseHook { recorder, options }
    }

    pub fn recorder(&self) -> &Arc<Recorder> {
        &self.recorder
    }

    /// Record one exchange and hand it back unchanged, so further hooks in
    /// a chain see exactly what this one saw.
    ///
    /// Malformed headers and cookies inside the exchange are absorbed by
    /// the builder; only a structurally broken exchange (missing method,
    /// URL, or status) errors, and then nothing is ingested.
    pub fn on_response(&self, exchange: Exchange) -> Result<Exchange, MalformedExchange> {
        let entry = build_entry_with(
            &exchange.request,
            &exchange.response,
            exchange.elapsed,
            &self.options,
        )?;
        debug!(
            "captured {} {} -> {}",
            entry.request.method, entry.request.url, entry.response.status
        );
        self.recorder.ingest(entry);
        Ok(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{RequestSnapshot, ResponseSnapshot};
    use std::time::Duration;

    fn exchange(status: Option<u16>) -> Exchange {
        Exchange {
            request: RequestSnapshot::new("GET", "https://example.com/"),
            response: ResponseSnapshot {
                status,
                status_text: "OK".to_string(),
                http_version: "HTTP/1.1".to_string(),
                ..Default::default()
            },
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_on_response_ingests_and_returns_exchange() {
        let recorder = Arc::new(Recorder::new());
        let hook = ResponseHook::new(Arc::clone(&recorder));

        let exchange = hook.on_response(exchange(Some(200))).unwrap();
        assert_eq!(recorder.len(), 1);
        assert_eq!(exchange.request.url, "https://example.com/");
    }

    #[test]
    fn test_malformed_exchange_ingests_nothing() {
        let recorder = Arc::new(Recorder::new());
        let hook = ResponseHook::new(Arc::clone(&recorder));

        hook.on_response(exchange(Some(200))).unwrap();
        let err = hook.on_response(exchange(None)).unwrap_err();
        assert!(matches!(err, MalformedExchange::MissingStatus { .. }));
        assert_eq!(recorder.len(), 1);
    }
}
