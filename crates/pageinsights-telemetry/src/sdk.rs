//! Seam to the telemetry SDK, plus a console SDK for local runs
//!
//! The real SDK owns transport, batching and retry. [`ConsoleSdk`] only
//! builds the envelope, runs initializers and prints the result.

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use serde_json::json;
use std::io::{self, Write};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EffectiveConfig;
use crate::enricher::{TelemetryInitializer, TelemetryItem};
use crate::exclusions::ExclusionSet;
use crate::identity::CorrelationToken;
use crate::page_view::PageViewPayload;

/// Which trace-context headers go on outgoing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributedTracingMode {
    /// `Request-Id` / `Request-Context` only
    Ai,
    /// Legacy headers plus W3C `traceparent` / `tracestate`
    AiAndW3c,
    /// W3C headers only
    W3c,
}

impl Serialize for DistributedTracingMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let code: u8 = match self {
            DistributedTracingMode::Ai => 0,
            DistributedTracingMode::AiAndW3c => 1,
            DistributedTracingMode::W3c => 2,
        };
        serializer.serialize_u8(code)
    }
}

/// Options the SDK is constructed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkOptions {
    pub instrumentation_key: String,
    /// Groups users into accounts; must be free of separator characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub disable_fetch_tracking: bool,
    pub enable_request_header_tracking: bool,
    pub enable_response_header_tracking: bool,
    pub enable_ajax_error_status_text: bool,
    pub enable_ajax_perf_tracking: bool,
    /// Ignored by the SDK when exception tracking is disabled
    pub enable_unhandled_promise_rejection_tracking: bool,
    pub enable_cors_correlation: bool,
    pub disable_exception_tracking: bool,
    pub distributed_tracing_mode: DistributedTracingMode,
    pub exclude_request_from_auto_tracking_patterns: Vec<String>,
}

impl SdkOptions {
    pub fn new(
        config: &EffectiveConfig,
        account_id: Option<&CorrelationToken>,
        exclusions: &ExclusionSet,
    ) -> Self {
        Self {
            instrumentation_key: config.instrumentation_key.clone(),
            account_id: account_id.map(|token| token.as_str().to_string()),
            disable_fetch_tracking: false,
            enable_request_header_tracking: true,
            enable_response_header_tracking: true,
            enable_ajax_error_status_text: true,
            enable_ajax_perf_tracking: true,
            enable_unhandled_promise_rejection_tracking: true,
            enable_cors_correlation: true,
            disable_exception_tracking: !config.track_exceptions,
            distributed_tracing_mode: DistributedTracingMode::AiAndW3c,
            exclude_request_from_auto_tracking_patterns: exclusions.as_slice().to_vec(),
        }
    }
}

/// Operations the bootstrap needs from a telemetry SDK
pub trait TelemetrySdk {
    fn load(&mut self);

    fn add_telemetry_initializer(&mut self, initializer: Box<dyn TelemetryInitializer>);

    fn set_authenticated_user_context(
        &mut self,
        user_id: &CorrelationToken,
        account_id: Option<&CorrelationToken>,
        store_in_cookie: bool,
    );

    fn track_page_view(&mut self, page_view: PageViewPayload) -> Result<()>;
}

/// Constructs an SDK instance from options
pub trait SdkFactory {
    type Sdk: TelemetrySdk;

    fn create(&self, options: SdkOptions) -> Self::Sdk;
}

/// SDK stand-in that prints items instead of sending them
pub struct ConsoleSdk<W: Write> {
    options: SdkOptions,
    writer: W,
    session_id: String,
    initializers: Vec<Box<dyn TelemetryInitializer>>,
    auth_user_id: Option<String>,
    loaded: bool,
}

impl<W: Write> ConsoleSdk<W> {
    pub fn with_writer(options: SdkOptions, writer: W) -> Self {
        Self {
            options,
            writer,
            session_id: Uuid::new_v4().simple().to_string(),
            initializers: Vec::new(),
            auth_user_id: None,
            loaded: false,
        }
    }

    pub fn options(&self) -> &SdkOptions {
        &self.options
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Envelope name, e.g. `Microsoft.ApplicationInsights.<ikey>.Pageview`
    fn envelope_name(&self, kind: &str) -> String {
        let ikey = self.options.instrumentation_key.replace('-', "");
        format!("Microsoft.ApplicationInsights.{}.{}", ikey, kind)
    }

    fn page_view_item(&self, page_view: PageViewPayload) -> TelemetryItem {
        let mut item = TelemetryItem::new(self.envelope_name("Pageview"));
        item.ikey = Some(self.options.instrumentation_key.clone());
        item.base_type = Some("PageviewData".to_string());
        item.base_data = Some(json!({
            "name": page_view.name,
            "uri": page_view.uri,
            "properties": page_view.properties,
        }));

        if let Some(tags) = item.tags.as_mut() {
            tags.insert("ai.session.id".to_string(), self.session_id.clone());
            if let Some(user_id) = &self.auth_user_id {
                tags.insert("ai.user.authUserId".to_string(), user_id.clone());
            }
            if let Some(account_id) = &self.options.account_id {
                tags.insert("ai.user.accountId".to_string(), account_id.clone());
            }
        }
        item
    }
}

impl<W: Write> TelemetrySdk for ConsoleSdk<W> {
    fn load(&mut self) {
        debug!(options = ?self.options, "console SDK loaded");
        self.loaded = true;
    }

    fn add_telemetry_initializer(&mut self, initializer: Box<dyn TelemetryInitializer>) {
        self.initializers.push(initializer);
    }

    fn set_authenticated_user_context(
        &mut self,
        user_id: &CorrelationToken,
        account_id: Option<&CorrelationToken>,
        _store_in_cookie: bool,
    ) {
        self.auth_user_id = Some(user_id.as_str().to_string());
        if let Some(account_id) = account_id {
            self.options.account_id = Some(account_id.as_str().to_string());
        }
    }

    fn track_page_view(&mut self, page_view: PageViewPayload) -> Result<()> {
        if !self.loaded {
            warn!("page view tracked before the SDK was loaded; dropping");
            return Ok(());
        }

        let mut item = self.page_view_item(page_view);
        for initializer in &self.initializers {
            if !initializer.initialize(&mut item) {
                debug!(name = %item.name, "item dropped by initializer");
                return Ok(());
            }
        }

        serde_json::to_writer_pretty(&mut self.writer, &item).context("serialize telemetry item")?;
        writeln!(self.writer).context("write telemetry item")?;
        self.writer.flush().context("flush telemetry item")?;
        Ok(())
    }
}

/// Builds console SDKs that print to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSdkFactory;

impl SdkFactory for ConsoleSdkFactory {
    type Sdk = ConsoleSdk<io::Stdout>;

    fn create(&self, options: SdkOptions) -> Self::Sdk {
        ConsoleSdk::with_writer(options, io::stdout())
    }
}
