//! # pageinsights telemetry
//!
//! Bootstrap layer that switches on client-side telemetry for a hosted page
//! and stamps deployment metadata onto every item before the SDK sends it.
//!
//! ## Pipeline
//!
//! - **Resolve**: operator properties are merged over a fixed default record
//! - **Derive**: dependency exclusions are parsed, the login name is redacted
//! - **Enrich**: an initializer adds `ai.cloud.role` / `ai.cloud.roleInstance`
//! - **Announce**: one page view carrying the page and user context is sent
//!
//! ## Privacy
//!
//! - The authenticated-user token has `|`, `:`, `;` and `=` stripped
//! - `trackUserId = false` means no identity is ever computed
//! - Page-view custom properties carry the user's display name, email and
//!   login name unredacted
//!
//! ## Opt-Out
//!
//! ```bash
//! # Via environment variable
//! export PAGEINSIGHTS_TELEMETRY_DISABLED=1
//!
//! # Via config file (.pageinsights/config.toml)
//! [telemetry]
//! enabled = false
//! ```
//!
//! Keys in the `[telemetry]` section use the same camelCase names as the
//! host's component-properties JSON:
//!
//! ```toml
//! [telemetry]
//! cloudRole = "hr-portal"
//! cloudRoleInstance = "west-eu"
//! excludedDependencyTargets = "cdn.contoso.net\napi.contoso.net"
//! ```

pub mod bootstrap;
pub mod config;
pub mod enricher;
pub mod exclusions;
pub mod host;
pub mod identity;
pub mod page_view;
pub mod sdk;

pub use bootstrap::{ActiveSession, Bootstrapper, SessionState};
pub use config::{resolve, ConfigError, ConfigOverrides, EffectiveConfig};
pub use enricher::{enrich, CloudRoleInitializer, TelemetryInitializer, TelemetryItem};
pub use exclusions::ExclusionSet;
pub use host::{HostPageContext, StaticPageContext, UserContext, WebContext};
pub use identity::{redact, CorrelationToken};
pub use page_view::{build, CustomProps, PageViewPayload};
pub use sdk::{ConsoleSdk, ConsoleSdkFactory, DistributedTracingMode, SdkFactory, SdkOptions, TelemetrySdk};

/// Re-export common types
pub type Result<T> = anyhow::Result<T>;
