//! Page telemetry bootstrap

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{resolve, ConfigOverrides, EffectiveConfig};
use crate::enricher::CloudRoleInitializer;
use crate::exclusions::ExclusionSet;
use crate::host::HostPageContext;
use crate::identity::{redact, CorrelationToken};
use crate::page_view::build;
use crate::sdk::{SdkFactory, SdkOptions, TelemetrySdk};
use crate::Result;

/// Values derived for an enabled session, plus the SDK they configured
pub struct ActiveSession<S> {
    config: Arc<EffectiveConfig>,
    exclusions: ExclusionSet,
    correlation_token: Option<CorrelationToken>,
    sdk: S,
}

impl<S> ActiveSession<S> {
    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn correlation_token(&self) -> Option<&CorrelationToken> {
        self.correlation_token.as_ref()
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }
}

/// Lifecycle of one page session
///
/// `Pending` only exists before [`Bootstrapper::on_init`]; afterwards the
/// session is either `Disabled` or `Active` until the page reloads.
pub enum SessionState<S> {
    Pending,
    Disabled,
    Active(ActiveSession<S>),
}

/// Wires config, identity and enrichment into the SDK's startup calls
pub struct Bootstrapper<H, F: SdkFactory> {
    defaults: EffectiveConfig,
    overrides: ConfigOverrides,
    host: H,
    factory: F,
    state: SessionState<F::Sdk>,
}

impl<H: HostPageContext, F: SdkFactory> Bootstrapper<H, F> {
    pub fn new(defaults: EffectiveConfig, overrides: ConfigOverrides, host: H, factory: F) -> Self {
        Self {
            defaults,
            overrides,
            host,
            factory,
            state: SessionState::Pending,
        }
    }

    /// Startup hook; resolves once telemetry is set up or switched off
    ///
    /// Never fails on account of telemetry: a disabled config and a page
    /// view the SDK rejects both still resolve `Ok`.
    pub async fn on_init(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Pending) {
            debug!("page telemetry already initialized");
            return Ok(());
        }

        info!("Initialized page telemetry");

        let config = resolve(&self.defaults, &self.overrides);
        if !config.enabled {
            info!("Tracking disabled. No analytics will be logged.");
            self.state = SessionState::Disabled;
            return Ok(());
        }

        self.state = SessionState::Active(self.activate(config));
        Ok(())
    }

    fn activate(&self, config: EffectiveConfig) -> ActiveSession<F::Sdk> {
        let exclusions = ExclusionSet::parse(Some(config.excluded_dependency_targets.as_str()));
        let user = self.host.user();
        let correlation_token = redact(Some(user.login_name.as_str()), config.track_user_id);
        debug!(
            exclusions = exclusions.len(),
            track_user_id = config.track_user_id,
            "derived session values"
        );

        let options = SdkOptions::new(&config, correlation_token.as_ref(), &exclusions);
        let config = Arc::new(config);

        let mut sdk = self.factory.create(options);
        sdk.load();
        sdk.add_telemetry_initializer(Box::new(CloudRoleInitializer::new(Arc::clone(&config))));

        if let Some(token) = &correlation_token {
            sdk.set_authenticated_user_context(token, Some(token), true);
        }

        let page_view = build(
            self.host.page_title(),
            self.host.page_uri(),
            self.host.web(),
            user,
        );
        if let Err(e) = sdk.track_page_view(page_view) {
            warn!(error = %e, "failed to send initial page view");
        }

        ActiveSession {
            config,
            exclusions,
            correlation_token,
            sdk,
        }
    }

    pub fn state(&self) -> &SessionState<F::Sdk> {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Effective config of an active session
    pub fn config(&self) -> Option<&EffectiveConfig> {
        match &self.state {
            SessionState::Active(session) => Some(session.config()),
            _ => None,
        }
    }
}
