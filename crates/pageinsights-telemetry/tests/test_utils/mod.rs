// Recording SDK and canned page context shared by the integration tests
//
// The SDK keeps every call it receives so tests can assert on ordering and
// on the items the registered initializers produced.

#![allow(dead_code)]

use pageinsights_telemetry::config::ENV_OVERRIDE_VARS;
use pageinsights_telemetry::{
    CorrelationToken, PageViewPayload, SdkFactory, SdkOptions, StaticPageContext,
    TelemetryInitializer, TelemetryItem, TelemetrySdk, UserContext, WebContext,
};
use std::cell::RefCell;
use std::env;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    Load,
    AddInitializer,
    SetAuthenticatedUser { user_id: String, account_id: Option<String> },
    TrackPageView(PageViewPayload),
}

pub struct RecordingSdk {
    pub options: SdkOptions,
    pub calls: Vec<SdkCall>,
    initializers: Vec<Box<dyn TelemetryInitializer>>,
}

impl RecordingSdk {
    /// Push an item through the registered initializers, as the SDK does on send
    pub fn run_initializers(&self, item: &mut TelemetryItem) -> bool {
        self.initializers.iter().all(|initializer| initializer.initialize(item))
    }
}

impl TelemetrySdk for RecordingSdk {
    fn load(&mut self) {
        self.calls.push(SdkCall::Load);
    }

    fn add_telemetry_initializer(&mut self, initializer: Box<dyn TelemetryInitializer>) {
        self.calls.push(SdkCall::AddInitializer);
        self.initializers.push(initializer);
    }

    fn set_authenticated_user_context(
        &mut self,
        user_id: &CorrelationToken,
        account_id: Option<&CorrelationToken>,
        _store_in_cookie: bool,
    ) {
        self.calls.push(SdkCall::SetAuthenticatedUser {
            user_id: user_id.to_string(),
            account_id: account_id.map(ToString::to_string),
        });
    }

    fn track_page_view(&mut self, page_view: PageViewPayload) -> anyhow::Result<()> {
        self.calls.push(SdkCall::TrackPageView(page_view));
        Ok(())
    }
}

/// Factory that remembers the options of every SDK it built
#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub created: Rc<RefCell<Vec<SdkOptions>>>,
}

impl SdkFactory for RecordingFactory {
    type Sdk = RecordingSdk;

    fn create(&self, options: SdkOptions) -> RecordingSdk {
        self.created.borrow_mut().push(options.clone());
        RecordingSdk {
            options,
            calls: Vec::new(),
            initializers: Vec::new(),
        }
    }
}

pub fn sample_page() -> StaticPageContext {
    StaticPageContext {
        title: "Home".to_string(),
        uri: "https://contoso.sharepoint.com/sites/hr/SitePages/Home.aspx".to_string(),
        web: WebContext {
            absolute_url: "https://contoso.sharepoint.com/sites/hr".to_string(),
            server_relative_url: "/sites/hr".to_string(),
            id: "8d4b4a0c-3a8f-4f5e-9a3e-1f0c6b2d7e11".to_string(),
        },
        user: UserContext {
            display_name: "Adele Vance".to_string(),
            email: "adele.vance@contoso.com".to_string(),
            login_name: "i:0#.f|membership|adele.vance@contoso.com".to_string(),
        },
    }
}

/// Clears every telemetry override variable and restores the originals on drop
///
/// Only use from `#[serial]` tests.
pub struct ClearedEnv {
    saved: Vec<(&'static str, Option<String>)>,
}

impl ClearedEnv {
    pub fn new() -> Self {
        let saved = ENV_OVERRIDE_VARS
            .iter()
            .map(|name| (*name, env::var(name).ok()))
            .collect();
        for name in ENV_OVERRIDE_VARS {
            env::remove_var(name);
        }
        Self { saved }
    }
}

impl Drop for ClearedEnv {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
    }
}
