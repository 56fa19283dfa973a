//! Read-only view of the hosting page

use serde::{Deserialize, Serialize};

/// Site the page belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebContext {
    pub absolute_url: String,
    pub server_relative_url: String,
    pub id: String,
}

/// Signed-in user as reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub display_name: String,
    pub email: String,
    pub login_name: String,
}

/// Page and user context supplied by the host runtime
///
/// Implementations must always provide a user when tracking is enabled.
pub trait HostPageContext {
    fn page_title(&self) -> &str;
    fn page_uri(&self) -> &str;
    fn web(&self) -> &WebContext;
    fn user(&self) -> &UserContext;
}

/// Context captured up front, e.g. loaded from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticPageContext {
    pub title: String,
    pub uri: String,
    pub web: WebContext,
    pub user: UserContext,
}

impl StaticPageContext {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl HostPageContext for StaticPageContext {
    fn page_title(&self) -> &str {
        &self.title
    }

    fn page_uri(&self) -> &str {
        &self.uri
    }

    fn web(&self) -> &WebContext {
        &self.web
    }

    fn user(&self) -> &UserContext {
        &self.user
    }
}
