//! Initial page-view payload

use serde::{Deserialize, Serialize};

use crate::host::{UserContext, WebContext};

/// Page view sent once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewPayload {
    pub name: String,
    pub uri: String,
    pub properties: PageViewProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewProperties {
    #[serde(rename = "CustomProps")]
    pub custom_props: CustomProps,
}

/// Page and user context attached to the page view
///
/// Wire names match what existing dashboards already query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProps {
    #[serde(rename = "WebAbsUrl")]
    pub web_absolute_url: String,
    #[serde(rename = "WebSerUrl")]
    pub web_server_relative_url: String,
    #[serde(rename = "WebId")]
    pub web_id: String,
    #[serde(rename = "UserTitle")]
    pub user_display_name: String,
    #[serde(rename = "UserEmail")]
    pub user_email: String,
    #[serde(rename = "UserLoginName")]
    pub user_login_name: String,
}

/// Assemble the page view from the host context
///
/// User fields are copied as-is; only the authenticated-user token is redacted.
pub fn build(page_title: &str, page_uri: &str, web: &WebContext, user: &UserContext) -> PageViewPayload {
    PageViewPayload {
        name: page_title.to_string(),
        uri: page_uri.to_string(),
        properties: PageViewProperties {
            custom_props: CustomProps {
                web_absolute_url: web.absolute_url.clone(),
                web_server_relative_url: web.server_relative_url.clone(),
                web_id: web.id.clone(),
                user_display_name: user.display_name.clone(),
                user_email: user.email.clone(),
                user_login_name: user.login_name.clone(),
            },
        },
    }
}
