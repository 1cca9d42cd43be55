//! User context attached to outgoing messages, and the identity preamble built from it.

use serde::{Deserialize, Serialize};

/// Opening of the bracketed identity tag ("user information").
pub const PREAMBLE_LABEL: &str = "Thông tin người dùng";
const EMAIL_LABEL: &str = "Email";
/// Display-name label ("name").
const NAME_LABEL: &str = "Tên";
const USERNAME_LABEL: &str = "Username";

/// Identity of the person chatting, as known to the UI. Sent verbatim as `user_context`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl UserContext {
    /// Context of a signed-out visitor.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            is_authenticated: true,
            ..Self::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Bracketed identity tag, e.g. `[Thông tin người dùng: Email: a@b.com, Tên: A B]`.
    ///
    /// Fields appear as email, display name, username; blank fields are skipped.
    /// `None` when not authenticated or when no field is present.
    pub fn preamble(&self) -> Option<String> {
        if !self.is_authenticated {
            return None;
        }
        let fields: Vec<String> = [
            (EMAIL_LABEL, &self.email),
            (NAME_LABEL, &self.full_name),
            (USERNAME_LABEL, &self.username),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}: {}", label, v))
        })
        .collect();

        if fields.is_empty() {
            None
        } else {
            Some(format!("[{}: {}]", PREAMBLE_LABEL, fields.join(", ")))
        }
    }
}

/// Text actually sent as `input_value`: the preamble, a blank line, then the message.
/// Unchanged when there is no preamble.
pub fn annotate_message(text: &str, context: Option<&UserContext>) -> String {
    match context.and_then(UserContext::preamble) {
        Some(preamble) => format!("{}\n\n{}", preamble, text),
        None => text.to_string(),
    }
}
