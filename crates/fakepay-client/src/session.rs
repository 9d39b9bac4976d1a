//! The signed-in payer.

use serde::{Deserialize, Serialize};

/// Who is using the app. Built once by account setup and passed to client calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Service-side user ID.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Optional contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Optional contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The address payments are made from.
    pub vpa: String,
    /// Registration ID of `vpa`.
    pub vpa_id: String,
    /// Every address the user owns, `vpa` included. History merges all of them.
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl Session {
    /// Whether `vpa` is one of this user's addresses.
    #[must_use]
    pub fn owns(&self, vpa: &str) -> bool {
        self.vpa == vpa || self.addresses.iter().any(|address| address == vpa)
    }

    /// Record another address for this user. Known addresses are ignored.
    pub fn add_address(&mut self, vpa: impl Into<String>) {
        let vpa = vpa.into();
        if !self.addresses.contains(&vpa) {
            self.addresses.push(vpa);
        }
    }
}
