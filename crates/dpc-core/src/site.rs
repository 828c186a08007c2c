//! # Request Context
//!
//! Explicit per-request input: the site's host name and the fields the
//! buyer submitted at checkout. Business logic never reads ambient request
//! state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Checkbox field that opts into the donation
pub const FIELD_ADD_DONATION: &str = "add_donation_product";

/// Quantity field next to the checkbox
pub const FIELD_DONATION_QUANTITY: &str = "donation_product_quantity";

/// Context of a single checkout / order request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Host name the site is served under (e.g. "shop.example.com")
    pub site_host: String,

    /// Submitted checkout fields
    #[serde(default, alias = "fields")]
    pub submitted_fields: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(site_host: impl Into<String>) -> Self {
        Self {
            site_host: site_host.into(),
            submitted_fields: HashMap::new(),
        }
    }

    /// Builder: add a submitted field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.submitted_fields.insert(key.into(), value.into());
        self
    }

    /// Site identifier used by the host: dots replaced with underscores
    pub fn site_id(&self) -> String {
        site_id(&self.site_host)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.submitted_fields.get(key).map(|s| s.as_str())
    }
}

/// Derive the host-side site identifier from a host name
pub fn site_id(site_host: &str) -> String {
    site_host.trim().replace('.', "_")
}
