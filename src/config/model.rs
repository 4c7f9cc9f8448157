//! Serde data structures for the edge proxy configuration file.
//!
//! Contains [`Config`] (the root), [`UpstreamConfig`], and [`Defaults`].
//! All types derive `Serialize` and `Deserialize` with
//! `deny_unknown_fields` for strict parsing. Every field is optional in
//! the file because environment variables and CLI flags may supply it.

use serde::{Deserialize, Serialize};

use crate::proxy::routing::Service;

const fn default_timeout() -> u64 {
    30_000
}

const fn default_max_redirects() -> usize {
    20
}

const fn default_true() -> bool {
    true
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_default_max_redirects(v: &usize) -> bool {
    *v == default_max_redirects()
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_default_defaults(v: &Defaults) -> bool {
    v.timeout == default_timeout() && v.max_redirects == default_max_redirects() && v.proxy_headers
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub upstreams: UpstreamConfig,

    #[serde(default, skip_serializing_if = "is_default_defaults")]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl UpstreamConfig {
    #[must_use]
    pub fn get(&self, service: Service) -> Option<&str> {
        match service {
            Service::Auth => self.auth.as_deref(),
            Service::Catalog => self.catalog.as_deref(),
            Service::Order => self.order.as_deref(),
            Service::User => self.user.as_deref(),
        }
    }

    pub fn set(&mut self, service: Service, url: String) {
        let slot = match service {
            Service::Auth => &mut self.auth,
            Service::Catalog => &mut self.catalog,
            Service::Order => &mut self.order,
            Service::User => &mut self.user,
        };
        *slot = Some(url);
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Upstream timeout in milliseconds, covering redirects.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,

    #[serde(
        default = "default_max_redirects",
        skip_serializing_if = "is_default_max_redirects"
    )]
    pub max_redirects: usize,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub proxy_headers: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_redirects: default_max_redirects(),
            proxy_headers: default_true(),
        }
    }
}
