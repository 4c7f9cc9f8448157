//! Ordered, first-match-wins path routing.
//!
//! [`RouteTable::standard`] builds the fixed table that maps inbound
//! paths to one of the four backend [`Service`]s. Exact health shims come
//! first, then prefix rules in declared order, then the bare `/health`
//! fallback. Some prefixes are prefixes of others (`/api/admin` vs
//! `/api/admin/orders`), so the more specific rule must be declared first;
//! [`RouteTable::shadowed_rules`] reports any rule that can never match.
//! Inbound paths go through [`normalize_path`] before they are matched.

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Auth,
    Catalog,
    Order,
    User,
}

impl Service {
    pub const ALL: [Self; 4] = [Self::Auth, Self::Catalog, Self::Order, Self::User];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Catalog => "catalog",
            Self::Order => "order",
            Self::User => "user",
        }
    }

    /// Environment variable holding this service's base URL.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Auth => "AUTH_SERVICE_URL",
            Self::Catalog => "CATALOG_SERVICE_URL",
            Self::Order => "ORDER_SERVICE_URL",
            Self::User => "USER_SERVICE_URL",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathMatch {
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == *p,
            Self::Prefix(p) => path.starts_with(p),
        }
    }

    #[must_use]
    pub const fn pattern(&self) -> &'static str {
        match self {
            Self::Exact(p) | Self::Prefix(p) => p,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// Replace the matched prefix, keep the remainder of the path.
    Replace { to: &'static str },
    /// Replace the whole path.
    To(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub matcher: PathMatch,
    pub service: Service,
    pub rewrite: Option<Rewrite>,
}

impl RouteRule {
    #[must_use]
    pub const fn exact(path: &'static str, service: Service) -> Self {
        Self {
            matcher: PathMatch::Exact(path),
            service,
            rewrite: None,
        }
    }

    #[must_use]
    pub const fn prefix(prefix: &'static str, service: Service) -> Self {
        Self {
            matcher: PathMatch::Prefix(prefix),
            service,
            rewrite: None,
        }
    }

    #[must_use]
    pub fn rewrite(mut self, rewrite: Rewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    /// Path to forward for an inbound path this rule matched.
    #[must_use]
    pub fn forward_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        match self.rewrite {
            None => Cow::Borrowed(path),
            Some(Rewrite::To(to)) => Cow::Borrowed(to),
            Some(Rewrite::Replace { to }) => {
                let rest = &path[self.matcher.pattern().len()..];
                Cow::Owned(format!("{to}{rest}"))
            }
        }
    }
}

/// Resolve `.` and `..` segments (and their percent-encoded forms) in an
/// inbound path, so prefix rules see the path the upstream would act on.
///
/// The path is parsed as part of a full URL, so a leading `//` stays in
/// the path instead of becoming an authority. `..` never climbs above `/`.
/// `None` when the path cannot be parsed.
#[must_use]
pub fn normalize_path(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }
    let url = url::Url::parse(&format!("http://edge.invalid{path}")).ok()?;
    Some(url.path().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub rule_index: usize,
    pub service: Service,
    pub path: Cow<'a, str>,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    #[must_use]
    pub const fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The production routing table, in priority order.
    #[must_use]
    pub fn standard() -> Self {
        use Service::{Auth, Catalog, Order, User};

        Self::new(vec![
            // Versioned health paths map onto each upstream's bare /health
            RouteRule::exact("/api/v1/health", Catalog).rewrite(Rewrite::To("/health")),
            RouteRule::exact("/api/auth/health", Auth).rewrite(Rewrite::To("/health")),
            RouteRule::exact("/api/admin/health", User).rewrite(Rewrite::To("/health")),
            RouteRule::prefix("/api/auth", Auth),
            RouteRule::prefix("/api/v1", Catalog),
            RouteRule::prefix("/api/cat", Catalog).rewrite(Rewrite::Replace { to: "/api/v1" }),
            RouteRule::prefix("/api/cart", Order),
            RouteRule::prefix("/api/orders", Order),
            RouteRule::prefix("/api/admin/orders", Order),
            RouteRule::prefix("/api/admin/carts", Order),
            RouteRule::prefix("/api/admin/users", User),
            RouteRule::prefix("/api/admin", User),
            RouteRule::prefix("/api/users", User).rewrite(Rewrite::Replace { to: "/api/admin" }),
            RouteRule::exact("/health", Catalog),
        ])
    }

    #[must_use]
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    #[must_use]
    pub fn resolve<'a>(&self, path: &'a str) -> Option<Resolved<'a>> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matcher.matches(path))
            .map(|(rule_index, rule)| Resolved {
                rule_index,
                service: rule.service,
                path: rule.forward_path(path),
            })
    }

    /// Indices of rules that an earlier rule always matches first.
    #[must_use]
    pub fn shadowed_rules(&self) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(i, rule)| {
                let pattern = rule.matcher.pattern();
                self.rules[..*i].iter().any(|earlier| match earlier.matcher {
                    PathMatch::Prefix(p) => pattern.starts_with(p),
                    PathMatch::Exact(p) => {
                        matches!(rule.matcher, PathMatch::Exact(_)) && p == pattern
                    }
                })
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(path: &str) -> Option<(Service, String)> {
        RouteTable::standard()
            .resolve(path)
            .map(|r| (r.service, r.path.into_owned()))
    }

    #[test]
    fn health_shims_rewrite_to_bare_health() {
        assert_eq!(
            resolve("/api/v1/health"),
            Some((Service::Catalog, "/health".into()))
        );
        assert_eq!(
            resolve("/api/auth/health"),
            Some((Service::Auth, "/health".into()))
        );
        assert_eq!(
            resolve("/api/admin/health"),
            Some((Service::User, "/health".into()))
        );
    }

    #[test]
    fn health_shims_are_exact_only() {
        assert_eq!(
            resolve("/api/v1/health/deep"),
            Some((Service::Catalog, "/api/v1/health/deep".into()))
        );
        assert_eq!(
            resolve("/api/auth/healthz"),
            Some((Service::Auth, "/api/auth/healthz".into()))
        );
    }

    #[test]
    fn prefix_rules_forward_unchanged() {
        assert_eq!(
            resolve("/api/auth/login"),
            Some((Service::Auth, "/api/auth/login".into()))
        );
        assert_eq!(
            resolve("/api/v1/products"),
            Some((Service::Catalog, "/api/v1/products".into()))
        );
        assert_eq!(
            resolve("/api/cart/items"),
            Some((Service::Order, "/api/cart/items".into()))
        );
        assert_eq!(
            resolve("/api/orders/7"),
            Some((Service::Order, "/api/orders/7".into()))
        );
    }

    #[test]
    fn alias_prefixes_are_rewritten() {
        assert_eq!(
            resolve("/api/cat/products"),
            Some((Service::Catalog, "/api/v1/products".into()))
        );
        assert_eq!(
            resolve("/api/users/42"),
            Some((Service::User, "/api/admin/42".into()))
        );
        assert_eq!(resolve("/api/cat"), Some((Service::Catalog, "/api/v1".into())));
    }

    #[test]
    fn specific_admin_rules_beat_catch_all() {
        assert_eq!(
            resolve("/api/admin/orders/123"),
            Some((Service::Order, "/api/admin/orders/123".into()))
        );
        assert_eq!(
            resolve("/api/admin/carts"),
            Some((Service::Order, "/api/admin/carts".into()))
        );
        assert_eq!(
            resolve("/api/admin/users/9"),
            Some((Service::User, "/api/admin/users/9".into()))
        );
        assert_eq!(
            resolve("/api/admin/stores"),
            Some((Service::User, "/api/admin/stores".into()))
        );
    }

    #[test]
    fn bare_health_goes_to_catalog() {
        assert_eq!(resolve("/health"), Some((Service::Catalog, "/health".into())));
        assert_eq!(resolve("/healthz"), None);
    }

    #[test]
    fn unmatched_paths_resolve_to_none() {
        assert_eq!(resolve("/foo/bar"), None);
        assert_eq!(resolve("/"), None);
        assert_eq!(resolve("/api"), None);
        assert_eq!(resolve("/API/v1/products"), None);
    }

    #[test]
    fn resolve_reports_rule_index() {
        let table = RouteTable::standard();
        let resolved = table.resolve("/api/admin/orders/1").unwrap();
        assert_eq!(
            table.rules()[resolved.rule_index].matcher,
            PathMatch::Prefix("/api/admin/orders")
        );
    }

    #[test]
    fn dot_segments_are_resolved() {
        assert_eq!(
            normalize_path("/api/v1/../admin/users").as_deref(),
            Some("/api/admin/users")
        );
        assert_eq!(
            normalize_path("/api/cat/./products").as_deref(),
            Some("/api/cat/products")
        );
        assert_eq!(
            normalize_path("/api/v1/%2e%2e/admin").as_deref(),
            Some("/api/admin")
        );
        assert_eq!(normalize_path("/../../health").as_deref(), Some("/health"));
    }

    #[test]
    fn normalized_paths_keep_their_shape() {
        assert_eq!(
            normalize_path("/api/v1/products/9").as_deref(),
            Some("/api/v1/products/9")
        );
        assert_eq!(normalize_path("//api/v1").as_deref(), Some("//api/v1"));
        assert_eq!(normalize_path("/api/cat/").as_deref(), Some("/api/cat/"));
        assert_eq!(normalize_path("relative"), None);
    }

    #[test]
    fn traversal_cannot_escape_to_another_service() {
        let path = normalize_path("/api/v1/../admin/users").unwrap();
        assert_eq!(
            resolve(&path),
            Some((Service::User, "/api/admin/users".into()))
        );
    }

    #[test]
    fn standard_table_has_no_shadowed_rules() {
        assert!(RouteTable::standard().shadowed_rules().is_empty());
    }

    #[test]
    fn catch_all_declared_first_shadows_specific_rule() {
        let table = RouteTable::new(vec![
            RouteRule::prefix("/api/admin", Service::User),
            RouteRule::prefix("/api/admin/orders", Service::Order),
        ]);
        assert_eq!(table.shadowed_rules(), vec![1]);
        assert_eq!(
            table.resolve("/api/admin/orders/1").unwrap().service,
            Service::User
        );
    }

    #[test]
    fn health_shim_declared_after_prefix_is_shadowed() {
        let table = RouteTable::new(vec![
            RouteRule::prefix("/api/v1", Service::Catalog),
            RouteRule::exact("/api/v1/health", Service::Catalog).rewrite(Rewrite::To("/health")),
        ]);
        assert_eq!(table.shadowed_rules(), vec![1]);
    }
}
