//! `edge-proxy routes`: print the routing table in priority order.
//!
//! Each rule is shown with its match type, target service, rewrite, and
//! the upstream origin it currently resolves to. Upstreams that are not
//! configured are shown as `-` rather than failing, so the table can be
//! inspected before the environment is complete.

use crate::cli::{OutputFormat, RoutesArgs};
use crate::config;
use crate::config::model::UpstreamConfig;
use crate::error::EdgeError;
use crate::proxy::routing::{PathMatch, Rewrite, RouteRule, RouteTable};

pub async fn execute(args: &RoutesArgs) -> Result<(), EdgeError> {
    let loaded = config::resolve(&args.config).await?;
    let table = RouteTable::standard();
    let shadowed = table.shadowed_rules();

    match args.format {
        OutputFormat::Text => println!("{}", format_table(&table, &loaded.config.upstreams)),
        OutputFormat::Json => {
            let rules: Vec<serde_json::Value> = table
                .rules()
                .iter()
                .enumerate()
                .map(|(i, rule)| {
                    let (kind, pattern) = describe_match(rule);
                    serde_json::json!({
                        "match": pattern,
                        "type": kind,
                        "upstream": rule.service.as_str(),
                        "origin": loaded.config.upstreams.get(rule.service),
                        "rewrite": describe_rewrite(rule),
                        "shadowed": shadowed.contains(&i),
                    })
                })
                .collect();
            println!("{}", serde_json::json!({ "routes": rules }));
        }
    }

    Ok(())
}

const fn describe_match(rule: &RouteRule) -> (&'static str, &'static str) {
    match rule.matcher {
        PathMatch::Exact(p) => ("exact", p),
        PathMatch::Prefix(p) => ("prefix", p),
    }
}

fn describe_rewrite(rule: &RouteRule) -> Option<String> {
    rule.rewrite.map(|rewrite| match rewrite {
        Rewrite::To(to) => format!("-> {to}"),
        Rewrite::Replace { to } => format!("{} -> {to}", rule.matcher.pattern()),
    })
}

#[must_use]
pub fn format_table(table: &RouteTable, upstreams: &UpstreamConfig) -> String {
    let mut lines = vec![format!("  {} rules, first match wins\n", table.rules().len())];
    let shadowed = table.shadowed_rules();

    for (i, rule) in table.rules().iter().enumerate() {
        let (kind, pattern) = describe_match(rule);
        let origin = upstreams.get(rule.service).unwrap_or("-");
        let mut line = format!(
            "  {:>2}. {pattern:<20} {kind:<6}  -> {:<8} {origin}",
            i + 1,
            rule.service.as_str()
        );
        if let Some(rewrite) = describe_rewrite(rule) {
            line.push_str(&format!("  (rewrite {rewrite})"));
        }
        if shadowed.contains(&i) {
            line.push_str("  [never matches]");
        }
        lines.push(line);
    }
    lines.push("   *  anything else              -> 404".into());

    lines.join("\n")
}
