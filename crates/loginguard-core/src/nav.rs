//! Shared top navigation: which site this page belongs to, and the sibling
//! service dropdown.

use serde::Deserialize;

pub const DEFAULT_SITE: &str = "admin";

/// One sibling service as returned by the services endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceEntry {
    pub site_name: String,
    pub site_url: String,
}

#[derive(Deserialize)]
struct SiteConfig {
    login: LoginSection,
}

#[derive(Deserialize)]
struct LoginSection {
    project: String,
}

/// Location of the site config for a page under `.../templates/<file>`.
///
/// `/admin/data/templates/index.html` → `/admin/data/config.yaml`. Paths
/// without a `templates/<file>` tail are returned unchanged.
pub fn config_url_for_page(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _file)) => match dir.strip_suffix("/templates") {
            Some(parent) => format!("{parent}/config.yaml"),
            None => path.to_string(),
        },
        None => path.to_string(),
    }
}

/// The current site key from the YAML `login.project` value, or `fallback`
/// when the document does not parse or lacks the key.
pub fn resolve_site(config_text: &str, fallback: &str) -> String {
    match serde_yaml::from_str::<SiteConfig>(config_text) {
        Ok(cfg) if !cfg.login.project.trim().is_empty() => cfg.login.project,
        Ok(_) => {
            tracing::warn!(fallback, "login.project is empty; using fallback site");
            fallback.to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, fallback, "could not read login.project; using fallback site");
            fallback.to_string()
        }
    }
}

/// Dropdown list items, one per service, opening in a new tab.
pub fn render_dropdown(entries: &[ServiceEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                r#"<li><a class="dropdown-item" href="{}" target="_blank">{}</a></li>"#,
                escape_html(&e.site_url),
                escape_html(&e.site_name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
