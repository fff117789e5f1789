//! Role-aware navigation menu

use mockorbit_core::{Identity, Role, RouteConfig};
use serde::Serialize;

/// Pages every signed-in account sees
const SHARED_PAGES: [&str; 3] = ["Schedule", "Profile", "AI Questions"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub href: String,
    pub label: String,
    /// Set for dashboard entries
    pub dashboard_role: Option<Role>,
}

/// Menu for a signed-in identity: one dashboard per granted role, then the shared pages.
/// Returns an empty menu without an identity.
pub fn menu_for(identity: Option<&Identity>, routes: &RouteConfig) -> Vec<NavItem> {
    let Some(identity) = identity else {
        return Vec::new();
    };

    let dashboards = Role::ALL
        .into_iter()
        .filter(|role| identity.has_role(*role))
        .map(|role| NavItem {
            href: routes.dashboard_for(role),
            label: format!("{} Dashboard", role.label()),
            dashboard_role: Some(role),
        });

    let shared = SHARED_PAGES.into_iter().map(|label| NavItem {
        href: format!("/{}", slug(label)),
        label: label.to_string(),
        dashboard_role: None,
    });

    dashboards.chain(shared).collect()
}

/// Lowercase, with every run of non-alphanumeric characters collapsed into `-`
fn slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;

    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
