use serde::Serialize;

use crate::entities::auth::Role;

/// Client-side pages; the API under `/api` serves them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Home,
    Search,
    PostRide,
    Safety,
    About,
    Login,
    Help,
    Account,
    NotFound,
}

const PROTECTED: [(&str, Option<Role>); 3] = [
    ("/search", Some(Role::Passenger)),
    ("/post-ride", Some(Role::Rider)),
    ("/account", None),
];

/// Path without query string or fragment
fn pathname(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

fn under(pathname: &str, prefix: &str) -> bool {
    pathname == prefix
        || pathname
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl Page {
    pub fn from_path(target: &str) -> Self {
        let path = pathname(target);
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };

        match path {
            "" | "/" => Page::Home,
            "/search" => Page::Search,
            "/post-ride" => Page::PostRide,
            "/safety" => Page::Safety,
            "/about" => Page::About,
            "/login" => Page::Login,
            "/help" => Page::Help,
            "/account" => Page::Account,
            _ => Page::NotFound,
        }
    }

    /// Page whose data an API path serves, for building login redirects
    pub fn for_api_path(api_path: &str) -> Self {
        let path = pathname(api_path);
        if under(path, "/api/rides") || under(path, "/api/search") {
            Page::Search
        } else if under(path, "/api/offers") {
            Page::PostRide
        } else if under(path, "/api/account") {
            Page::Account
        } else {
            Page::Home
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Page::Home | Page::NotFound => "/",
            Page::Search => "/search",
            Page::PostRide => "/post-ride",
            Page::Safety => "/safety",
            Page::About => "/about",
            Page::Login => "/login",
            Page::Help => "/help",
            Page::Account => "/account",
        }
    }
}

/// Whether `target` sits under a protected prefix, and the role it hints at
fn protection(target: &str) -> Option<Option<Role>> {
    let path = pathname(target);
    PROTECTED
        .iter()
        .find(|(prefix, _)| under(path, prefix))
        .map(|(_, hint)| *hint)
}

pub fn requires_auth(target: &str) -> bool {
    protection(target).is_some()
}

#[derive(Serialize)]
struct LoginRedirect<'a> {
    redirect: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

/// `/login?redirect=<target>[&role=<hint>]`
pub fn login_redirect(target: &str) -> String {
    let redirect = if target.is_empty() { "/" } else { target };
    let role = protection(target).flatten().map(|role| match role {
        Role::Passenger => "user",
        Role::Rider => "rider",
    });

    match serde_urlencoded::to_string(LoginRedirect { redirect, role }) {
        Ok(query) => format!("/login?{}", query),
        Err(_) => "/login".to_string(),
    }
}

/// Where a visitor to `target` must go instead, if anywhere
pub fn guard(target: &str, signed_in: bool) -> Option<String> {
    if signed_in || Page::from_path(target) == Page::Login || !requires_auth(target) {
        return None;
    }
    Some(login_redirect(target))
}
