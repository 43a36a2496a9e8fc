use askama::Template;
use axum::response::Html;

use crate::models::Link;

#[derive(Template)]
#[template(path = "public.html")]
struct PublicPage<'a> {
    links: &'a [Link],
    is_admin: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage<'a> {
    links: &'a [Link],
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginPage<'a> {
    error: Option<&'a str>,
}

/// The visitor-facing list. Counters are only shown to admins.
pub fn render_public(links: &[Link], is_admin: bool) -> askama::Result<Html<String>> {
    PublicPage { links, is_admin }.render().map(Html)
}

pub fn render_dashboard(links: &[Link]) -> askama::Result<Html<String>> {
    DashboardPage { links }.render().map(Html)
}

pub fn render_login(error: Option<&str>) -> askama::Result<Html<String>> {
    LoginPage { error }.render().map(Html)
}
