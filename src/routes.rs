use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, StoreError};
use crate::middleware::AppState;
use crate::models::NewLink;
use crate::session::{AdminSession, Session};
use crate::views;

#[derive(Deserialize, Debug)]
pub struct LinkForm {
    pub title: String,
    pub url: String,
}

impl LinkForm {
    pub fn as_new_link(&self) -> Result<NewLink<'_>, StoreError> {
        NewLink::new(&self.title, &self.url).map_err(StoreError::ConstraintViolation)
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Renders first and counts the visit afterwards, so the numbers an
/// admin sees never include their own request.
pub async fn home(State(state): State<AppState>, session: Session) -> Result<Html<String>, AppError> {
    let links = state.store.list_all().await?;
    let page = views::render_public(&links, session.is_admin)?;

    if !session.is_admin {
        state.store.record_public_view().await?;
    }

    Ok(page)
}

pub async fn click(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, AppError> {
    let url = state.store.record_click(id).await?;
    debug!("Click on link {} -> {}", id, url);

    let location = HeaderValue::try_from(url).map_err(|_| AppError::InvalidTarget(id))?;
    Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}

pub async fn login_form() -> Result<Html<String>, AppError> {
    Ok(views::render_login(None)?)
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response, AppError> {
    if !state.config.admin.matches(&form.username, &form.password) {
        warn!("Failed login attempt for user {:?}", form.username);
        return Ok(views::render_login(Some("Invalid credentials"))?.into_response());
    }

    info!("Admin {} logged in", form.username);
    let cookie = state.sessions.issue(&form.username)?;

    Ok(([(header::SET_COOKIE, cookie.to_string())], Redirect::to("/dashboard")).into_response())
}

pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = state.sessions.clear();

    ([(header::SET_COOKIE, cookie.to_string())], Redirect::to("/login")).into_response()
}

pub async fn dashboard(_: AdminSession, State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let links = state.store.list_all().await?;
    Ok(views::render_dashboard(&links)?)
}

pub async fn add(
    _: AdminSession,
    State(state): State<AppState>,
    Form(form): Form<LinkForm>,
) -> Result<Redirect, AppError> {
    let link = form.as_new_link()?;
    state.store.create(link.title, link.url).await?;
    info!("Added link {:?}", link.title);

    Ok(Redirect::to("/dashboard"))
}

pub async fn delete(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    state.store.delete(id).await?;
    info!("Deleted link {}", id);

    Ok(Redirect::to("/dashboard"))
}

pub async fn edit(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<LinkForm>,
) -> Result<Redirect, AppError> {
    let link = form.as_new_link()?;
    state.store.update(id, link.title, link.url).await?;
    info!("Updated link {}", id);

    Ok(Redirect::to("/dashboard"))
}
