use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::{Form, FormRejection};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::downloader::{ExportFormat, export_file_name};
use crate::error::AppError;
use crate::row::{AnimationTarget, ScriptRow};
use crate::session::{Flash, RowDraft, SESSION_COOKIE, Session, SessionStore};
use crate::table::HEADERS;

const INDEX_TEMPLATE: &str = "index";

pub struct AppState {
    sessions: SessionStore,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, handlebars::TemplateError> {
        let mut templates = Handlebars::new();
        templates.register_template_string(INDEX_TEMPLATE, include_str!("./templates/index.hbs"))?;

        Ok(Self {
            sessions: SessionStore::new(config.session_ttl, config.course_name.clone()),
            templates,
        })
    }

    /// Resolve the caller's session, issuing a cookie for new ones
    fn session(&self, jar: CookieJar) -> (CookieJar, String) {
        let presented = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        let (id, created) = self.sessions.resolve(presented.as_deref());

        if !created {
            return (jar, id);
        }

        let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        (jar.add(cookie), id)
    }
}

#[derive(Deserialize)]
struct RowForm {
    #[serde(default)]
    page_number: String,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    effect_description: String,
    #[serde(default)]
    script: String,
}

#[derive(Deserialize)]
struct SettingsForm {
    #[serde(default)]
    course_name: String,
    wide_layout: Option<String>,
}

#[derive(Deserialize)]
struct NewRow {
    page_number: Option<i64>,
    #[serde(default)]
    animation_targets: Vec<String>,
    #[serde(default)]
    effect_description: String,
    #[serde(default)]
    script: String,
}

#[derive(Serialize)]
struct TargetOption {
    key: &'static str,
    label: &'static str,
    checked: bool,
}

#[derive(Serialize)]
struct TargetInfo {
    key: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct RowView {
    page: String,
    targets: String,
    effect: String,
    script: String,
}

#[derive(Serialize)]
struct PageContext {
    course_name: String,
    wide_layout: bool,
    flash: Option<Flash>,
    draft: RowDraft,
    headers: [&'static str; 4],
    targets: Vec<TargetOption>,
    rows: Vec<RowView>,
    row_count: usize,
}

#[derive(Serialize)]
struct TableResponse {
    course_name: String,
    headers: [&'static str; 4],
    rows: Vec<ScriptRow>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the application router around shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/rows", post(add_row))
        .route("/rows/delete-last", post(delete_last_row))
        .route("/reset", post(reset_table))
        .route("/settings", post(update_settings))
        .route("/export/:format", get(export_table))
        .route("/api/rows", get(list_rows).post(create_row).delete(clear_rows))
        .route("/api/rows/last", delete(remove_last_row))
        .route("/api/targets", get(list_targets))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr()?;
    let state = Arc::new(AppState::new(&config)?);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_index(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    let (jar, id) = state.session(jar);
    let context = state.sessions.with_session(&id, page_context);
    let page = state.templates.render(INDEX_TEMPLATE, &context)?;
    Ok((jar, Html(page)))
}

fn page_context(session: &mut Session) -> PageContext {
    let rows = session
        .table
        .rows()
        .iter()
        .map(|row| RowView {
            page: row.page_text(),
            targets: row.targets_text(),
            effect: row.effect_description.clone(),
            script: row.script.clone(),
        })
        .collect();

    let draft = session.draft.take();
    let targets = target_options(draft.as_ref());

    PageContext {
        course_name: session.course_name.clone(),
        wide_layout: session.wide_layout,
        flash: session.take_flash(),
        draft: draft.unwrap_or_default(),
        headers: HEADERS,
        targets,
        rows,
        row_count: session.table.len(),
    }
}

/// Form checkboxes: the draft's selection if there is one, else the default tag
fn target_options(draft: Option<&RowDraft>) -> Vec<TargetOption> {
    AnimationTarget::ALL
        .into_iter()
        .map(|t| TargetOption {
            key: t.key(),
            label: t.label(),
            checked: match draft {
                Some(d) => d.targets.iter().any(|raw| raw == t.key() || raw == t.label()),
                None => t == AnimationTarget::default(),
            },
        })
        .collect()
}

async fn add_row(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: Result<Form<RowForm>, FormRejection>,
) -> Result<(CookieJar, Redirect), AppError> {
    let Form(form) = form.map_err(|e| AppError::Form(e.to_string()))?;
    let (jar, id) = state.session(jar);
    let parsed = ScriptRow::from_input(
        &form.page_number,
        &form.targets,
        &form.effect_description,
        &form.script,
    );

    state.sessions.with_session(&id, |session| match parsed {
        Ok(row) => {
            let len = session.table.append(row);
            log::info!("Session {} appended row {}", id, len);
        }
        Err(e) => {
            log::debug!("Session {} rejected row: {}", id, e);
            session.flash = Some(Flash::error(e.to_string()));
            session.draft = Some(RowDraft {
                page_number: form.page_number,
                targets: form.targets,
                effect_description: form.effect_description,
                script: form.script,
            });
        }
    });

    Ok((jar, Redirect::to("/")))
}

async fn delete_last_row(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let (jar, id) = state.session(jar);

    state.sessions.with_session(&id, |session| match session.table.delete_last() {
        Ok(_) => log::info!("Session {} removed its last row", id),
        Err(e) => session.flash = Some(Flash::warning(e.to_string())),
    });

    (jar, Redirect::to("/"))
}

async fn reset_table(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let (jar, id) = state.session(jar);

    state.sessions.with_session(&id, |session| {
        session.table.reset();
        session.flash = Some(Flash::info("Script table cleared."));
    });
    log::info!("Session {} reset its table", id);

    (jar, Redirect::to("/"))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: Result<Form<SettingsForm>, FormRejection>,
) -> Result<(CookieJar, Redirect), AppError> {
    let Form(form) = form.map_err(|e| AppError::Form(e.to_string()))?;
    let (jar, id) = state.session(jar);
    let fallback = state.sessions.default_course().to_string();

    state.sessions.with_session(&id, |session| {
        session.course_name = match form.course_name.trim() {
            "" => fallback,
            name => name.to_string(),
        };
        session.wide_layout = form.wide_layout.is_some();
    });

    Ok((jar, Redirect::to("/")))
}

async fn export_table(
    Path(ext): Path<String>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(format) = ExportFormat::from_extension(&ext) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let (jar, id) = state.session(jar);
    let (table, course_name) = state
        .sessions
        .with_session(&id, |session| (session.table.clone(), session.course_name.clone()));

    let bytes = format.render(&table)?;
    let file_name = export_file_name(&course_name, format, state.sessions.default_course());
    log::info!(
        "Session {} exported {} row(s) as {} ({} bytes)",
        id,
        table.len(),
        file_name,
        bytes.len()
    );

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(format.mime())),
        (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
    ];
    Ok((jar, headers, bytes).into_response())
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987 UTF-8 name
fn content_disposition(file_name: &str) -> HeaderValue {
    let ascii: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn list_rows(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<TableResponse>) {
    let (jar, id) = state.session(jar);
    let response = state.sessions.with_session(&id, |session| TableResponse {
        course_name: session.course_name.clone(),
        headers: HEADERS,
        rows: session.table.rows().to_vec(),
    });
    (jar, Json(response))
}

async fn create_row(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<NewRow>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<serde_json::Value>), AppError> {
    let Json(payload) = payload?;
    let (jar, id) = state.session(jar);
    let row = ScriptRow::new(
        payload.page_number,
        &payload.animation_targets,
        &payload.effect_description,
        &payload.script,
    )?;

    let len = state.sessions.with_session(&id, |session| session.table.append(row));
    log::info!("Session {} appended row {}", id, len);

    Ok((StatusCode::CREATED, jar, Json(serde_json::json!({ "len": len }))))
}

async fn remove_last_row(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ScriptRow>), AppError> {
    let (jar, id) = state.session(jar);
    let removed = state.sessions.with_session(&id, |session| session.table.delete_last())?;
    log::info!("Session {} removed its last row", id);
    Ok((jar, Json(removed)))
}

async fn clear_rows(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let (jar, id) = state.session(jar);
    state.sessions.with_session(&id, |session| session.table.reset());
    log::info!("Session {} reset its table", id);
    (jar, StatusCode::NO_CONTENT)
}

async fn list_targets() -> Json<Vec<TargetInfo>> {
    let targets = AnimationTarget::ALL
        .into_iter()
        .map(|t| TargetInfo { key: t.key(), label: t.label() })
        .collect();
    Json(targets)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_keeps_utf8_name() {
        let value = content_disposition("도레미파이썬_script.xlsx");
        let value = value.to_str().unwrap();
        assert!(value.starts_with("attachment; filename=\"_______script.xlsx\""));
        assert!(value.ends_with(
            "filename*=UTF-8''%EB%8F%84%EB%A0%88%EB%AF%B8%ED%8C%8C%EC%9D%B4%EC%8D%AC_script.xlsx"
        ));
    }

    #[test]
    fn default_target_is_preselected() {
        let options = target_options(None);
        assert_eq!(options.len(), 8);
        assert!(options[0].checked);
        assert!(options[1..].iter().all(|o| !o.checked));
    }

    #[test]
    fn draft_selection_overrides_default() {
        let draft = RowDraft {
            targets: vec!["shape".to_string(), "✨ 효과".to_string()],
            ..RowDraft::default()
        };
        let checked: Vec<_> = target_options(Some(&draft))
            .into_iter()
            .filter(|o| o.checked)
            .map(|o| o.key)
            .collect();
        assert_eq!(checked, ["shape", "effect"]);
    }
}
