use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", post(logout))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    email: Option<String>,
}

async fn landing(current: CurrentUser) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LandingTemplate {
        email: current.0.map(|identity| identity.to_string()),
    })
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    show_error: bool,
    error_message: String,
    email: String,
}

async fn login_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LoginTemplate {
        show_error: false,
        error_message: String::new(),
        email: String::new(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

async fn login_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let identity = match auth::check_login(&state.config, &form.email, &form.password) {
        Ok(identity) => identity,
        Err(AppError::BadRequest(msg)) => return Ok(render_login_error(form.email, msg)),
        Err(err) => return Err(err),
    };

    let owner = identity.clone();
    state
        .with_trips(move |trips| trips.ensure_list(&owner))
        .await?;
    info!("{identity} logged in");

    Ok((
        auth::apply_session_cookie(jar, &identity),
        Redirect::to("/me"),
    )
        .into_response())
}

fn render_login_error(email: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(LoginTemplate {
            show_error: true,
            error_message: message,
            email,
        }),
    )
        .into_response()
}

async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
    (auth::clear_session_cookie(jar), Redirect::to("/"))
}
