//! User sign-in, sign-up and access token endpoints

use crate::api::unprocessable;
use crate::domain::{CreateUserInput, IssuedAccessToken, User};
use crate::error::{AppError, Result};
use crate::form::{
    assign_form, project_errors, validate_form, NewAccessTokenForm, RegisterForm, SignInForm,
    TemplateData,
};
use crate::middleware::{expired_session_cookie, session_cookie, CurrentUser};
use crate::repository::{AccessTokenRepository, UserRepository};
use crate::session::Session;
use crate::state::HasIdentity;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;
use tracing::{info, warn};
use validator::Validate;

/// Response for a successful sign-in
#[derive(Debug, serde::Serialize)]
pub struct SignInResponse {
    pub id: i64,
    pub name: String,
    pub remember: bool,
}

/// POST /user/login
pub async fn login<S: HasIdentity>(
    State(state): State<S>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Result<Response> {
    let errors = validate_form(&form);
    if !errors.is_empty() {
        let mut data = TemplateData::new();
        project_errors(&errors, &mut data, &form, state.locale());
        return Ok(unprocessable(data));
    }

    let user = match state.user_repo().find_by_name(&form.user_name).await? {
        Some(user) if user.validate_password(&form.password) => user,
        _ => {
            warn!("Failed sign-in attempt for {:?}", form.user_name);
            return Err(AppError::Unauthorized(
                "Username or password is not correct".to_string(),
            ));
        }
    };

    if !user.is_active {
        return Err(AppError::Forbidden("Account is not activated".to_string()));
    }

    let session = session.regenerate().await?;
    let key = &state.config().auth.session_user_key;
    session.set(key, &user.id.to_string()).await?;
    info!(user_id = user.id, "User {} signed in", user.name);

    let jar = jar.add(session_cookie(&state.config().session, session.id()));
    let body = Json(SignInResponse {
        id: user.id,
        name: user.name,
        remember: form.remember,
    });
    Ok((jar, body).into_response())
}

/// POST /user/logout
pub async fn logout<S: HasIdentity>(
    State(state): State<S>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    session.remove(&state.config().auth.session_user_key).await?;
    session.destroy().await?;

    let jar = jar.remove(expired_session_cookie(&state.config().session));
    Ok((jar, StatusCode::NO_CONTENT).into_response())
}

/// Template data for a form rejected outside rule validation
fn form_rejection(
    form: &RegisterForm,
    error_flag: &str,
    message: String,
) -> TemplateData {
    let mut data = TemplateData::new();
    data.insert("HasError".to_string(), Value::Bool(true));
    assign_form(form, &mut data);
    data.insert(error_flag.to_string(), Value::Bool(true));
    data.insert("ErrorMsg".to_string(), Value::String(message));
    data
}

/// POST /user/sign_up
pub async fn sign_up<S: HasIdentity>(
    State(state): State<S>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let errors = validate_form(&form);
    if !errors.is_empty() {
        let mut data = TemplateData::new();
        project_errors(&errors, &mut data, &form, state.locale());
        return Ok(unprocessable(data));
    }

    if form.password != form.retype {
        let message = state.locale().tr("form.password_not_match", &[]);
        return Ok(unprocessable(form_rejection(&form, "Err_Password", message)));
    }

    let input = CreateUserInput {
        name: form.user_name.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        is_active: true,
    };
    input.validate()?;

    let user: User = match state.user_repo().create(&input).await {
        Ok(user) => user,
        Err(AppError::Conflict(_)) => {
            let message = state.locale().tr("form.username_been_taken", &[]);
            return Ok(unprocessable(form_rejection(&form, "Err_UserName", message)));
        }
        Err(e) => return Err(e),
    };

    info!(user_id = user.id, "User {} signed up", user.name);
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// POST /user/settings/applications
pub async fn create_access_token<S: HasIdentity>(
    State(state): State<S>,
    current: CurrentUser,
    Form(mut form): Form<NewAccessTokenForm>,
) -> Result<Response> {
    form.uid = current.user.id;

    let errors = validate_form(&form);
    if !errors.is_empty() {
        let mut data = TemplateData::new();
        project_errors(&errors, &mut data, &form, state.locale());
        return Ok(unprocessable(data));
    }

    let token = state.token_repo().create(form.uid, &form.name).await?;
    info!(
        user_id = form.uid,
        token_id = token.id,
        "Access token {:?} issued",
        token.name
    );

    Ok((StatusCode::CREATED, Json(IssuedAccessToken::from(token))).into_response())
}

/// GET /api/v1/user
pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}
