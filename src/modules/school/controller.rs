use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;

use super::interface::SchoolError;
use super::schema::{
    DeleteResponse, LoginRequest, LoginResponse, RecoverRequest, RecoverResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, ResetPasswordResponse, SchoolResponse, SchoolSummary,
    VerifyEmailResponse,
};
use super::service::SchoolService;

const SESSION_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

fn service(state: &AppState) -> SchoolService<'_> {
    SchoolService::new(
        state.schools.as_ref(),
        state.mailer.as_ref(),
        state.uploads.as_ref(),
        &state.jwt_service,
        &state.client_url,
    )
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RegisterResponse>), SchoolError> {
    let mut req = RegisterRequest::default();
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| SchoolError::Validation("Invalid multipart form".to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| SchoolError::Validation("Could not read image field".to_string()))?;
            image = Some(bytes.to_vec());
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|_| SchoolError::Validation(format!("Could not read field {name}")))?;

        match name.as_str() {
            "email" => req.email = value,
            "password" => req.password = value,
            "password_confirm" => req.password_confirm = value,
            "name" => req.name = value,
            "description" => req.description = value,
            "phone" => req.phone = value,
            "address" => req.address = value,
            other => {
                return Err(SchoolError::Validation(format!(
                    "{other} is not a valid field"
                )));
            }
        }
    }

    let school = service(&state).register(req, image).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "School registered successfully.",
            school: SchoolResponse::from(&school),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, SchoolError> {
    let (token, school) = service(&state).login(&req.email, &req.password).await?;

    // The session token is delivered both ways: HttpOnly cookie for browser
    // clients and the response body for API clients.
    let cookie = format!(
        "auth_token={token}; HttpOnly; Path=/; Max-Age={SESSION_COOKIE_MAX_AGE_SECS}; SameSite=Lax"
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| SchoolError::Upstream(e.to_string()))?;

    let mut response = (
        StatusCode::OK,
        Json(LoginResponse {
            token,
            school: SchoolSummary {
                id: school.id,
                email: school.email,
                name: school.name,
            },
            message: "Login successful",
        }),
    )
        .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);

    Ok(response)
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<VerifyEmailResponse>), SchoolError> {
    service(&state).verify_email(&token).await?;

    Ok((
        StatusCode::OK,
        Json(VerifyEmailResponse {
            message: "Email verified successfully",
        }),
    ))
}

pub async fn recover(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecoverRequest>,
) -> Result<(StatusCode, Json<RecoverResponse>), SchoolError> {
    if req.validate().is_err() {
        return Err(SchoolError::Validation("Invalid email format".to_string()));
    }

    service(&state).recover(&req.email).await?;

    // Identical body whether or not the account exists.
    Ok((
        StatusCode::OK,
        Json(RecoverResponse {
            message: "If that email is registered, a recovery link has been sent",
        }),
    ))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, Json<ResetPasswordResponse>), SchoolError> {
    service(&state)
        .reset_password(&token, &req.new_password)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ResetPasswordResponse {
            message: "Password reset successfully",
        }),
    ))
}

pub async fn get_school(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SchoolResponse>), SchoolError> {
    let school = service(&state).get(&id).await?;

    Ok((StatusCode::OK, Json(SchoolResponse::from(&school))))
}

pub async fn list_schools(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Vec<SchoolResponse>>), SchoolError> {
    let schools = service(&state).list().await?;

    Ok((
        StatusCode::OK,
        Json(schools.iter().map(SchoolResponse::from).collect()),
    ))
}

pub async fn delete_school(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteResponse>), SchoolError> {
    service(&state).delete(&id).await?;

    Ok((
        StatusCode::OK,
        Json(DeleteResponse {
            message: "School deleted successfully",
        }),
    ))
}
