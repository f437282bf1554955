//! Customer registration, login, profile and password change endpoints.

use super::{ErrorBody, auth_error_response, error_body};
use crate::credentials::{AccountId, CredentialService, Customer, CustomerDraft};
use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    email: String,
    password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
}

#[derive(ToSchema, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CustomerResponse {
    pub message: String,
    pub customer: Customer,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[utoipa::path(
    post,
    path = "/customers/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Customer registered", body = CustomerResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    tag = "customers"
)]
pub async fn register(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_body(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let draft = CustomerDraft {
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
        phone: request.phone.filter(|phone| !phone.is_empty()),
    };
    let password = SecretString::from(request.password);

    match service.register(draft, &password).await {
        Ok(customer) => (
            StatusCode::CREATED,
            Json(CustomerResponse {
                message: "Customer registered successfully".to_string(),
                customer,
            }),
        )
            .into_response(),
        Err(err) => auth_error_response(&err, "Failed to register customer").into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/customers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = CustomerResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    tag = "customers"
)]
pub async fn login(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_body(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let password = SecretString::from(request.password);

    match service.login(&request.email, &password).await {
        Ok(customer) => (
            StatusCode::OK,
            Json(CustomerResponse {
                message: "Login successful".to_string(),
                customer,
            }),
        )
            .into_response(),
        Err(err) => auth_error_response(&err, "Failed to login").into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer profile", body = Customer),
        (status = 404, description = "Customer not found", body = ErrorBody)
    ),
    tag = "customers"
)]
pub async fn profile(
    service: Extension<Arc<CredentialService>>,
    Path(id): Path<AccountId>,
) -> impl IntoResponse {
    match service.profile(id).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(err) => auth_error_response(&err, "Failed to fetch customer profile").into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/customers/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = CustomerResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Customer not found", body = ErrorBody),
        (status = 409, description = "Email already in use by another account", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    tag = "customers"
)]
pub async fn update_profile(
    service: Extension<Arc<CredentialService>>,
    Path(id): Path<AccountId>,
    payload: Option<Json<UpdateProfileRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_body(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let draft = CustomerDraft {
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
        phone: request.phone.filter(|phone| !phone.is_empty()),
    };

    match service.update_profile(id, draft).await {
        Ok(customer) => (
            StatusCode::OK,
            Json(CustomerResponse {
                message: "Profile updated successfully".to_string(),
                customer,
            }),
        )
            .into_response(),
        Err(err) => auth_error_response(&err, "Failed to update profile").into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/customers/{id}/password",
    params(("id" = i32, Path, description = "Customer id")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Current password is incorrect", body = ErrorBody),
        (status = 404, description = "Customer not found", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    tag = "customers"
)]
pub async fn change_password(
    service: Extension<Arc<CredentialService>>,
    Path(id): Path<AccountId>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_body(StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let current = SecretString::from(request.current_password);
    let new = SecretString::from(request.new_password);

    match service.change_password(id, &current, &new).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Password changed successfully",
            }),
        )
            .into_response(),
        Err(err) => auth_error_response(&err, "Failed to change password").into_response(),
    }
}
