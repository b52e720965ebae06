use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::auth::{AuthRecord, KycDocuments, Role};
use crate::entities::registration::LoginError;
use crate::error::AppResult;
use crate::handlers::auth::KycRequest;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub auth: AuthRecord,
    pub kyc_complete: bool,
    pub notice: Option<String>,
}

impl AccountResponse {
    fn new(auth: AuthRecord, notice: Option<&str>) -> Self {
        Self {
            kyc_complete: auth.kyc_complete(),
            auth,
            notice: notice.map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignedOutResponse {
    pub message: &'static str,
    pub redirect: &'static str,
}

pub async fn get_account(Extension(auth): Extension<AuthRecord>) -> Json<AccountResponse> {
    Json(AccountResponse::new(auth, None))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, message = "Enter your name"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthRecord>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<AccountResponse>> {
    let payload = UpdateProfileRequest {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
    };
    payload.validate()?;

    let updated = AuthRecord {
        name: payload.name,
        email: payload.email,
        ..auth
    };
    state.session.set_auth(Some(&updated)).await?;

    Ok(Json(AccountResponse::new(updated, Some("Profile updated"))))
}

/// Save rider documents; a passenger becomes a rider once they are on file
pub async fn save_kyc(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthRecord>,
    Json(payload): Json<KycRequest>,
) -> AppResult<Json<AccountResponse>> {
    let docs = KycDocuments::from(payload);
    if !docs.is_complete() {
        return Err(LoginError::MissingDocuments.into());
    }

    let updated = AuthRecord {
        role: Role::Rider,
        docs: Some(docs),
        ..auth
    };
    state.session.set_auth(Some(&updated)).await?;

    tracing::info!("Rider KYC saved");
    Ok(Json(AccountResponse::new(updated, Some("KYC saved"))))
}

/// End the session and drop any ride in flight
pub async fn logout(State(state): State<AppState>) -> AppResult<Json<SignedOutResponse>> {
    state.session.sign_out().await?;

    tracing::info!("Signed out");
    Ok(Json(SignedOutResponse {
        message: "Signed out",
        redirect: "/login",
    }))
}

pub async fn delete_account(State(state): State<AppState>) -> AppResult<Json<SignedOutResponse>> {
    state.session.clear_account().await?;

    tracing::info!("Account data cleared");
    Ok(Json(SignedOutResponse {
        message: "Account data cleared",
        redirect: "/login",
    }))
}
