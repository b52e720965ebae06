use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::MutexGuard;
use validator::{Validate, ValidationError};

use crate::entities::auth::{AuthRecord, KycDocuments, Role};
use crate::entities::registration::{safe_redirect, ContactDetails, LoginFlow, LoginStep};
use crate::error::{AppError, AppResult};
use crate::utils::otp::generate_login_code;
use crate::{now_ms, AppState};

/// Query parameters of the `/login` page
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub step: Option<String>,
    pub redirect: Option<String>,
    pub role: Option<String>,
}

impl LoginQuery {
    fn requested_step(&self) -> Option<LoginStep> {
        self.step.as_deref().and_then(|s| s.parse().ok())
    }

    fn role_hint(&self) -> Option<Role> {
        match self.role.as_deref() {
            Some("user") | Some("passenger") => Some(Role::Passenger),
            Some("rider") => Some(Role::Rider),
            _ => None,
        }
    }

    /// `/login?step=..` carrying the redirect and role hint forward
    fn step_url(&self, step: LoginStep) -> String {
        #[derive(Serialize)]
        struct Link<'a> {
            step: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            redirect: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            role: Option<&'a str>,
        }

        let link = Link {
            step: step.as_str(),
            redirect: self.redirect.as_deref(),
            role: self.role.as_deref(),
        };
        match serde_urlencoded::to_string(link) {
            Ok(query) => format!("/login?{}", query),
            Err(_) => "/login".to_string(),
        }
    }
}

pub(crate) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone").with_message("Enter 10-digit mobile number".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct DetailsRequest {
    #[validate(length(min = 2, message = "Enter your name"))]
    pub name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

impl DetailsRequest {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ChooseRoleRequest {
    pub role: Role,
}

/// Uploaded document file names
#[derive(Debug, Deserialize)]
pub struct KycRequest {
    pub license: Option<String>,
    pub rc: Option<String>,
    pub aadhaar: Option<String>,
}

impl From<KycRequest> for KycDocuments {
    fn from(req: KycRequest) -> Self {
        let clean = |doc: Option<String>| {
            doc.map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        };
        KycDocuments {
            license: clean(req.license),
            rc: clean(req.rc),
            aadhaar: clean(req.aadhaar),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DraftInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// `None` once signed in
    pub step: Option<LoginStep>,
    /// Where the client should navigate next
    pub next: String,
    pub suggested_role: Option<Role>,
    pub draft: Option<DraftInfo>,
    /// Stands in for the SMS; only present right after a code is issued
    pub demo_code: Option<String>,
    pub auth: Option<AuthRecord>,
}

fn signed_in(query: &LoginQuery, auth: AuthRecord) -> LoginResponse {
    LoginResponse {
        step: None,
        next: safe_redirect(query.redirect.as_deref()),
        suggested_role: None,
        draft: None,
        demo_code: None,
        auth: Some(auth),
    }
}

fn in_progress(query: &LoginQuery, flow: &LoginFlow, demo_code: Option<String>) -> LoginResponse {
    let step = flow.step().unwrap_or(LoginStep::Details);
    LoginResponse {
        step: Some(step),
        next: query.step_url(step),
        suggested_role: query.role_hint(),
        draft: flow.draft().map(|d| DraftInfo {
            name: d.name.clone(),
            phone: d.phone.clone(),
            email: d.email.clone(),
            verified: d.verified,
        }),
        demo_code,
        auth: None,
    }
}

/// Persist the flow and describe it to the client
async fn settle(
    state: &AppState,
    query: &LoginQuery,
    flow: LoginFlow,
    demo_code: Option<String>,
) -> AppResult<Json<LoginResponse>> {
    if let LoginFlow::Complete(auth) = flow {
        state.session.set_auth(Some(&auth)).await?;
        state.session.set_registration(None).await?;
        tracing::info!(role = auth.role.as_str(), "Signed in");
        return Ok(Json(signed_in(query, auth)));
    }

    state.session.set_registration(flow.draft()).await?;
    Ok(Json(in_progress(query, &flow, demo_code)))
}

/// Lock the draft for one transition. A signed-in session cannot start over.
async fn begin_step(state: &AppState) -> AppResult<(MutexGuard<'_, ()>, LoginFlow)> {
    let guard = state.session.lock_login().await;
    if state.session.auth().await.is_some() {
        return Err(AppError::Conflict(
            "Already signed in. Sign out to switch accounts".to_string(),
        ));
    }
    let flow = LoginFlow::resume(state.session.registration().await, None);
    Ok((guard, flow))
}

/// Resolve which login step to show for the given query
pub async fn login_state(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> AppResult<Json<LoginResponse>> {
    if let Some(auth) = state.session.auth().await {
        return Ok(Json(signed_in(&query, auth)));
    }

    let flow = LoginFlow::resume(state.session.registration().await, query.requested_step());
    Ok(Json(in_progress(&query, &flow, None)))
}

/// Take contact details and issue a login code
pub async fn submit_details(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(payload): Json<DetailsRequest>,
) -> AppResult<Json<LoginResponse>> {
    let payload = payload.trimmed();
    payload.validate()?;

    let (_guard, flow) = begin_step(&state).await?;
    let code = generate_login_code();
    let flow = flow.submit_details(
        ContactDetails {
            name: payload.name,
            phone: payload.phone,
            email: payload.email,
        },
        code.clone(),
        now_ms(),
    )?;

    tracing::info!("Login code issued");
    settle(&state, &query, flow, Some(code)).await
}

/// Issue a fresh code once the cooldown has passed
pub async fn resend_code(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> AppResult<Json<LoginResponse>> {
    let (_guard, flow) = begin_step(&state).await?;
    let code = generate_login_code();
    let flow = flow.resend_code(
        code.clone(),
        now_ms(),
        state.config.login_code_cooldown_secs,
    )?;

    settle(&state, &query, flow, Some(code)).await
}

pub async fn verify_code(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(payload): Json<VerifyCodeRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (_guard, flow) = begin_step(&state).await?;
    let flow = flow.verify_code(&payload.code)?;
    settle(&state, &query, flow, None).await
}

pub async fn choose_role(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(payload): Json<ChooseRoleRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (_guard, flow) = begin_step(&state).await?;
    let flow = flow.choose_role(payload.role)?;
    settle(&state, &query, flow, None).await
}

pub async fn submit_kyc(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(payload): Json<KycRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (_guard, flow) = begin_step(&state).await?;
    let flow = flow.submit_kyc(payload.into())?;
    settle(&state, &query, flow, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_validation() {
        let ok = DetailsRequest {
            name: "Ravi".to_string(),
            phone: "9876543210".to_string(),
            email: "ravi@gmail.com".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = DetailsRequest {
            name: "R".to_string(),
            phone: "98765".to_string(),
            email: "not-an-email".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_step_url_carries_redirect_and_role() {
        let query = LoginQuery {
            step: None,
            redirect: Some("/search?from=A".to_string()),
            role: Some("user".to_string()),
        };
        assert_eq!(
            query.step_url(LoginStep::Verify),
            "/login?step=verify&redirect=%2Fsearch%3Ffrom%3DA&role=user"
        );
        assert_eq!(query.role_hint(), Some(Role::Passenger));
    }

    #[test]
    fn test_kyc_request_drops_blank_names() {
        let docs: KycDocuments = KycRequest {
            license: Some(" dl.pdf ".to_string()),
            rc: Some("".to_string()),
            aadhaar: None,
        }
        .into();
        assert_eq!(docs.license.as_deref(), Some("dl.pdf"));
        assert!(docs.rc.is_none());
        assert!(!docs.is_complete());
    }
}
