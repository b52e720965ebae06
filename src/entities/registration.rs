use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::auth::{AuthRecord, KycDocuments, Role};

/// Step names carried in the `step` query parameter of `/login`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginStep {
    Details,
    Verify,
    Role,
    Kyc,
}

impl LoginStep {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginStep::Details => "details",
            LoginStep::Verify => "verify",
            LoginStep::Role => "role",
            LoginStep::Kyc => "kyc",
        }
    }
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginStep {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "details" => Ok(LoginStep::Details),
            "verify" | "otp" => Ok(LoginStep::Verify),
            "role" => Ok(LoginStep::Role),
            "kyc" => Ok(LoginStep::Kyc),
            _ => Err(()),
        }
    }
}

/// Contact details entered on the first login step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// In-progress registration, stored under `ridelink:registration` until
/// the account is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub phone: String,
    pub email: String,
    /// 6-digit login code issued for `phone`
    pub code: String,
    /// Unix epoch milliseconds
    pub code_sent_at: i64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Registration {
    fn into_auth(self, role: Role, docs: Option<KycDocuments>) -> AuthRecord {
        AuthRecord {
            role,
            name: self.name,
            phone: self.phone,
            email: self.email,
            docs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Invalid OTP")]
    IncorrectCode,
    #[error("Resend in {seconds}s")]
    ResendTooSoon { seconds: i64 },
    #[error("Please upload Licence, RC and Aadhaar")]
    MissingDocuments,
    #[error("Cannot {action} at the {step} step")]
    OutOfOrder {
        step: &'static str,
        action: &'static str,
    },
}

/// Login and registration as an explicit state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginFlow {
    Details,
    Verify(Registration),
    ChooseRole(Registration),
    Kyc(Registration),
    Complete(AuthRecord),
}

impl LoginFlow {
    /// Rebuild the flow from the stored draft. A requested step is honoured
    /// only when it goes backwards; otherwise the furthest reachable state wins.
    pub fn resume(draft: Option<Registration>, requested: Option<LoginStep>) -> Self {
        let furthest = match draft {
            None => LoginFlow::Details,
            Some(d) if !d.verified => LoginFlow::Verify(d),
            Some(d) if d.role == Some(Role::Rider) => LoginFlow::Kyc(d),
            Some(d) => LoginFlow::ChooseRole(d),
        };

        match (requested, furthest) {
            (Some(LoginStep::Details), _) => LoginFlow::Details,
            (Some(LoginStep::Role), LoginFlow::Kyc(d)) => LoginFlow::ChooseRole(d),
            (_, state) => state,
        }
    }

    pub fn step(&self) -> Option<LoginStep> {
        match self {
            LoginFlow::Details => Some(LoginStep::Details),
            LoginFlow::Verify(_) => Some(LoginStep::Verify),
            LoginFlow::ChooseRole(_) => Some(LoginStep::Role),
            LoginFlow::Kyc(_) => Some(LoginStep::Kyc),
            LoginFlow::Complete(_) => None,
        }
    }

    pub fn draft(&self) -> Option<&Registration> {
        match self {
            LoginFlow::Verify(d) | LoginFlow::ChooseRole(d) | LoginFlow::Kyc(d) => Some(d),
            LoginFlow::Details | LoginFlow::Complete(_) => None,
        }
    }

    fn out_of_order(&self, action: &'static str) -> LoginError {
        LoginError::OutOfOrder {
            step: self.step().map(LoginStep::as_str).unwrap_or("complete"),
            action,
        }
    }

    /// Start (or restart) registration with fresh details and a new code
    pub fn submit_details(
        self,
        details: ContactDetails,
        code: String,
        now_ms: i64,
    ) -> Result<LoginFlow, LoginError> {
        if let LoginFlow::Complete(_) = self {
            return Err(self.out_of_order("submit details"));
        }

        Ok(LoginFlow::Verify(Registration {
            name: details.name,
            phone: details.phone,
            email: details.email,
            code,
            code_sent_at: now_ms,
            verified: false,
            role: None,
        }))
    }

    pub fn resend_code(
        self,
        code: String,
        now_ms: i64,
        cooldown_secs: i64,
    ) -> Result<LoginFlow, LoginError> {
        match self {
            LoginFlow::Verify(mut draft) => {
                let ready_at = draft.code_sent_at + cooldown_secs * 1000;
                if now_ms < ready_at {
                    // round up so the caller never sees "0s" while still blocked
                    let seconds = (ready_at - now_ms + 999) / 1000;
                    return Err(LoginError::ResendTooSoon { seconds });
                }
                draft.code = code;
                draft.code_sent_at = now_ms;
                Ok(LoginFlow::Verify(draft))
            }
            other => Err(other.out_of_order("resend a code")),
        }
    }

    pub fn verify_code(self, submitted: &str) -> Result<LoginFlow, LoginError> {
        match self {
            LoginFlow::Verify(mut draft) => {
                if submitted != draft.code {
                    return Err(LoginError::IncorrectCode);
                }
                draft.verified = true;
                Ok(LoginFlow::ChooseRole(draft))
            }
            other => Err(other.out_of_order("verify a code")),
        }
    }

    pub fn choose_role(self, role: Role) -> Result<LoginFlow, LoginError> {
        match self {
            LoginFlow::ChooseRole(mut draft) | LoginFlow::Kyc(mut draft) => match role {
                Role::Passenger => Ok(LoginFlow::Complete(draft.into_auth(Role::Passenger, None))),
                Role::Rider => {
                    draft.role = Some(Role::Rider);
                    Ok(LoginFlow::Kyc(draft))
                }
            },
            other => Err(other.out_of_order("choose a role")),
        }
    }

    pub fn submit_kyc(self, docs: KycDocuments) -> Result<LoginFlow, LoginError> {
        match self {
            LoginFlow::Kyc(draft) => {
                if !docs.is_complete() {
                    return Err(LoginError::MissingDocuments);
                }
                Ok(LoginFlow::Complete(draft.into_auth(Role::Rider, Some(docs))))
            }
            other => Err(other.out_of_order("submit documents")),
        }
    }
}

/// Post-login destination. Only same-site paths are allowed and `/login`
/// itself is never a target.
pub fn safe_redirect(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/login") =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
