use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Stored as `passenger`; `user` is accepted for records written by older clients
    #[serde(alias = "user")]
    Passenger,
    Rider,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Passenger => "passenger",
            Role::Rider => "rider",
        }
    }
}

/// Document file names captured during rider KYC
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycDocuments {
    /// Driving licence
    pub license: Option<String>,
    /// Vehicle registration certificate
    pub rc: Option<String>,
    /// Identity document
    pub aadhaar: Option<String>,
}

impl KycDocuments {
    pub fn is_complete(&self) -> bool {
        [&self.license, &self.rc, &self.aadhaar]
            .iter()
            .all(|doc| doc.as_deref().is_some_and(|name| !name.trim().is_empty()))
    }
}

/// Signed-in identity, stored under `ridelink:auth`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    pub role: Role,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<KycDocuments>,
}

impl AuthRecord {
    pub fn kyc_complete(&self) -> bool {
        self.docs.as_ref().is_some_and(KycDocuments::is_complete)
    }

    /// Riders may only offer seats once their documents are on file
    pub fn can_offer_rides(&self) -> bool {
        self.role == Role::Rider && self.kyc_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> KycDocuments {
        KycDocuments {
            license: Some("licence.pdf".to_string()),
            rc: Some("rc.jpg".to_string()),
            aadhaar: Some("aadhaar.png".to_string()),
        }
    }

    #[test]
    fn test_auth_round_trip() {
        let auth = AuthRecord {
            role: Role::Rider,
            name: "Priya".to_string(),
            phone: "9876543210".to_string(),
            email: "priya@gmail.com".to_string(),
            docs: Some(docs()),
        };

        let raw = serde_json::to_string(&auth).unwrap();
        let back: AuthRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, auth);
    }

    #[test]
    fn test_legacy_user_role_is_passenger() {
        let raw = r#"{"role":"user","name":"A","phone":"1234567890","email":"a@b.co"}"#;
        let auth: AuthRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(auth.role, Role::Passenger);
        assert!(auth.docs.is_none());
        assert!(serde_json::to_string(&auth).unwrap().contains(r#""role":"passenger""#));
    }

    #[test]
    fn test_kyc_requires_all_documents() {
        assert!(docs().is_complete());

        let mut partial = docs();
        partial.rc = None;
        assert!(!partial.is_complete());

        let mut blank = docs();
        blank.aadhaar = Some("  ".to_string());
        assert!(!blank.is_complete());
    }

    #[test]
    fn test_passenger_cannot_offer_rides() {
        let auth = AuthRecord {
            role: Role::Passenger,
            name: "A".to_string(),
            phone: "1234567890".to_string(),
            email: "a@b.co".to_string(),
            docs: Some(docs()),
        };
        assert!(!auth.can_offer_rides());
    }
}
