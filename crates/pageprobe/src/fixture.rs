//! Test data handed explicitly to every scenario.
//!
//! Credentials and known model ids live in a JSON file and are loaded once
//! per suite into an immutable [`TestData`], shared by reference between
//! concurrently running sessions.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login (email)
    pub email: String,
    /// Password
    pub password: String,
    /// Name the site greets the user with, when the account exists
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Credentials {
    /// Create credentials without a display name
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            display_name: None,
        }
    }

    /// Set the expected display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A make/model pair on the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    /// Make id
    pub make_id: String,
    /// Model id
    pub model_id: String,
}

impl ModelRef {
    /// Path of the model detail page
    #[must_use]
    pub fn path(&self) -> String {
        format!("/model/{}|{}", self.make_id, self.model_id)
    }
}

/// Everything a scenario needs to know about accounts and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestData {
    /// Account that exists on the site
    pub valid: Credentials,
    /// Account that must be rejected
    pub invalid: Credentials,
    /// Extra accounts
    #[serde(default)]
    pub additional: Vec<Credentials>,
    /// Id of the make featured on the landing page
    pub popular_make: String,
    /// Model featured on the landing page
    pub popular_model: ModelRef,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            valid: Credentials::new("testmail@gmail.com", "Test1234!").with_display_name("test"),
            invalid: Credentials::new("usuario_inexistente@test.com", "password_incorrecto"),
            additional: Vec::new(),
            popular_make: "ckl2phsabijs71623vk0".to_string(),
            popular_model: ModelRef {
                make_id: "ckl2phsabijs71623vk0".to_string(),
                model_id: "ckl2phsabijs71623vqg".to_string(),
            },
        }
    }
}

impl TestData {
    /// Load and validate test data from a JSON file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let data: Self = serde_json::from_str(&raw)?;
        data.validate()?;
        Ok(data)
    }

    /// Reject records scenarios cannot use
    pub fn validate(&self) -> ProbeResult<()> {
        for (label, creds) in [("valid", &self.valid), ("invalid", &self.invalid)] {
            if creds.email.trim().is_empty() || creds.password.is_empty() {
                return Err(ProbeError::config(format!(
                    "{label} credentials need an email and a password"
                )));
            }
        }
        if self.valid.email == self.invalid.email {
            return Err(ProbeError::config(
                "valid and invalid credentials use the same email",
            ));
        }
        if self.popular_model.make_id.is_empty() || self.popular_model.model_id.is_empty() {
            return Err(ProbeError::config("popular_model needs make_id and model_id"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_matches_site_accounts() {
        let data = TestData::default();
        assert_eq!(data.valid.display_name.as_deref(), Some("test"));
        assert!(data.validate().is_ok());
        assert_eq!(
            data.popular_model.path(),
            "/model/ckl2phsabijs71623vk0|ckl2phsabijs71623vqg"
        );
    }

    #[test]
    fn test_load_from_file() {
        let file = write_json(
            r#"{
                "valid": {"email": "a@b.c", "password": "pw", "display_name": "a"},
                "invalid": {"email": "x@y.z", "password": "nope"},
                "additional": [{"email": "c@d.e", "password": "pw2"}],
                "popular_make": "mk",
                "popular_model": {"make_id": "mk", "model_id": "md"}
            }"#,
        );
        let data = TestData::load(file.path()).unwrap();
        assert_eq!(data.valid.email, "a@b.c");
        assert!(data.invalid.display_name.is_none());
        assert_eq!(data.additional.len(), 1);
        assert_eq!(data.popular_model.path(), "/model/mk|md");
    }

    #[test]
    fn test_same_email_is_rejected() {
        let mut data = TestData::default();
        data.invalid.email = data.valid.email.clone();
        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("same email"));
    }

    #[test]
    fn test_malformed_json_is_setup_error() {
        let file = write_json("{ not json");
        let err = TestData::load(file.path()).unwrap_err();
        assert_eq!(err.kind(), crate::result::ErrorKind::Setup);
    }
}
