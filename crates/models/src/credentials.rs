use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Login form input, posted to `auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub name: String,
    pub email: String,
}

impl Credentials {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into() }
    }

    /// Both fields are required; the email must look like `local@domain.tld`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Validation("name is required".into()));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ModelError::Validation("email is required".into()));
        }
        if !looks_like_email(email) {
            return Err(ModelError::Validation(format!("'{email}' is not a valid email")));
        }
        Ok(())
    }

    /// Trimmed copy suitable for submission.
    pub fn normalized(&self) -> Self {
        Self { name: self.name.trim().to_string(), email: self.email.trim().to_string() }
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else { return false };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
