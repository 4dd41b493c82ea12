use std::collections::HashMap;

use validator::{Validate, ValidateUrl, ValidationErrors};

use crate::config::ValidationConfig;

use super::ServiceError;

/// Per-field messages collected before a write; empty means valid.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the derive-based checks of `input` and keep the first message per field.
    pub fn check<T: Validate>(input: &T) -> Self {
        let mut errors = Self::new();
        if let Err(e) = input.validate() {
            errors.absorb(e);
        }
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    fn absorb(&mut self, errors: ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            if let Some(first) = field_errors.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", first.code));
                self.add(&field, message);
            }
        }
    }

    /// Login tells emails from usernames by the '@'.
    pub fn username(&mut self, username: &str) {
        if username.contains('@') {
            self.add("username", "Username may not contain '@'");
        }
    }

    pub fn password(&mut self, password: &str, rules: &ValidationConfig) {
        if password.chars().count() < rules.min_password_length {
            self.add(
                "password",
                format!("Password must be at least {} characters", rules.min_password_length),
            );
        }
    }

    pub fn description(&mut self, description: &str, rules: &ValidationConfig) {
        if description.trim().chars().count() < rules.min_description_length {
            self.add(
                "description",
                format!("Description must be at least {} characters", rules.min_description_length),
            );
        }
    }

    pub fn github_link(&mut self, link: &str, rules: &ValidationConfig) {
        if !link.starts_with(&rules.github_prefix) || link.len() == rules.github_prefix.len() {
            self.add(
                "github_link",
                format!("GitHub link must start with {}", rules.github_prefix),
            );
        }
    }

    pub fn url(&mut self, field: &str, value: &str) {
        if !value.validate_url() {
            self.add(field, format!("{} must be a valid URL", field));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.0))
        }
    }
}

/// Treat an empty string as "clear this optional field".
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
