use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ApiError, FieldError};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Collects every failed rule for a payload so the client sees all of them at once.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &'static str, value: &str, msg: &'static str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(FieldError { field, msg });
        }
        self
    }

    pub fn min_len(
        &mut self,
        field: &'static str,
        value: &str,
        min: usize,
        msg: &'static str,
    ) -> &mut Self {
        if value.trim().chars().count() < min {
            self.errors.push(FieldError { field, msg });
        }
        self
    }

    pub fn email(&mut self, field: &'static str, value: &str, msg: &'static str) -> &mut Self {
        if !is_valid_email(value.trim()) {
            self.errors.push(FieldError { field, msg });
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
