//! Client-side form checks, run before anything is sent to the backend.

use std::collections::BTreeMap;

use crate::types::EntityId;

/// Per-field error messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Records the first failure of `check` for `field`.
    pub fn check(&mut self, field: &'static str, check: Result<(), String>) {
        if let Err(message) = check {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok` when nothing failed, so submission may proceed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Discount percentage must lie in `0..=100`.
///
/// # Errors
///
/// Returns the inline message for out-of-range or non-finite values.
pub fn discount_percent(value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err("Discount must be between 0 and 100".into())
    }
}

/// A selector-backed field must hold a selection.
///
/// # Errors
///
/// Returns the inline message naming `what` when nothing is selected.
pub fn required_selection(selected: Option<&EntityId>, what: &str) -> Result<(), String> {
    match selected {
        Some(_) => Ok(()),
        None => Err(format!("Select a {what}")),
    }
}

/// Quantity must be strictly positive.
///
/// # Errors
///
/// Returns the inline message for zero, negative or non-finite values.
pub fn positive_quantity(value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err("Quantity must be greater than 0".into())
    }
}
