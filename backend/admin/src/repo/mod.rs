//! Queries, grouped per table.
//!
//! Functions take the pool (or an open transaction when several writes must
//! land together) and return [`crate::errors::Result`].

pub mod payment_methods;
pub mod purchases;
pub mod raffles;
pub mod referral_links;
pub mod settings;
pub mod tickets;
pub mod users;

/// Trim an optional text field, mapping blanks to `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim a required text field, failing when blank.
pub(crate) fn required(value: &str, field: &str) -> crate::errors::Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(crate::errors::AdminError::Validation(format!(
            "{field} is required"
        )));
    }
    Ok(value.to_string())
}
