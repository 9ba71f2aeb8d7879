//! Input validation helpers
//!
//! Request types derive `validator::Validate`; these helpers turn the
//! resulting errors into a single client-facing message.

use validator::ValidationErrors;

/// Flatten validation errors into `field: message` pairs, sorted by field
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(|err| {
                    let detail = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed {} check", err.code));
                    format!("{}: {}", field, detail)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    parts.sort();
    parts.join(", ")
}

/// Parse a path identifier, rejecting anything that is not a plain integer
pub fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .map_err(|_| format!("Invalid identifier: {}", raw))
}
