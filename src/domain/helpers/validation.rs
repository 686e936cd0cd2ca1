use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

/// Checks the `local@domain.tld` shape: no whitespace, a single `@`, a non-empty local part and a
/// domain with a dot somewhere strictly inside it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// True for the hyphenated 8-4-4-4-12 hex form used by the catalog store for row ids.
pub fn is_store_id(id: &str) -> bool {
    let groups: Vec<&str> = id.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

//------------------------ Field rules ---------------------------

/// Required text. Whitespace alone does not count.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Required, and in the `local@domain.tld` shape.
pub fn email_address(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if !is_valid_email(value) {
        return Err(ValidationError::new("email"));
    }
    Ok(())
}

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::new("required"));
    }
    if value.is_sign_negative() {
        return Err(ValidationError::new("range"));
    }
    Ok(())
}

/// True when any field failed with `code`.
pub fn has_code(errors: &ValidationErrors, code: &str) -> bool {
    errors.field_errors().values().flat_map(|errs| errs.iter()).any(|e| e.code == code)
}

/// The message of the first failed rule, falling back to the rendered errors. Fields are visited
/// in name order.
pub fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
