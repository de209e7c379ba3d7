use crate::api::errors::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
pub(crate) const MAX_USERNAME_LEN: usize = 32;

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    let len_ok = (3..=MAX_USERNAME_LEN).contains(&username.chars().count());
    let chars_ok =
        username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let starts_ok = username.chars().next().is_some_and(|c| c.is_ascii_alphabetic());

    if len_ok && chars_ok && starts_ok {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Username must be 3-32 characters, start with a letter, and contain only \
             letters, digits, '_' or '-'"
                .to_string(),
        ))
    }
}

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

/// Submitted code must be non-empty after trimming and fit the size cap.
pub(crate) fn validate_code(code: &str, max_bytes: usize) -> Result<(), ApiError> {
    if code.trim().is_empty() {
        return Err(ApiError::BadRequest("Submitted code must not be empty".to_string()));
    }
    if code.len() > max_bytes {
        return Err(ApiError::BadRequest(format!(
            "Submitted code exceeds the {max_bytes} byte limit"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a_b-c9").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("9starts-with-digit").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn password_length_counts_chars_not_bytes() {
        assert!(validate_password_len("пароль12").is_ok());
        assert!(validate_password_len("short").is_err());
    }

    #[test]
    fn code_rules() {
        assert!(validate_code("print(1)", 1024).is_ok());
        assert!(validate_code("   \n\t", 1024).is_err());
        assert!(validate_code(&"x".repeat(2000), 1024).is_err());
    }
}
