// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Input validation for registration.

/// Username rules: at least 5 characters, no spaces, only letters, digits
/// and underscore, and at least one uppercase letter.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.chars().count() < 5 {
        return Err("Username must be at least 5 characters long.".to_string());
    }
    if username.contains(' ') {
        return Err("Username must not contain spaces.".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(
            "Username may only contain letters, numbers, and underscores.".to_string(),
        );
    }
    if !username.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Username must contain at least one uppercase letter.".to_string());
    }
    Ok(())
}

/// Password rules: at least 8 characters with an uppercase letter, a
/// lowercase letter, a digit, and a special character.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number.".to_string());
    }
    if !password
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace())
    {
        return Err("Password must contain at least one special character.".to_string());
    }
    Ok(())
}
