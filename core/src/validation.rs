//! Local, synchronous form predicates. These gate submission client-side;
//! the backend re-validates everything.

const PASSWORD_SPECIALS: &str = "@$!%*?&";
const MIN_PASSWORD_LEN: usize = 8;
const PHONE_DIGITS: usize = 10;

/// Password strength: at least 8 characters, with a lowercase letter, an
/// uppercase letter, a digit, and one of `@$!%*?&`. Characters outside
/// that set reject the whole password.
pub fn is_strong_password(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return false;
    }
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    allowed
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Mobile numbers are exactly ten decimal digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_DIGITS && phone.chars().all(|c| c.is_ascii_digit())
}

/// `local@domain.tld` shape with no whitespace, matching the signup form.
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
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_requires_all_character_classes() {
        assert!(is_strong_password("Abcdef1!"));
        assert!(!is_strong_password("abcdef12"));
        assert!(!is_strong_password("ABCDEF12!"));
        assert!(!is_strong_password("Abcdefg!"));
        assert!(!is_strong_password("Abcdef12"));
    }

    #[test]
    fn strong_password_enforces_minimum_length() {
        assert!(!is_strong_password("Ab1!"));
        assert!(is_strong_password("Ab1!Ab1!"));
    }

    #[test]
    fn strong_password_rejects_foreign_characters() {
        assert!(!is_strong_password("Abcdef1! "));
        assert!(!is_strong_password("Abcdef1#"));
    }

    #[test]
    fn phone_must_be_exactly_ten_digits() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("98765432"));
        assert!(!is_valid_phone("98765432101"));
        assert!(!is_valid_phone("98765432a0"));
    }

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("rider@example.com"));
        assert!(!is_valid_email("rider@example"));
        assert!(!is_valid_email("rider example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("rider@.com"));
    }
}
