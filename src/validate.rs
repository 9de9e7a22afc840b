//! Form-input predicates. Pure functions with no I/O; handlers turn a
//! `false` into an `AppError::Validation` message for the form page.

use chrono::NaiveDate;

/// Pragmatic email shape check: a non-empty local part, an '@', and a
/// domain with an interior dot. Deliberately far short of full RFC 5322.
pub fn valid_email(s: &str) -> bool {
    let Some((local, rest)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    let domain = rest.split('@').next().unwrap_or("");
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// At least 8 characters with one uppercase letter and one digit.
pub fn strong_password(s: &str) -> bool {
    s.chars().count() >= 8
        && s.chars().any(char::is_uppercase)
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Exactly 10 digits.
pub fn valid_mobile(s: &str) -> bool {
    s.len() == 10 && s.chars().all(|c| c.is_ascii_digit())
}

/// A sale may be dated today or earlier, never in the future.
pub fn sale_date_ok(d: NaiveDate, today: NaiveDate) -> bool {
    d <= today
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn email_requires_local_at_domain_dot_tld() {
        assert!(valid_email("owner@pharmacy.com"));
        assert!(valid_email("a@b.c"));
        // trailing junk after a valid prefix is tolerated, same as the
        // unanchored pattern this check mirrors
        assert!(valid_email("a@b.c@d"));

        assert!(!valid_email("no-at-sign"));
        assert!(!valid_email("@pharmacy.com"));
        assert!(!valid_email("owner@pharmacy"));
        assert!(!valid_email("owner@.com"));
        assert!(!valid_email("owner@pharmacy."));
        assert!(!valid_email(""));
    }

    #[test]
    fn password_needs_length_uppercase_and_digit() {
        assert!(strong_password("Abcdefg1"));
        assert!(!strong_password("abcdefg1"));
        assert!(!strong_password("ABCDEFG"));
        assert!(!strong_password("Ab1"));
    }

    #[test]
    fn mobile_is_exactly_ten_digits() {
        assert!(valid_mobile("9876543210"));
        assert!(!valid_mobile("98765432"));
        assert!(!valid_mobile("98765432ab"));
        assert!(!valid_mobile("98765432101"));
        assert!(!valid_mobile(""));
    }

    #[test]
    fn sale_date_must_not_be_in_the_future() {
        let today = d("2024-01-01");
        assert!(sale_date_ok(d("2024-01-01"), today));
        assert!(sale_date_ok(d("2023-12-31"), today));
        assert!(!sale_date_ok(d("2024-01-02"), today));
    }
}
