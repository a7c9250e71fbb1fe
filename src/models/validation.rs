use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

pub const REQUIRED: &str = "This field is required.";

/// Field-level validation failures keyed by request field name.
///
/// Checks push into this value instead of returning early so a client sees
/// every problem with a payload in one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").is_match(value)
}

#[must_use]
pub fn is_slug(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[-a-zA-Z0-9_]+$").is_match(value)
}

#[must_use]
pub fn is_username(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[\w.@+-]+$").is_match(value)
}

#[must_use]
pub fn is_email(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_match(value)
}

/// Trims a required text field and checks its length in characters.
/// Returns the trimmed value when it passes.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    text(errors, field, value, max_len)
}

/// Same as [`required_text`] for a field that was supplied.
pub fn text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field may not be blank.");
        return None;
    }
    if trimmed.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
        return None;
    }
    Some(trimmed.to_string())
}

/// Checks that `value` fits an `i32` and is at least `min`.
pub fn positive_int(errors: &mut FieldErrors, field: &str, value: i64, min: i32) -> Option<i32> {
    if value < i64::from(min) {
        errors.add(
            field,
            format!("Ensure this value is greater than or equal to {min}."),
        );
        return None;
    }
    match i32::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(
                field,
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#E26C2D"));
        assert!(!is_hex_color("E26C2D"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#GGGGGG"));
        assert!(!is_hex_color("#fff "));
    }

    #[test]
    fn test_slug_and_username() {
        assert!(is_slug("breakfast"));
        assert!(is_slug("late_dinner-2"));
        assert!(!is_slug("two words"));
        assert!(is_username("chef.anna+1@home"));
        assert!(!is_username("chef anna"));
    }

    #[test]
    fn test_email() {
        assert!(is_email("cook@example.com"));
        assert!(!is_email("cook@localhost"));
        assert!(!is_email("no at sign.com"));
    }

    #[test]
    fn test_field_errors_collects_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("tags", "first");
        errors.add("tags", "second");
        errors.add("name", "bad");

        assert_eq!(errors.get("tags").map(<[String]>::len), Some(2));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "tags"]);
        assert_eq!(errors.to_string(), "name: bad; tags: first second");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_required_text() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required_text(&mut errors, "name", Some("  Soup "), 200),
            Some("Soup".to_string())
        );
        assert!(required_text(&mut errors, "name", None, 200).is_none());
        assert!(required_text(&mut errors, "text", Some("   "), 200).is_none());
        assert!(required_text(&mut errors, "slug", Some("abcdef"), 3).is_none());
        assert_eq!(errors.fields().count(), 3);
    }

    #[test]
    fn test_positive_int() {
        let mut errors = FieldErrors::new();
        assert_eq!(positive_int(&mut errors, "amount", 1, 1), Some(1));
        assert!(positive_int(&mut errors, "amount", 0, 1).is_none());
        assert!(positive_int(&mut errors, "amount", i64::from(i32::MAX) + 1, 1).is_none());
        assert_eq!(errors.get("amount").map(<[String]>::len), Some(2));
    }
}
