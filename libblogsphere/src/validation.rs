//! Client-side field validation
//!
//! Two layers live here:
//!
//! - a generic rule engine ([`Rule`], [`RuleSet`]) evaluated against every
//!   named field of a form, used for the login form
//! - the fixed, ordered checks of the registration and post forms, where the
//!   first failing check decides the message shown to the user
//!
//! Everything in this module is pure; marking fields and showing messages is
//! the job of [`crate::ui::Ui`] and the form controller.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("hardcoded email regex is invalid")
});

static USERNAME_CHARS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]+$").expect("hardcoded username regex is invalid")
});

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const POST_CONTENT_MIN_CHARS: usize = 10;

/// Constraint on a single form field
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Check an already-trimmed value
    ///
    /// A length bound applies even to an empty optional field; a pattern is
    /// only tested against non-empty values.
    pub fn check(&self, value: &str) -> bool {
        let len = value.chars().count();

        if self.required && value.is_empty() {
            return false;
        }
        if self.min_length.is_some_and(|min| len < min) {
            return false;
        }
        if self.max_length.is_some_and(|max| len > max) {
            return false;
        }
        if let Some(pattern) = &self.pattern {
            if !value.is_empty() && !pattern.is_match(value) {
                return false;
            }
        }
        true
    }
}

/// Ordered field-name → rule mapping, built per form at submit time
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<(String, Rule)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, rule: Rule) -> Self {
        self.rules.push((name.to_string(), rule));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of every field whose trimmed value fails its rule
    ///
    /// All fields are evaluated; `lookup` returns `None` for a field missing
    /// from the form, which is skipped.
    pub fn failing_fields<F>(&self, mut lookup: F) -> Vec<&str>
    where
        F: FnMut(&str) -> Option<String>,
    {
        self.iter()
            .filter(|(name, rule)| match lookup(name) {
                Some(value) => !rule.check(value.trim()),
                None => false,
            })
            .map(|(name, _)| name)
            .collect()
    }
}

/// Rules for the login form
pub fn login_rules() -> RuleSet {
    RuleSet::new()
        .field("username", Rule::new().required().min_length(USERNAME_MIN_CHARS))
        .field("password", Rule::new().required().min_length(1))
}

pub const LOGIN_FAILED_MESSAGE: &str = "Please fill in all required fields correctly.";

/// A blocking validation failure: the field to mark and the message to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Element id of the offending field
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Only letters, numbers and underscores
pub fn has_valid_username_chars(username: &str) -> bool {
    USERNAME_CHARS_REGEX.is_match(username)
}

/// Raw (untrimmed) registration form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Registration checks, first failure wins
pub fn validate_registration(form: &Registration) -> Result<(), FieldError> {
    let username_len = form.username.chars().count();

    if form.password != form.confirm_password {
        return Err(FieldError::new("confirm-password", "Passwords do not match!"));
    }
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_len) {
        return Err(FieldError::new(
            "username",
            "Username must be between 3 and 20 characters!",
        ));
    }
    if !is_valid_email(&form.email) {
        return Err(FieldError::new("email", "Please enter a valid email address!"));
    }
    if form.password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(FieldError::new(
            "password",
            "Password must be at least 6 characters long!",
        ));
    }
    if !has_valid_username_chars(&form.username) {
        return Err(FieldError::new(
            "username",
            "Username contains invalid characters. Use only letters, numbers, and underscores.",
        ));
    }
    Ok(())
}

/// Post create/edit checks on trimmed values, first failure wins
pub fn validate_post(title: &str, content: &str, title_max: usize) -> Result<(), FieldError> {
    let title = title.trim();
    let content = content.trim();

    if title.is_empty() {
        return Err(FieldError::new("title", "Please enter a title for your post."));
    }
    if content.is_empty() {
        return Err(FieldError::new("content", "Please enter content for your post."));
    }
    if title.chars().count() > title_max {
        return Err(FieldError::new(
            "title",
            format!("Title must be {} characters or less.", title_max),
        ));
    }
    if content.chars().count() < POST_CONTENT_MIN_CHARS {
        return Err(FieldError::new(
            "content",
            "Post content should be at least 10 characters long.",
        ));
    }
    Ok(())
}

/// Inline message for the username field while typing, if any
pub fn username_feedback(username: &str) -> Option<&'static str> {
    let len = username.chars().count();
    if len > 0 && len < USERNAME_MIN_CHARS {
        Some("Username must be at least 3 characters")
    } else if len > USERNAME_MAX_CHARS {
        Some("Username must be less than 20 characters")
    } else if len > 0 && !has_valid_username_chars(username) {
        Some("Username can only contain letters, numbers, and underscores")
    } else {
        None
    }
}

/// Inline message for the confirmation field while typing, if any
pub fn confirm_password_feedback(password: &str, confirm: &str) -> Option<&'static str> {
    if !confirm.is_empty() && password != confirm {
        Some("Passwords do not match")
    } else {
        None
    }
}

/// Whether a counted field is over its limit
pub fn exceeds_limit(len: usize, max: Option<usize>) -> bool {
    max.is_some_and(|max| len > max)
}
