use serde::{Deserialize, Serialize};

use super::recipe::RecipeSummary;
use super::validation::{self, FieldErrors, REQUIRED};
use crate::constants::limits;
use crate::entities::users;

/// The user a request was authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub username: String,
}

impl From<users::Model> for AuthUser {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
        }
    }
}

/// Who is looking at a resource. Per-viewer flags are always false for
/// anonymous requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(AuthUser),
}

impl Viewer {
    #[must_use]
    pub const fn id(&self) -> Option<i32> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user.id),
        }
    }

    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserProfile {
    #[must_use]
    pub fn from_model(model: users::Model, is_subscribed: bool) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            is_subscribed,
        }
    }
}

/// A followed author with a preview of their newest recipes.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub author: UserProfile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl RegistrationInput {
    pub fn validate(self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = validation::required_text(
            &mut errors,
            "email",
            self.email.as_deref(),
            limits::MAX_EMAIL_LENGTH,
        )
        .filter(|email| {
            let ok = validation::is_email(email);
            if !ok {
                errors.add("email", "Enter a valid email address.");
            }
            ok
        });

        let username = validation::required_text(
            &mut errors,
            "username",
            self.username.as_deref(),
            limits::MAX_USERNAME_LENGTH,
        )
        .filter(|username| {
            let ok = validation::is_username(username);
            if !ok {
                errors.add(
                    "username",
                    "Letters, digits and @/./+/-/_ characters only.",
                );
            }
            ok
        });

        let first_name = validation::required_text(
            &mut errors,
            "first_name",
            self.first_name.as_deref(),
            limits::MAX_PERSON_NAME_LENGTH,
        );
        let last_name = validation::required_text(
            &mut errors,
            "last_name",
            self.last_name.as_deref(),
            limits::MAX_PERSON_NAME_LENGTH,
        );
        let password = check_password(&mut errors, "password", self.password);

        match (email, username, first_name, last_name, password) {
            (Some(email), Some(username), Some(first_name), Some(last_name), Some(password))
                if errors.is_empty() =>
            {
                Ok(NewUser {
                    email: email.to_lowercase(),
                    username,
                    first_name,
                    last_name,
                    password,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetPasswordInput {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl SetPasswordInput {
    /// Returns `(current, new)` when both are present and the new one is
    /// acceptable. The current password is checked against the store later.
    pub fn validate(self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        let current = self.current_password.filter(|p| !p.is_empty());
        if current.is_none() {
            errors.add("current_password", REQUIRED);
        }
        let new = check_password(&mut errors, "new_password", self.new_password);

        match (current, new) {
            (Some(current), Some(new)) if errors.is_empty() => Ok((current, new)),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginInput {
    pub fn validate(self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        if email.is_none() {
            errors.add("email", REQUIRED);
        }
        let password = self.password.filter(|p| !p.is_empty());
        if password.is_none() {
            errors.add("password", REQUIRED);
        }

        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(errors),
        }
    }
}

/// Password rules shared by registration and password change. The value is
/// not trimmed.
pub fn check_password(
    errors: &mut FieldErrors,
    field: &str,
    password: Option<String>,
) -> Option<String> {
    let Some(password) = password else {
        errors.add(field, REQUIRED);
        return None;
    };
    let len = password.chars().count();
    if len < limits::MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!(
                "Ensure this field has at least {} characters.",
                limits::MIN_PASSWORD_LENGTH
            ),
        );
        return None;
    }
    if len > limits::MAX_PASSWORD_LENGTH {
        errors.add(
            field,
            format!(
                "Ensure this field has no more than {} characters.",
                limits::MAX_PASSWORD_LENGTH
            ),
        );
        return None;
    }
    Some(password)
}
