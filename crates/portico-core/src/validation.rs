//! Request shapes and input validation.
//!
//! Field rules are declared with `validator` derives; [`validate_input`]
//! runs them and flattens the result into readable [`FieldError`]s before
//! anything reaches the account store.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Tracing target for input validation.
const TRACING_TARGET: &str = "portico_core::validation";

/// Registration input.
#[must_use]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[validate(custom(function = "required"), email)]
    pub email: String,
    #[validate(
        custom(function = "required"),
        length(
            min = 6,
            max = 100,
            message = "The Password field must be between 6 and 100 characters long."
        )
    )]
    pub password: String,
    #[validate(must_match(
        other = "password",
        message = "The Password confirmation and Password fields do not match."
    ))]
    pub password_confirmation: String,
}

impl RegisterRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        password_confirmation: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            password_confirmation: password_confirmation.into(),
        }
    }
}

/// Login input.
#[must_use]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[validate(custom(function = "required"), email)]
    pub email: String,
    #[validate(
        custom(function = "required"),
        length(
            min = 6,
            max = 100,
            message = "The Password field must be between 6 and 100 characters long."
        )
    )]
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the request body.
    pub field: String,
    pub message: String,
}

/// Runs the field rules of `input`.
///
/// Errors are ordered by field name, then by rule declaration order.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), Vec<FieldError>> {
    let Err(errors) = input.validate() else {
        return Ok(());
    };

    let field_errors = flatten(&errors);
    tracing::debug!(
        target: TRACING_TARGET,
        error_count = field_errors.len(),
        "Input validation failed",
    );

    Err(field_errors)
}

fn flatten(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            let field = body_field_name(&field);
            let label = display_name(&field);
            errors.iter().map(move |error| FieldError {
                field: field.clone(),
                message: format_message(&label, error),
            })
        })
        .collect()
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn format_message(label: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "required" => format!("The {label} field is required."),
        "email" => format!("The {label} field is not a valid e-mail address."),
        "length" => {
            let bound = |key: &str| error.params.get(key).and_then(|value| value.as_u64());
            match (bound("min"), bound("max")) {
                (Some(min), Some(max)) => {
                    format!("The {label} field must be between {min} and {max} characters long.")
                }
                (Some(min), None) => format!("The {label} field must be at least {min} characters long."),
                (None, Some(max)) => format!("The {label} field must be at most {max} characters long."),
                (None, None) => format!("The {label} field has an invalid length."),
            }
        }
        "must_match" => format!("The {label} field does not match."),
        code => format!("The {label} field is invalid ({code})."),
    }
}

/// `password_confirmation` becomes `passwordConfirmation`.
fn body_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

/// `passwordConfirmation` becomes `Password confirmation`.
fn display_name(field: &str) -> String {
    let mut label = String::with_capacity(field.len() + 4);
    for (i, c) in field.chars().enumerate() {
        if i == 0 {
            label.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            label.push(' ');
            label.extend(c.to_lowercase());
        } else {
            label.push(c);
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn valid_registration_passes() {
        let request = RegisterRequest::new("a@b.com", "secret1", "secret1");
        assert!(validate_input(&request).is_ok());
    }

    #[test]
    fn mismatched_confirmation_is_reported() {
        let request = RegisterRequest::new("a@b.com", "secret1", "secret2");
        let errors = validate_input(&request).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "passwordConfirmation");
        assert_eq!(
            errors[0].message,
            "The Password confirmation and Password fields do not match."
        );
    }

    #[test]
    fn short_password_is_reported() {
        let request = RegisterRequest::new("a@b.com", "abc", "abc");
        let errors = validate_input(&request).unwrap_err();

        assert_eq!(
            messages(&errors),
            ["The Password field must be between 6 and 100 characters long."]
        );
    }

    #[test]
    fn invalid_email_is_reported() {
        let request = LoginRequest::new("not-an-email", "secret1");
        let errors = validate_input(&request).unwrap_err();

        assert_eq!(errors[0].field, "email");
        assert_eq!(
            errors[0].message,
            "The Email field is not a valid e-mail address."
        );
    }

    #[test]
    fn errors_are_ordered_by_field() {
        let request = RegisterRequest::new("", "abc", "xyz");
        let errors = validate_input(&request).unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        let mut sorted = fields.clone();
        sorted.sort();
        assert_eq!(fields, sorted);
        assert!(messages(&errors).contains(&"The Email field is required."));
        assert!(fields.contains(&"passwordConfirmation"));
    }

    #[test]
    fn missing_fields_deserialize_as_empty() -> anyhow::Result<()> {
        let request: LoginRequest = serde_json::from_str(r#"{"email":"a@b.com"}"#)?;
        let errors = validate_input(&request).unwrap_err();

        assert!(messages(&errors).contains(&"The Password field is required."));
        Ok(())
    }

    #[test]
    fn field_names_follow_request_body() {
        assert_eq!(body_field_name("password_confirmation"), "passwordConfirmation");
        assert_eq!(display_name("passwordConfirmation"), "Password confirmation");
        assert_eq!(display_name("email"), "Email");
    }
}
