//! Request payloads and their structural validation.
//!
//! Every field is optional at the type level so that a missing field is
//! reported as a `required` issue instead of a body parse failure. Rules
//! validator cannot express (password policy, dates, role names that
//! normalize to nothing) are added through [`Schema::extra_issues`].

use chrono::{DateTime, NaiveDate};
use common::ValidationIssue;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::error::{AccessError, Result};
use crate::role::normalize_role_name;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 1000;

/// A validator-derived input with optional hand-written checks on top.
pub trait Schema: Validate {
    fn extra_issues(&self) -> Vec<ValidationIssue> {
        Vec::new()
    }
}

/// Runs all checks of `input` and collects every failure into one error.
pub fn validate_input<T: Schema>(input: &T) -> Result<()> {
    let mut issues = match input.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => issues_from_errors(&errors),
    };
    issues.extend(input.extra_issues());

    if issues.is_empty() {
        Ok(())
    } else {
        issues.sort_by(|a, b| a.path.cmp(&b.path));
        Err(AccessError::Validation(issues))
    }
}

/// Flattens validator output into issues sorted by field.
pub fn issues_from_errors(errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues: Vec<ValidationIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |error| ValidationIssue {
                path: vec![field.clone()],
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
                code: error.code.to_string(),
            })
        })
        .collect();
    issues.sort_by(|a, b| a.path.cmp(&b.path));
    issues
}

fn issue(field: &str, code: &str, message: &str) -> ValidationIssue {
    ValidationIssue {
        path: vec![field.to_string()],
        message: message.to_string(),
        code: code.to_string(),
    }
}

/// Unwraps a field that validation has already proven present.
pub fn take_required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        AccessError::Validation(vec![issue(
            field,
            "required",
            &format!("{} is required", field),
        )])
    })
}

/// Password policy: length, upper case, lower case and digit. Every violated
/// rule produces its own issue.
pub fn password_issues(field: &str, password: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        issues.push(issue(
            field,
            "length",
            "Password must be at least 8 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push(issue(
            field,
            "uppercase",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push(issue(
            field,
            "lowercase",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push(issue(
            field,
            "digit",
            "Password must contain at least one number",
        ));
    }
    issues
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Treats `""` the same as an absent value.
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

fn role_name_issues(role_name: Option<&str>) -> Vec<ValidationIssue> {
    match role_name {
        Some(name) if !name.is_empty() && normalize_role_name(name).is_empty() => vec![issue(
            "role_name",
            "blank",
            "Role name must contain at least one non-whitespace character",
        )],
        _ => Vec::new(),
    }
}

// ===================== Roles =====================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRoleInput {
    #[validate(
        required(message = "Role name is required"),
        length(min = 1, max = 50, message = "Role name must be between 1 and 50 characters")
    )]
    pub role_name: Option<String>,
    pub description: Option<String>,
    /// Defaults to active
    pub status: Option<bool>,
}

impl Schema for CreateRoleInput {
    fn extra_issues(&self) -> Vec<ValidationIssue> {
        role_name_issues(self.role_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleInput {
    #[validate(length(min = 1, max = 50, message = "Role name must be between 1 and 50 characters"))]
    pub role_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<bool>,
}

impl Schema for UpdateRoleInput {
    fn extra_issues(&self) -> Vec<ValidationIssue> {
        role_name_issues(self.role_name.as_deref())
    }
}

// ===================== Users =====================

#[derive(Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserInput {
    #[validate(
        required(message = "Username is required"),
        length(min = 3, message = "Username must be at least 3 characters")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,
    #[validate(required(message = "Password is required"))]
    pub password: Option<String>,
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
    #[validate(
        required(message = "Role ID is required"),
        range(min = 1, message = "Role ID must be a positive number")
    )]
    pub role_id: Option<i32>,
}

impl Schema for CreateUserInput {
    fn extra_issues(&self) -> Vec<ValidationIssue> {
        self.password
            .as_deref()
            .map(|p| password_issues("password", p))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for CreateUserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserInput")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserInput {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
    #[validate(range(min = 1, message = "Role ID must be a positive number"))]
    pub role_id: Option<i32>,
    pub status: Option<bool>,
}

impl Schema for UpdateUserInput {
    fn extra_issues(&self) -> Vec<ValidationIssue> {
        self.password
            .as_deref()
            .map(|p| password_issues("password", p))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for UpdateUserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserInput")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("role_id", &self.role_id)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserStatusInput {
    #[validate(required(message = "Status is required"))]
    pub status: Option<bool>,
}

impl Schema for UpdateUserStatusInput {}

/// Query parameters of the user listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Include soft-deleted users (default false)
    pub include_deleted: Option<bool>,
    /// 1-based page number (default 1)
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u64>,
    /// Page size, 1 to 1000 (default 50)
    #[validate(range(min = 1, max = 1000, message = "Limit must be between 1 and 1000"))]
    pub limit: Option<u64>,
}

impl Schema for UserListQuery {}

impl UserListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

// ===================== Auth & signup =====================

/// Login credentials. `username` may also hold the email address.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct SignupInput {
    #[validate(
        required(message = "Full name is required"),
        length(min = 2, message = "Full name must be at least 2 characters")
    )]
    pub full_name: Option<String>,
    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Address is required"),
        length(min = 1, message = "Address is required")
    )]
    pub address: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339
    #[validate(required(message = "Date of birth is required"))]
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,
}

impl Schema for SignupInput {
    fn extra_issues(&self) -> Vec<ValidationIssue> {
        match self.date_of_birth.as_deref() {
            Some(value) if parse_date(value).is_none() => vec![issue(
                "date_of_birth",
                "date",
                "Date of birth must be a valid date",
            )],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes_for(err: AccessError, field: &str) -> Vec<String> {
        match err {
            AccessError::Validation(issues) => issues
                .into_iter()
                .filter(|i| i.path == [field])
                .map(|i| i.code)
                .collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn valid_user() -> CreateUserInput {
        CreateUserInput {
            username: Some("jdoe".into()),
            email: Some("jdoe@example.com".into()),
            password: Some("Passw0rdX".into()),
            full_name: None,
            avatar_url: None,
            role_id: Some(3),
        }
    }

    #[test]
    fn every_violated_password_rule_is_reported() {
        assert!(password_issues("password", "Passw0rdX").is_empty());

        let codes: Vec<String> = password_issues("password", "password")
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(codes, vec!["uppercase", "digit"]);

        let codes: Vec<String> = password_issues("password", "Ab1")
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(codes, vec!["length"]);
    }

    #[test]
    fn password_policy_examples() {
        let cases: [(&str, &[&str]); 5] = [
            ("short1A", &["length"]),
            ("alllowercase1", &["uppercase"]),
            ("ALLUPPERCASE1", &["lowercase"]),
            ("NoDigitsHere", &["digit"]),
            ("GoodPass1", &[]),
        ];
        for (password, expected) in cases {
            let codes: Vec<String> = password_issues("password", password)
                .into_iter()
                .map(|i| i.code)
                .collect();
            assert_eq!(codes, expected, "unexpected issues for {password}");
        }
    }

    #[test]
    fn valid_user_passes() {
        assert!(validate_input(&valid_user()).is_ok());
    }

    #[test]
    fn missing_fields_are_required_issues() {
        let err = validate_input(&CreateUserInput::default()).unwrap_err();
        let AccessError::Validation(issues) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = issues.iter().map(|i| i.path[0].as_str()).collect();
        assert_eq!(fields, vec!["email", "password", "role_id", "username"]);
        assert!(issues.iter().all(|i| i.code == "required"));
    }

    #[test]
    fn short_username_and_bad_email_are_reported_together() {
        let input = CreateUserInput {
            username: Some("ab".into()),
            email: Some("not-an-email".into()),
            ..valid_user()
        };
        let err = validate_input(&input).unwrap_err();
        let AccessError::Validation(issues) = err else {
            panic!("expected validation error");
        };
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, ["email"]);
        assert_eq!(issues[1].message, "Username must be at least 3 characters");
    }

    #[test]
    fn weak_password_lists_every_rule() {
        let input = CreateUserInput {
            password: Some("abc".into()),
            ..valid_user()
        };
        let codes = codes_for(validate_input(&input).unwrap_err(), "password");
        assert_eq!(codes, vec!["length", "uppercase", "digit"]);
    }

    #[test]
    fn empty_avatar_is_treated_as_absent() {
        let input: CreateUserInput = serde_json::from_value(json!({
            "username": "jdoe",
            "email": "jdoe@example.com",
            "password": "Passw0rdX",
            "role_id": 3,
            "avatar_url": ""
        }))
        .unwrap();
        assert_eq!(input.avatar_url, None);
        assert!(validate_input(&input).is_ok());

        let input = CreateUserInput {
            avatar_url: Some("not a url".into()),
            ..valid_user()
        };
        assert_eq!(
            codes_for(validate_input(&input).unwrap_err(), "avatar_url"),
            vec!["url"]
        );
    }

    #[test]
    fn update_accepts_empty_payload() {
        assert!(validate_input(&UpdateUserInput::default()).is_ok());

        let input = UpdateUserInput {
            role_id: Some(0),
            ..Default::default()
        };
        assert_eq!(
            codes_for(validate_input(&input).unwrap_err(), "role_id"),
            vec!["range"]
        );
    }

    #[test]
    fn role_name_bounds() {
        let too_long = CreateRoleInput {
            role_name: Some("x".repeat(51)),
            ..Default::default()
        };
        assert_eq!(
            codes_for(validate_input(&too_long).unwrap_err(), "role_name"),
            vec!["length"]
        );

        let blank = CreateRoleInput {
            role_name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            codes_for(validate_input(&blank).unwrap_err(), "role_name"),
            vec!["blank"]
        );

        let missing = CreateRoleInput::default();
        assert_eq!(
            codes_for(validate_input(&missing).unwrap_err(), "role_name"),
            vec!["required"]
        );
    }

    #[test]
    fn status_is_required_for_status_update() {
        let err = validate_input(&UpdateUserStatusInput::default()).unwrap_err();
        assert_eq!(codes_for(err, "status"), vec!["required"]);
    }

    #[test]
    fn signup_dates() {
        assert_eq!(parse_date("2001-04-12"), NaiveDate::from_ymd_opt(2001, 4, 12));
        assert_eq!(
            parse_date("2001-04-12T00:00:00Z"),
            NaiveDate::from_ymd_opt(2001, 4, 12)
        );
        assert_eq!(parse_date("12/04/2001"), None);

        let input = SignupInput {
            full_name: Some("Dana Learner".into()),
            email: Some("dana@example.com".into()),
            address: Some("1 Campus Road".into()),
            date_of_birth: Some("yesterday".into()),
            avatar: None,
        };
        assert_eq!(
            codes_for(validate_input(&input).unwrap_err(), "date_of_birth"),
            vec!["date"]
        );
    }

    #[test]
    fn list_query_defaults_and_bounds() {
        let query = UserListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);

        let query = UserListQuery {
            limit: Some(5000),
            ..Default::default()
        };
        assert!(validate_input(&query).is_err());
    }
}
