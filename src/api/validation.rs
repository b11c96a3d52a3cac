use super::{ApiError, SearchUsernameRequest};
use crate::models::{NewUser, UserPatch};

pub fn parse_user_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request("Invalid ID"))
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ApiError> {
    require("user_name", &user.username)?;
    require("first_name", &user.first_name)?;
    require("last_name", &user.last_name)?;
    require("email", &user.email)?;

    if !user.email.contains('@') {
        return Err(ApiError::bad_request(format!(
            "Invalid email address: {}",
            user.email
        )));
    }

    Ok(())
}

pub fn validate_patch(patch: &UserPatch) -> Result<(), ApiError> {
    require("user_name", &patch.username)?;
    require("first_name", &patch.first_name)?;
    require("last_name", &patch.last_name)
}

pub fn validate_search(request: &SearchUsernameRequest) -> Result<(), ApiError> {
    require("username", &request.username)?;
    require("first_name", &request.first_name)?;
    require("last_name", &request.last_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "jdoe".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            status: UserStatus::Active,
            department: None,
        }
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("12").unwrap(), 12);
        assert!(parse_user_id("abc").is_err());
        assert!(parse_user_id("").is_err());
        assert!(parse_user_id("1.5").is_err());
    }

    #[test]
    fn test_validate_new_user() {
        assert!(validate_new_user(&new_user("john@example.com")).is_ok());
        assert!(validate_new_user(&new_user("not-an-email")).is_err());
        assert!(validate_new_user(&new_user("  ")).is_err());

        let mut blank_name = new_user("john@example.com");
        blank_name.username = " ".to_string();
        assert!(validate_new_user(&blank_name).is_err());
    }

    #[test]
    fn test_validate_search() {
        let request = SearchUsernameRequest {
            username: "jdoe".to_string(),
            first_name: "John".to_string(),
            last_name: String::new(),
        };
        assert!(validate_search(&request).is_err());
    }
}
