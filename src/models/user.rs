use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entities::users;

/// Lifecycle status of a user, stored as a single-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "I")]
    Inactive,

    #[serde(rename = "A")]
    Active,

    #[serde(rename = "T")]
    Terminated,
}

impl UserStatus {
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::Inactive => "I",
            Self::Active => "A",
            Self::Terminated => "T",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Self::Inactive),
            "A" => Ok(Self::Active),
            "T" => Ok(Self::Terminated),
            other => Err(format!("Unknown user status code: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: i64,

    #[serde(rename = "user_name")]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    #[serde(rename = "user_status")]
    pub status: UserStatus,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub department: Option<String>,
}

impl TryFrom<users::Model> for User {
    type Error = String;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.user_id,
            username: model.user_name,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            status: model.user_status.parse()?,
            department: model.department.filter(|d| !d.is_empty()),
        })
    }
}

/// A user that has not been stored yet. Any `user_id` in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    #[serde(rename = "user_name")]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    #[serde(rename = "user_status")]
    pub status: UserStatus,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub department: Option<String>,
}

impl NewUser {
    #[must_use]
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            status: self.status,
            department: self.department,
        }
    }
}

/// Full overwrite of the mutable fields. Email is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(rename = "user_name")]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    #[serde(rename = "user_status")]
    pub status: UserStatus,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub department: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
