use serde::{Deserialize, Serialize};

use crate::accounts::repo_types::User;

/// Request body for registration and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "usuario", default)]
    pub login_handle: String,
    #[serde(rename = "senha", default)]
    pub password: String,
    #[serde(rename = "foto", default)]
    pub photo_url: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "usuario")]
    pub login_handle: String,
    #[serde(rename = "foto", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            login_handle: u.login_handle,
            photo_url: u.photo_url,
        }
    }
}

/// Login request and response. Only `usuario` and `senha` are read on the way
/// in; on the way out `senha` is empty and therefore omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginCredential {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "usuario", default)]
    pub login_handle: String,
    #[serde(rename = "senha", default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(rename = "foto", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub token: String,
}
