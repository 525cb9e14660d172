//! Registration and login.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::client::inner::{Endpoint, decode};
use crate::client::{Session, WorkflowClient};
use crate::control::UserRecord;
use crate::error::Error;

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl WorkflowClient {
    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// - `RegistrationConflict` if the email or username is taken
    /// - `Validation` if the gateway rejects the input
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, Error> {
        let request = RegisterRequest {
            email,
            username,
            password,
        };
        let payload = self
            .inner()
            .send_json(Method::POST, "/auth/register", Endpoint::Register, &request)
            .await?;

        let user: UserRecord = decode(unwrap_user(payload))?;
        tracing::info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user)
    }

    /// Logs in and attaches the returned token to all later calls.
    ///
    /// # Errors
    ///
    /// - `Authentication` on 401/403 or a `success: false` envelope
    /// - `InvalidResponse` if the payload carries no token
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Error> {
        let request = LoginRequest { email, password };
        let payload = self
            .inner()
            .send_json(Method::POST, "/auth/login", Endpoint::Login, &request)
            .await?;

        let session = session_from_payload(payload)?;
        self.set_session(session.clone());

        tracing::info!(
            user_id = session.user().map(|u| u.id.as_str()).unwrap_or("unknown"),
            "logged in"
        );
        Ok(session)
    }
}

/// Accepts a bare user or one nested under `user`.
fn unwrap_user(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.get("user").is_some_and(Value::is_object) => {
            map.remove("user").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Extracts the token (`token` or `access_token`) and the optional `user`.
fn session_from_payload(payload: Value) -> Result<Session, Error> {
    let Value::Object(mut map) = payload else {
        return Err(Error::invalid_response("login payload is not an object"));
    };

    let token = ["token", "access_token"]
        .iter()
        .find_map(|field| match map.remove(*field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        })
        .ok_or_else(|| Error::invalid_response("login payload has no token"))?;

    let user = match map.remove("user") {
        Some(user @ Value::Object(_)) => Some(decode::<UserRecord>(user)?),
        _ => None,
    };

    Ok(Session::new(token, user))
}
