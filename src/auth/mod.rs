use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::error::ServiceError;
use crate::shared::models::schema::users;
use crate::shared::models::User;
use crate::shared::state::AppState;

pub const USER_TYPE_CUSTOMER: &str = "Customer";
pub const USER_TYPE_VENDOR: &str = "Vendor";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub user_type: String,
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_type: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            user_type: user.user_type,
            company_name: user.company_name,
            created_at: user.created_at,
        }
    }
}

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), ServiceError> {
    if req.name.trim().is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    if req.email.trim().is_empty() {
        return Err(ServiceError::validation("email is required"));
    }
    if req.phone.trim().is_empty() {
        return Err(ServiceError::validation("phone is required"));
    }
    if req.password.is_empty() {
        return Err(ServiceError::validation("password is required"));
    }
    if req.user_type != USER_TYPE_CUSTOMER && req.user_type != USER_TYPE_VENDOR {
        return Err(ServiceError::validation(
            "user_type must be Customer or Vendor",
        ));
    }
    if req.user_type == USER_TYPE_VENDOR
        && req
            .company_name
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
    {
        return Err(ServiceError::validation(
            "company is required for vendor accounts",
        ));
    }
    Ok(())
}

/// POST /api/auth/register - create a Customer or Vendor account
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    validate_registration(&req)?;
    let mut conn = state.conn.get()?;

    let existing: Option<Uuid> = users::table
        .filter(users::email.eq(req.email.trim()))
        .select(users::id)
        .first(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Err(ServiceError::validation("email is already registered"));
    }

    let company_name = if req.user_type == USER_TYPE_VENDOR {
        req.company_name.as_deref().map(|c| c.trim().to_string())
    } else {
        None
    };

    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.phone.trim().to_string(),
        password_hash: hash_password(&req.password),
        user_type: req.user_type,
        company_name,
        created_at: Utc::now(),
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)?;

    info!("Registered {} account for {}", user.user_type, user.email);
    Ok(Json(user.into()))
}

/// POST /api/auth/login - name + email + password check against the first
/// row stored for the email
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ServiceError::validation("email and password are required"));
    }
    let mut conn = state.conn.get()?;

    let user: Option<User> = users::table
        .filter(users::email.eq(req.email.trim()))
        .order(users::created_at.asc())
        .first(&mut conn)
        .optional()?;
    let user = user.ok_or_else(|| ServiceError::validation("invalid email"))?;

    if user.name != req.name || !verify_password(&req.password, &user.password_hash) {
        return Err(ServiceError::validation("invalid username or password"));
    }

    info!("User {} logged in", user.email);
    Ok(Json(user.into()))
}

fn hash_password(password: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn verify_password(password: &str, hash: &str) -> bool {
    hash_password(password) == hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;
    use crate::{assert_err, assert_ok};

    fn request(user_type: &str, company: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "555-0100".to_string(),
            password: "hunter2".to_string(),
            user_type: user_type.to_string(),
            company_name: company.map(str::to_string),
        }
    }

    #[test]
    fn accepts_customer_without_company() {
        test_util::setup();
        assert_ok!(validate_registration(&request(USER_TYPE_CUSTOMER, None)));
    }

    #[test]
    fn vendor_requires_company() {
        test_util::setup();
        let err = assert_err!(validate_registration(&request(USER_TYPE_VENDOR, None)));
        assert_eq!(err.kind(), "validation");
        assert_ok!(validate_registration(&request(
            USER_TYPE_VENDOR,
            Some("Acme Traders")
        )));
    }

    #[test]
    fn rejects_unknown_user_type() {
        test_util::setup();
        let err = assert_err!(validate_registration(&request("Admin", None)));
        assert!(err.to_string().contains("Customer or Vendor"));
    }

    #[test]
    fn rejects_missing_fields() {
        test_util::setup();
        let mut req = request(USER_TYPE_CUSTOMER, None);
        req.name = "  ".to_string();
        assert_err!(validate_registration(&req));
        let mut req = request(USER_TYPE_CUSTOMER, None);
        req.password = String::new();
        assert_err!(validate_registration(&req));
    }

    #[test]
    fn password_digest_round_trips() {
        test_util::setup();
        let hash = hash_password("hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert_ne!(hash, "hunter2");
    }
}
