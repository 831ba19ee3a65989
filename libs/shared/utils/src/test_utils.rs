use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;

use shared_config::AppConfig;
use shared_models::auth::Role;

use crate::jwt::TokenAuthority;
use crate::password::hash_password;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            api_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub identifier: String,
    pub password: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(id: i64, identifier: &str, role: Role) -> Self {
        Self {
            id,
            identifier: identifier.to_string(),
            password: "correct-horse-battery".to_string(),
            role,
        }
    }

    pub fn admin(username: &str) -> Self {
        Self::new(1, username, Role::Admin)
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(10, email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(100, email, Role::Patient)
    }

    pub fn password_hash(&self) -> String {
        hash_password(&self.password).expect("argon2 hashing with a fresh salt")
    }

    /// Table and identifier column the user lives under.
    pub fn storage(&self) -> (&'static str, &'static str) {
        match self.role {
            Role::Admin => ("admins", "username"),
            Role::Doctor => ("doctors", "email"),
            Role::Patient => ("patients", "email"),
        }
    }

    pub fn credentials_row(&self) -> serde_json::Value {
        let (_, column) = self.storage();
        json!({
            "id": self.id,
            column: self.identifier,
            "password": self.password_hash(),
        })
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str) -> String {
        TokenAuthority::new(secret)
            .and_then(|authority| authority.issue(&user.identifier))
            .expect("test secret is non-empty")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        TokenAuthority::new(secret)
            .and_then(|authority| authority.issue_at(&user.identifier, Utc::now() - Duration::days(8)))
            .expect("test secret is non-empty")
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret")
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_response(id: i64, email: &str, available_times: &[&str]) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Dr. Test",
            "specialty": "Cardiology",
            "email": email,
            "phone": "0123456789",
            "available_times": available_times,
        })
    }

    pub fn patient_response(id: i64, email: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "email": email,
            "phone": "0987654321",
            "address": "1 Main Street",
        })
    }

    pub fn appointment_response(id: i64, doctor_id: i64, patient_id: i64, time: &str) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "appointment_time": time,
            "status": "scheduled",
        })
    }

    pub fn prescription_response(id: i64, appointment_id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "patient_name": "Jane Doe",
            "appointment_id": appointment_id,
            "medication": "Amoxicillin",
            "dosage": "500mg three times daily",
            "doctor_notes": null,
        })
    }
}
