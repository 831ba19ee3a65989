use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Role, UserRecord};

/// Finds a stored account by its login identifier. One implementation is
/// registered per role in a [`UserDirectory`].
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>>;
}

#[derive(Debug, Deserialize)]
struct CredentialsRow {
    id: i64,
    #[serde(alias = "username", alias = "email")]
    identifier: String,
    password: String,
}

impl From<CredentialsRow> for UserRecord {
    fn from(row: CredentialsRow) -> Self {
        UserRecord {
            id: row.id,
            identifier: row.identifier,
            password_hash: row.password,
        }
    }
}

/// Reads credentials from the role's table over PostgREST.
pub struct SupabaseUserLookup {
    supabase: SupabaseClient,
    table: &'static str,
    column: &'static str,
}

impl SupabaseUserLookup {
    pub fn for_role(config: &AppConfig, role: Role) -> Self {
        // Admins sign in by username, everyone else by email.
        let (table, column) = match role {
            Role::Admin => ("admins", "username"),
            Role::Doctor => ("doctors", "email"),
            Role::Patient => ("patients", "email"),
        };

        Self {
            supabase: SupabaseClient::new(config),
            table,
            column,
        }
    }
}

#[async_trait]
impl UserLookup for SupabaseUserLookup {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>> {
        debug!("Looking up {} by {}", self.table, self.column);

        let path = format!(
            "/rest/v1/{}?{}=eq.{}&select=id,{},password",
            self.table,
            self.column,
            urlencoding::encode(identifier),
            self.column,
        );
        let rows: Vec<CredentialsRow> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows.into_iter().next().map(UserRecord::from))
    }
}

/// Maps each role to the lookup that knows where its accounts live.
#[derive(Clone, Default)]
pub struct UserDirectory {
    lookups: HashMap<Role, Arc<dyn UserLookup>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supabase(config: &AppConfig) -> Self {
        Role::ALL.into_iter().fold(Self::new(), |directory, role| {
            directory.with_lookup(role, Arc::new(SupabaseUserLookup::for_role(config, role)))
        })
    }

    pub fn with_lookup(mut self, role: Role, lookup: Arc<dyn UserLookup>) -> Self {
        self.lookups.insert(role, lookup);
        self
    }

    pub fn lookup(&self, role: Role) -> Option<&Arc<dyn UserLookup>> {
        self.lookups.get(&role)
    }
}
