//! Minimal client for the external identity/database provider.
//!
//! The provider is an opaque collaborator reached over HTTP; every call can
//! fail with a message string and nothing is retried. Construction is
//! optional: without IDENTITY_SERVICE_KEY the service runs local-only and
//! registration skips the provider entirely.
//!
//! NOTE: the service key is never logged.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct Identity {
  pub client: reqwest::Client,
  pub base_url: String,
  service_key: String,
}

#[derive(Deserialize)]
struct UserResp {
  id: String,
  #[serde(default)]
  email: Option<String>,
}

impl Identity {
  /// Construct the client if we find IDENTITY_SERVICE_KEY; otherwise None.
  pub fn from_env() -> Option<Self> {
    let service_key = std::env::var("IDENTITY_SERVICE_KEY").ok()?;
    let base_url = std::env::var("IDENTITY_URL")
      .unwrap_or_else(|_| "http://localhost:54321".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, base_url, service_key })
  }

  fn auth(&self) -> String {
    format!("Bearer {}", self.service_key)
  }

  async fn check<T: serde::de::DeserializeOwned>(
    &self,
    resp: Result<reqwest::Response, reqwest::Error>,
    what: &str,
  ) -> Result<T, String> {
    let resp = resp.map_err(|e| format!("{what}: request failed: {e}"))?;
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
      return Err(format!("{what}: HTTP {status}: {body}"));
    }
    serde_json::from_str(&body).map_err(|e| format!("{what}: bad response: {e}"))
  }

  /// Create an identity. Returns the new user id.
  #[instrument(level = "info", skip(self, password, metadata), fields(%email))]
  pub async fn sign_up(
    &self,
    email: &str,
    password: &str,
    metadata: serde_json::Value,
  ) -> Result<String, String> {
    let resp = self
      .client
      .post(format!("{}/auth/v1/signup", self.base_url))
      .header(AUTHORIZATION, self.auth())
      .header(CONTENT_TYPE, "application/json")
      .json(&json!({ "email": email, "password": password, "data": metadata }))
      .send()
      .await;
    let user: UserResp = self.check(resp, "sign_up").await?;
    info!(target: "arena", user_id = %user.id, "Identity created");
    Ok(user.id)
  }

  /// Mark the identity's email as confirmed (admin operation).
  #[instrument(level = "info", skip(self), fields(%user_id))]
  pub async fn confirm_user(&self, user_id: &str) -> Result<(), String> {
    let resp = self
      .client
      .put(format!("{}/auth/v1/admin/users/{user_id}", self.base_url))
      .header(AUTHORIZATION, self.auth())
      .header(CONTENT_TYPE, "application/json")
      .json(&json!({ "email_confirm": true }))
      .send()
      .await;
    let _: serde_json::Value = self.check(resp, "confirm_user").await?;
    Ok(())
  }

  /// Insert the participant profile row.
  #[instrument(level = "info", skip(self, profile))]
  pub async fn insert_profile(&self, profile: serde_json::Value) -> Result<(), String> {
    let resp = self
      .client
      .post(format!("{}/rest/v1/profiles", self.base_url))
      .header(AUTHORIZATION, self.auth())
      .header(CONTENT_TYPE, "application/json")
      .json(&profile)
      .send()
      .await;
    match resp {
      Ok(r) if r.status().is_success() => Ok(()),
      Ok(r) => {
        let status = r.status();
        let body = r.text().await.unwrap_or_default();
        Err(format!("insert_profile: HTTP {status}: {body}"))
      }
      Err(e) => Err(format!("insert_profile: request failed: {e}")),
    }
  }

  /// Password sign-in. We only care that it succeeds.
  #[instrument(level = "info", skip(self, password), fields(%email))]
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), String> {
    let resp = self
      .client
      .post(format!("{}/auth/v1/token?grant_type=password", self.base_url))
      .header(AUTHORIZATION, self.auth())
      .header(CONTENT_TYPE, "application/json")
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await;
    let _: serde_json::Value = self.check(resp, "sign_in").await?;
    Ok(())
  }

  /// Best-effort cleanup of a just-created identity.
  #[instrument(level = "info", skip(self), fields(%user_id))]
  pub async fn delete_user(&self, user_id: &str) -> Result<(), String> {
    let resp = self
      .client
      .delete(format!("{}/auth/v1/admin/users/{user_id}", self.base_url))
      .header(AUTHORIZATION, self.auth())
      .send()
      .await;
    let _: serde_json::Value = self.check(resp, "delete_user").await?;
    Ok(())
  }

  /// Look up a user's email by id (admin dashboard helper).
  #[instrument(level = "info", skip(self), fields(%user_id))]
  pub async fn user_email(&self, user_id: &str) -> Result<String, String> {
    let resp = self
      .client
      .get(format!("{}/auth/v1/admin/users/{user_id}", self.base_url))
      .header(AUTHORIZATION, self.auth())
      .send()
      .await;
    let user: UserResp = self.check(resp, "user_email").await?;
    user.email.ok_or_else(|| "user_email: no email on record".into())
  }

  /// Create an administrator identity: sign-up + confirm + admin role.
  #[instrument(level = "info", skip(self, password), fields(%email))]
  pub async fn create_admin(&self, email: &str, password: &str) -> Result<String, String> {
    let id = self
      .sign_up(email, password, json!({ "role": "admin" }))
      .await?;
    if let Err(e) = self.set_admin_role(&id).await {
      // Roll back the half-created identity; the failure wins either way.
      let _ = self.delete_user(&id).await;
      return Err(e);
    }
    self.confirm_user(&id).await?;
    Ok(id)
  }

  /// Repair an existing identity's admin role.
  #[instrument(level = "info", skip(self), fields(%user_id))]
  pub async fn set_admin_role(&self, user_id: &str) -> Result<(), String> {
    let resp = self
      .client
      .put(format!("{}/auth/v1/admin/users/{user_id}", self.base_url))
      .header(AUTHORIZATION, self.auth())
      .header(CONTENT_TYPE, "application/json")
      .json(&json!({ "app_metadata": { "role": "admin" } }))
      .send()
      .await;
    let _: serde_json::Value = self.check(resp, "set_admin_role").await?;
    Ok(())
  }
}
