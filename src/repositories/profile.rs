//! Profile repository
//!
//! Owns the `profiles` table. Provider secrets are sealed on write and opened
//! on read with the repository's crypto key.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::crypto::{CryptoKey, ProfileField, is_encrypted_payload, open_field, seal_field};
use crate::models::profile::{self, Entity as Profile};

/// Decrypted provider credentials of one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCredentials {
    pub paragon_token: Option<String>,
    pub integration_app_token: Option<String>,
    pub merge_link_token: Option<String>,
    pub merge_account_token: Option<String>,
}

/// Profile form update. `None` leaves a field unchanged; an empty string clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub paragon_token: Option<String>,
    pub integration_app_token: Option<String>,
    pub merge_handler_id: Option<String>,
    pub merge_ticketing_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pub db: Arc<DatabaseConnection>,
    pub crypto_key: CryptoKey,
}

impl ProfileRepository {
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self { db, crypto_key }
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<profile::Model>> {
        Ok(Profile::find_by_id(user_id).one(&*self.db).await?)
    }

    /// Returns the user's profile, creating an empty one on first use.
    ///
    /// A supplied email fills in a profile that has none; it never overwrites.
    /// Concurrent first calls for the same user converge on a single row.
    pub async fn ensure(&self, user_id: Uuid, email: Option<&str>) -> Result<profile::Model> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        if let Some(existing) = self.find(user_id).await? {
            return match (email, existing.email.as_deref()) {
                (Some(email), None) => {
                    let email = email.to_string();
                    self.update_with(existing, move |am| {
                        am.email = Set(Some(email));
                        Ok(())
                    })
                    .await
                }
                _ => Ok(existing),
            };
        }

        let now = Utc::now();
        let am = profile::ActiveModel {
            user_id: Set(user_id),
            email: Set(email.map(str::to_string)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let inserted = Profile::insert(am)
            .on_conflict(
                OnConflict::column(profile::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        if inserted > 0 {
            tracing::info!(%user_id, "created profile");
        }

        self.find(user_id)
            .await?
            .ok_or_else(|| anyhow!("profile for user '{}' not persisted", user_id))
    }

    pub async fn store_paragon_token(&self, user_id: Uuid, token: &str) -> Result<profile::Model> {
        let sealed = self.seal(user_id, ProfileField::ParagonToken, token)?;
        let existing = self.ensure(user_id, None).await?;
        self.update_with(existing, move |am| {
            am.paragon_token_ciphertext = Set(Some(sealed));
            Ok(())
        })
        .await
    }

    pub async fn store_integration_app_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<profile::Model> {
        let sealed = self.seal(user_id, ProfileField::IntegrationAppToken, token)?;
        let existing = self.ensure(user_id, None).await?;
        self.update_with(existing, move |am| {
            am.integration_app_token_ciphertext = Set(Some(sealed));
            Ok(())
        })
        .await
    }

    /// Record the Merge registered user id and, when one was issued, its link token.
    pub async fn store_merge_registration(
        &self,
        user_id: Uuid,
        registered_user_id: &str,
        link_token: Option<&str>,
    ) -> Result<profile::Model> {
        let sealed = link_token
            .map(|token| self.seal(user_id, ProfileField::MergeLinkToken, token))
            .transpose()?;
        let registered_user_id = registered_user_id.to_string();

        let existing = self.ensure(user_id, None).await?;
        self.update_with(existing, move |am| {
            am.merge_user_id = Set(Some(registered_user_id));
            if let Some(sealed) = sealed {
                am.merge_link_token_ciphertext = Set(Some(sealed));
            }
            Ok(())
        })
        .await
    }

    pub async fn store_merge_account_token(
        &self,
        user_id: Uuid,
        account_token: &str,
    ) -> Result<profile::Model> {
        let sealed = self.seal(user_id, ProfileField::MergeAccountToken, account_token)?;
        let existing = self.ensure(user_id, None).await?;
        self.update_with(existing, move |am| {
            am.merge_account_token_ciphertext = Set(Some(sealed));
            Ok(())
        })
        .await
    }

    /// Apply the profile form.
    pub async fn update_details(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<profile::Model> {
        let paragon = update
            .paragon_token
            .map(|v| self.seal_optional(user_id, ProfileField::ParagonToken, &v))
            .transpose()?;
        let integration_app = update
            .integration_app_token
            .map(|v| self.seal_optional(user_id, ProfileField::IntegrationAppToken, &v))
            .transpose()?;
        let ticketing = update
            .merge_ticketing_token
            .map(|v| self.seal_optional(user_id, ProfileField::MergeAccountToken, &v))
            .transpose()?;

        let existing = self.ensure(user_id, None).await?;
        self.update_with(existing, move |am| {
            if let Some(full_name) = update.full_name {
                am.full_name = Set(non_empty(full_name));
            }
            if let Some(email) = update.email {
                am.email = Set(non_empty(email));
            }
            if let Some(merge_handler_id) = update.merge_handler_id {
                am.merge_handler_id = Set(non_empty(merge_handler_id));
            }
            if let Some(sealed) = paragon {
                am.paragon_token_ciphertext = Set(sealed);
            }
            if let Some(sealed) = integration_app {
                am.integration_app_token_ciphertext = Set(sealed);
            }
            if let Some(sealed) = ticketing {
                am.merge_account_token_ciphertext = Set(sealed);
            }
            Ok(())
        })
        .await
    }

    /// Decrypt every stored credential of `profile`.
    pub fn credentials(&self, profile: &profile::Model) -> Result<ProfileCredentials> {
        let open = |field: ProfileField, stored: &Option<Vec<u8>>| {
            open_field(&self.crypto_key, profile.user_id, field, stored.as_deref()).map_err(|e| {
                tracing::error!(
                    user_id = %profile.user_id,
                    field = field.as_str(),
                    "credential decryption failed"
                );
                anyhow!("credential decryption failed: {}", e)
            })
        };

        Ok(ProfileCredentials {
            paragon_token: open(ProfileField::ParagonToken, &profile.paragon_token_ciphertext)?,
            integration_app_token: open(
                ProfileField::IntegrationAppToken,
                &profile.integration_app_token_ciphertext,
            )?,
            merge_link_token: open(
                ProfileField::MergeLinkToken,
                &profile.merge_link_token_ciphertext,
            )?,
            merge_account_token: open(
                ProfileField::MergeAccountToken,
                &profile.merge_account_token_ciphertext,
            )?,
        })
    }

    /// All profiles, oldest first.
    pub async fn list_all(&self) -> Result<Vec<profile::Model>> {
        Ok(Profile::find()
            .order_by_asc(profile::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Fields of `profile` still stored as legacy plaintext.
    pub fn legacy_fields(profile: &profile::Model) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|field| {
                stored_value(profile, *field).is_some_and(|bytes| !is_encrypted_payload(bytes))
            })
            .collect()
    }

    /// Seal any legacy plaintext credentials in place. Returns how many were rewritten.
    pub async fn reencrypt_legacy(&self, profile: profile::Model) -> Result<usize> {
        let legacy = Self::legacy_fields(&profile);
        if legacy.is_empty() {
            return Ok(0);
        }

        let credentials = self.credentials(&profile)?;
        let user_id = profile.user_id;
        let mut sealed = Vec::with_capacity(legacy.len());
        for field in &legacy {
            let plaintext = match field {
                ProfileField::ParagonToken => credentials.paragon_token.as_deref(),
                ProfileField::IntegrationAppToken => credentials.integration_app_token.as_deref(),
                ProfileField::MergeLinkToken => credentials.merge_link_token.as_deref(),
                ProfileField::MergeAccountToken => credentials.merge_account_token.as_deref(),
            }
            .unwrap_or_default();
            sealed.push((*field, self.seal(user_id, *field, plaintext)?));
        }

        let count = sealed.len();
        self.update_with(profile, move |am| {
            for (field, ciphertext) in sealed {
                let value = Set(Some(ciphertext));
                match field {
                    ProfileField::ParagonToken => am.paragon_token_ciphertext = value,
                    ProfileField::IntegrationAppToken => {
                        am.integration_app_token_ciphertext = value
                    }
                    ProfileField::MergeLinkToken => am.merge_link_token_ciphertext = value,
                    ProfileField::MergeAccountToken => am.merge_account_token_ciphertext = value,
                }
            }
            Ok(())
        })
        .await?;

        Ok(count)
    }

    async fn update_with<F>(&self, existing: profile::Model, apply: F) -> Result<profile::Model>
    where
        F: FnOnce(&mut profile::ActiveModel) -> Result<()>,
    {
        let mut am: profile::ActiveModel = existing.into();
        apply(&mut am)?;
        am.updated_at = Set(Utc::now().into());
        Ok(am.update(&*self.db).await?)
    }

    fn seal(&self, user_id: Uuid, field: ProfileField, value: &str) -> Result<Vec<u8>> {
        seal_field(&self.crypto_key, user_id, field, value)
            .map_err(|e| anyhow!("credential encryption failed: {}", e))
    }

    fn seal_optional(
        &self,
        user_id: Uuid,
        field: ProfileField,
        value: &str,
    ) -> Result<Option<Vec<u8>>> {
        match value.trim() {
            "" => Ok(None),
            trimmed => self.seal(user_id, field, trimmed).map(Some),
        }
    }
}

fn stored_value(profile: &profile::Model, field: ProfileField) -> Option<&[u8]> {
    match field {
        ProfileField::ParagonToken => profile.paragon_token_ciphertext.as_deref(),
        ProfileField::IntegrationAppToken => profile.integration_app_token_ciphertext.as_deref(),
        ProfileField::MergeLinkToken => profile.merge_link_token_ciphertext.as_deref(),
        ProfileField::MergeAccountToken => profile.merge_account_token_ciphertext.as_deref(),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
