//! Connection-state repository
//!
//! One boolean per (user, service, integration). A missing row reads as
//! "not connected".

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{Integration, Service};
use crate::models::integration_connection::{self, Column, Entity as IntegrationConnection};

#[derive(Debug, Clone)]
pub struct IntegrationConnectionRepository {
    pub db: Arc<DatabaseConnection>,
}

impl IntegrationConnectionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find(
        &self,
        user_id: Uuid,
        service: Service,
        integration: Integration,
    ) -> Result<Option<integration_connection::Model>> {
        Ok(IntegrationConnection::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Service.eq(service.display_name()))
            .filter(Column::Integration.eq(integration.display_name()))
            .one(&*self.db)
            .await?)
    }

    pub async fn get_status(
        &self,
        user_id: Uuid,
        service: Service,
        integration: Integration,
    ) -> Result<bool> {
        Ok(self
            .find(user_id, service, integration)
            .await?
            .is_some_and(|row| row.connected))
    }

    /// Upsert the flag on the composite key. Last write wins.
    pub async fn set_status(
        &self,
        user_id: Uuid,
        service: Service,
        integration: Integration,
        connected: bool,
    ) -> Result<integration_connection::Model> {
        let now = Utc::now();
        let am = integration_connection::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            service: Set(service.display_name().to_string()),
            integration: Set(integration.display_name().to_string()),
            connected: Set(connected),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        IntegrationConnection::insert(am)
            .on_conflict(
                OnConflict::columns([Column::UserId, Column::Service, Column::Integration])
                    .update_columns([Column::Connected, Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        tracing::debug!(%user_id, %service, %integration, connected, "connection state stored");

        self.find(user_id, service, integration)
            .await?
            .ok_or_else(|| anyhow!("connection state for {}/{} not persisted", service, integration))
    }

    /// Invert the stored flag and return the new value.
    ///
    /// Read then write, not atomic: concurrent toggles may both observe the
    /// same prior state.
    pub async fn toggle(
        &self,
        user_id: Uuid,
        service: Service,
        integration: Integration,
    ) -> Result<bool> {
        let current = self.get_status(user_id, service, integration).await?;
        let updated = self
            .set_status(user_id, service, integration, !current)
            .await?;
        Ok(updated.connected)
    }

    /// Every stored row for the user, ordered by service then integration.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<integration_connection::Model>> {
        Ok(IntegrationConnection::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_asc(Column::Service)
            .order_by_asc(Column::Integration)
            .all(&*self.db)
            .await?)
    }
}
