//! Profile entity model
//!
//! One row per dashboard user. Provider secrets live in `*_ciphertext`
//! columns and are sealed with [`crate::crypto::seal_field`].

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// Identifier of the authenticated user (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    pub email: Option<String>,

    /// Display name, used as the Integration App token `name` claim
    pub full_name: Option<String>,

    pub paragon_token_ciphertext: Option<Vec<u8>>,

    pub integration_app_token_ciphertext: Option<Vec<u8>>,

    /// Merge Agent Handler registered user id
    pub merge_user_id: Option<String>,

    pub merge_handler_id: Option<String>,

    pub merge_link_token_ciphertext: Option<Vec<u8>>,

    /// Merge Unified account token obtained from the public token exchange
    pub merge_account_token_ciphertext: Option<Vec<u8>>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
