//! Show entity - one organizer's award event.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A stored show row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "show")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    /// Row id.
    pub id: String,

    /// URL slug, unique and immutable.
    #[sea_orm(unique)]
    pub slug: String,

    /// Display name.
    pub name: String,

    /// Argon2 hash of the management password, if one was set.
    #[serde(skip_serializing)]
    #[sea_orm(nullable)]
    pub password: Option<String>,

    /// Creation time.
    pub created_at: DateTimeWithTimeZone,

    /// Last change to the show row.
    pub updated_at: DateTimeWithTimeZone,
}

/// Foreign-key relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Categories of this show.
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
