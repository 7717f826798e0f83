//! Nomination entity - a candidate within a category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A stored nomination row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nomination")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    /// Row id.
    pub id: String,

    /// Owning category.
    #[sea_orm(indexed)]
    pub category_id: String,

    /// Aggregates match source nominations by this name.
    pub name: String,

    /// Free text, or an image reference for image categories.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Creation time; breaks ties in listings.
    pub created_at: DateTimeWithTimeZone,
}

/// Foreign-key relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    /// Owning category.
    Category,
    /// Ballots cast for this nomination.
    #[sea_orm(has_many = "super::ballot::Entity")]
    Ballots,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::ballot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ballots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
