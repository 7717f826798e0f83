//! Ballot entity - one device's vote for one nomination.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A stored ballot row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ballot")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    /// Row id.
    pub id: String,

    /// The nomination voted for.
    #[sea_orm(indexed)]
    pub nomination_id: String,

    /// Copy of the nomination's category, so per-device uniqueness can be
    /// enforced by an index.
    #[sea_orm(indexed)]
    pub category_id: String,

    /// Opaque cookie-carried voter token.
    pub device_id: String,

    /// 1-based position for ranking ballots; `None` for single-choice ballots.
    #[sea_orm(nullable)]
    pub rank: Option<i32>,

    /// Cast time.
    pub created_at: DateTimeWithTimeZone,
}

/// Foreign-key relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::nomination::Entity",
        from = "Column::NominationId",
        to = "super::nomination::Column::Id",
        on_delete = "Cascade"
    )]
    /// The chosen nomination.
    Nomination,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    /// The category voted in.
    Category,
}

impl Related<super::nomination::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nomination.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
