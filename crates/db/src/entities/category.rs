//! Category entity - one award being voted on.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a category collects and scores ballots.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    /// One ballot per device, scored by count.
    #[default]
    #[sea_orm(string_value = "standard")]
    Standard,
    /// Same rules as `Standard`; nominations carry an image reference.
    #[sea_orm(string_value = "image")]
    Image,
    /// A full ranked ordering of `ranking_top` nominations per device.
    #[sea_orm(string_value = "ranking")]
    Ranking,
    /// Derived from same-named nominations in source categories; not votable.
    #[sea_orm(string_value = "aggregate")]
    Aggregate,
}

/// A stored category row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    /// Row id.
    pub id: String,

    /// Owning show.
    #[sea_orm(indexed)]
    pub show_id: String,

    /// Display name.
    pub name: String,

    /// Optional subtitle.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Voting and scoring rule.
    pub category_type: CategoryType,

    /// Open for voting. At most one per show.
    #[sea_orm(default_value = false)]
    pub is_active: bool,

    /// Results are visible to the audience.
    #[sea_orm(default_value = false)]
    pub revealed: bool,

    /// Presentation only.
    #[sea_orm(default_value = false)]
    pub hide_vote_counts: bool,

    /// Presentation only.
    #[sea_orm(default_value = false)]
    pub winner_only: bool,

    /// Number of ranks per ballot; set iff `category_type` is `Ranking`.
    #[sea_orm(nullable)]
    pub ranking_top: Option<i32>,

    /// Creation time; orders categories within a show.
    pub created_at: DateTimeWithTimeZone,
}

/// Foreign-key relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::show::Entity",
        from = "Column::ShowId",
        to = "super::show::Column::Id",
        on_delete = "Cascade"
    )]
    /// Owning show.
    Show,
    /// Candidates in this category.
    #[sea_orm(has_many = "super::nomination::Entity")]
    Nominations,
}

impl Related<super::show::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Show.def()
    }
}

impl Related<super::nomination::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nominations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_type_defaults_to_standard() {
        assert_eq!(CategoryType::default(), CategoryType::Standard);
    }
}
