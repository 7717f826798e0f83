//! Link from an aggregate category to one of its source categories.

use sea_orm::entity::prelude::*;

/// A stored aggregate-to-source link.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "category_source")]
pub struct Model {
    /// The aggregate category.
    #[sea_orm(primary_key, auto_increment = false)]
    pub aggregate_id: String,

    /// A non-aggregate category of the same show.
    #[sea_orm(primary_key, auto_increment = false)]
    pub source_id: String,
}

/// Foreign-key relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::AggregateId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    /// The aggregate side.
    Aggregate,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::SourceId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    /// The source side.
    Source,
}

impl ActiveModelBehavior for ActiveModel {}
