//! `SeaORM` entities for the four ceremony tables and the aggregate source link.

/// Ballots.
pub mod ballot;
/// Categories.
pub mod category;
/// Aggregate source links.
pub mod category_source;
/// Nominations.
pub mod nomination;
/// Shows.
pub mod show;

pub use ballot::Entity as Ballot;
pub use category::Entity as Category;
pub use category_source::Entity as CategorySource;
pub use nomination::Entity as Nomination;
pub use show::Entity as Show;
