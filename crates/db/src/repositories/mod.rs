//! Repository layer for database operations.

mod ballot;
mod category;
mod nomination;
mod show;

pub use ballot::{BallotRepository, NominationBallotStats};
pub use category::{CategoryFlag, CategoryRepository};
pub use nomination::NominationRepository;
pub use show::{ShowListing, ShowRepository};
