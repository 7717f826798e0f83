//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod activation;
pub mod aggregate;
pub mod ballot;
pub mod category;
pub mod nomination;
pub mod ranking;
pub mod show;
pub mod tally;

pub use access::{
    AccessService, AttemptLimiter, InMemoryAttemptLimiter, hash_password, verify_password,
};
pub use activation::ActivationService;
pub use aggregate::AggregateService;
pub use ballot::{BallotService, RankedNomination};
pub use category::{CategoryService, CreateCategoryInput};
pub use nomination::{CreateNominationInput, NominationService};
pub use ranking::{RankingEntry, RankingService};
pub use show::{CreateShowInput, ShowService, ShowView};
pub use tally::{CategoryTally, NominationScore, ScoringRule, Standings, TallyService};
