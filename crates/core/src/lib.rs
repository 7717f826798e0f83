//! Voting and tallying logic for podium.

pub mod services;

use std::sync::Arc;

use podium_db::repositories::{
    BallotRepository, CategoryRepository, NominationRepository, ShowRepository,
};
use sea_orm::DatabaseConnection;

pub use services::*;

/// Every service, wired to one connection pool.
#[derive(Clone)]
#[allow(missing_docs)]
pub struct Services {
    pub access: AccessService,
    pub activation: ActivationService,
    pub ballots: BallotService,
    pub categories: CategoryService,
    pub nominations: NominationService,
    pub rankings: RankingService,
    pub shows: ShowService,
    pub tally: TallyService,
}

impl Services {
    /// Build the service graph over `db`.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, limiter: Arc<dyn AttemptLimiter>) -> Self {
        let show_repo = ShowRepository::new(Arc::clone(&db));
        let category_repo = CategoryRepository::new(Arc::clone(&db));
        let nomination_repo = NominationRepository::new(Arc::clone(&db));
        let ballot_repo = BallotRepository::new(db);

        let tally = TallyService::new(
            category_repo.clone(),
            nomination_repo.clone(),
            ballot_repo.clone(),
        );
        let aggregate = AggregateService::new(category_repo.clone());

        Self {
            access: AccessService::new(show_repo.clone(), limiter),
            activation: ActivationService::new(category_repo.clone()),
            ballots: BallotService::new(
                ballot_repo.clone(),
                category_repo.clone(),
                nomination_repo.clone(),
            ),
            categories: CategoryService::new(
                category_repo.clone(),
                show_repo.clone(),
                aggregate.clone(),
            ),
            nominations: NominationService::new(
                nomination_repo.clone(),
                category_repo.clone(),
                aggregate,
            ),
            rankings: RankingService::new(ballot_repo, category_repo.clone(), nomination_repo),
            shows: ShowService::new(show_repo, category_repo, tally.clone()),
            tally,
        }
    }
}
