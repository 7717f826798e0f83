//! Tally engine.
//!
//! Turns stored ballots into per-nomination scores and decides winners.
//! Scores are never stored; every read recomputes them from live ballots.

use podium_common::{AppError, AppResult};
use podium_db::{
    entities::{category, category::CategoryType, nomination},
    repositories::{BallotRepository, CategoryRepository, NominationBallotStats, NominationRepository},
};
use serde::Serialize;
use std::collections::HashMap;

use super::aggregate::rollup;

/// How a category turns ballots into scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringRule {
    /// One point per ballot.
    Count,
    /// Rank `r` of `top` earns `top - r + 1` points.
    Points { top: i64 },
    /// Sum of same-named nominations across source categories.
    Rollup,
}

impl ScoringRule {
    /// The rule for a category.
    pub fn for_category(category: &category::Model) -> AppResult<Self> {
        match category.category_type {
            CategoryType::Standard | CategoryType::Image => Ok(Self::Count),
            CategoryType::Ranking => category
                .ranking_top
                .filter(|top| *top > 0)
                .map(|top| Self::Points {
                    top: i64::from(top),
                })
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "Ranking category {} has no ranking size",
                        category.id
                    ))
                }),
            CategoryType::Aggregate => Ok(Self::Rollup),
        }
    }

    /// Unit shown next to a score.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Points { .. } => "points",
            Self::Count | Self::Rollup => "votes",
        }
    }

    /// Score earned from one nomination's ballots.
    ///
    /// Summing `top - rank + 1` over `n` ranked ballots equals
    /// `n * (top + 1) - sum(rank)`.
    #[must_use]
    pub const fn score(self, stats: &NominationBallotStats) -> i64 {
        match self {
            Self::Count => stats.ballots,
            Self::Points { top } => stats.ballots * (top + 1) - stats.rank_sum,
            Self::Rollup => 0,
        }
    }
}

/// A nomination with its current score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NominationScore {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub score: i64,
}

impl NominationScore {
    #[must_use]
    pub fn new(nomination: &nomination::Model, score: i64) -> Self {
        Self {
            id: nomination.id.clone(),
            name: nomination.name.clone(),
            description: nomination.description.clone(),
            score,
        }
    }
}

/// Scores of a category plus the winner decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub scores: Vec<NominationScore>,
    pub total_score: i64,
    pub max_score: i64,
    /// IDs of every nomination sharing the top score.
    pub winners: Vec<String>,
    pub has_winner: bool,
    pub is_tied: bool,
    pub is_complete_tie: bool,
}

impl Standings {
    /// Decide winners from a set of scores.
    ///
    /// There is a winner when any score was cast, or when a single
    /// nomination stands uncontested. Tie flags are only set alongside a
    /// winner.
    #[must_use]
    pub fn from_scores(scores: Vec<NominationScore>) -> Self {
        let total_score = scores.iter().map(|s| s.score).sum();
        let max_score = scores.iter().map(|s| s.score).max().unwrap_or(0);
        let has_winner = !scores.is_empty() && (total_score > 0 || scores.len() == 1);

        let winners: Vec<String> = if has_winner {
            scores
                .iter()
                .filter(|s| s.score == max_score)
                .map(|s| s.id.clone())
                .collect()
        } else {
            Vec::new()
        };
        let is_tied = winners.len() > 1;
        let is_complete_tie = is_tied && winners.len() == scores.len();

        Self {
            scores,
            total_score,
            max_score,
            winners,
            has_winner,
            is_tied,
            is_complete_tie,
        }
    }
}

/// Live standings of one category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_type: CategoryType,
    pub is_active: bool,
    pub revealed: bool,
    pub hide_vote_counts: bool,
    pub winner_only: bool,
    pub ranking_top: Option<i32>,
    /// `votes` or `points`.
    pub score_unit: &'static str,
    #[serde(flatten)]
    pub standings: Standings,
}

/// Score nominations against per-nomination ballot stats.
///
/// Nominations without ballots score zero.
#[must_use]
pub fn score_nominations(
    rule: ScoringRule,
    nominations: &[nomination::Model],
    stats: &[NominationBallotStats],
) -> Vec<NominationScore> {
    let by_nomination: HashMap<&str, &NominationBallotStats> = stats
        .iter()
        .map(|s| (s.nomination_id.as_str(), s))
        .collect();

    nominations
        .iter()
        .map(|n| {
            let score = by_nomination
                .get(n.id.as_str())
                .map_or(0, |s| rule.score(s));
            NominationScore::new(n, score)
        })
        .collect()
}

/// Tally service for reading live scores.
#[derive(Clone)]
pub struct TallyService {
    category_repo: CategoryRepository,
    nomination_repo: NominationRepository,
    ballot_repo: BallotRepository,
}

impl TallyService {
    /// Create a new tally service.
    #[must_use]
    pub const fn new(
        category_repo: CategoryRepository,
        nomination_repo: NominationRepository,
        ballot_repo: BallotRepository,
    ) -> Self {
        Self {
            category_repo,
            nomination_repo,
            ballot_repo,
        }
    }

    /// Standings of a category by ID.
    pub async fn get_tally(&self, category_id: &str) -> AppResult<CategoryTally> {
        let category = self.category_repo.get_by_id(category_id).await?;
        self.tally(&category).await
    }

    /// Standings of a loaded category.
    pub async fn tally(&self, category: &category::Model) -> AppResult<CategoryTally> {
        let rule = ScoringRule::for_category(category)?;
        let scores = self.score(category, rule).await?;

        Ok(CategoryTally {
            category_id: category.id.clone(),
            name: category.name.clone(),
            description: category.description.clone(),
            category_type: category.category_type,
            is_active: category.is_active,
            revealed: category.revealed,
            hide_vote_counts: category.hide_vote_counts,
            winner_only: category.winner_only,
            ranking_top: category.ranking_top,
            score_unit: rule.unit(),
            standings: Standings::from_scores(scores),
        })
    }

    /// Per-nomination scores of a category.
    pub async fn score(
        &self,
        category: &category::Model,
        rule: ScoringRule,
    ) -> AppResult<Vec<NominationScore>> {
        if rule != ScoringRule::Rollup {
            return self.score_direct(category, rule).await;
        }

        let sources = self.category_repo.find_sources(&category.id).await?;
        let mut source_scores = Vec::new();
        for source in &sources {
            let source_rule = ScoringRule::for_category(source)?;
            source_scores.extend(self.score_direct(source, source_rule).await?);
        }

        let nominations = self.nomination_repo.find_by_category(&category.id).await?;
        tracing::debug!(
            category_id = %category.id,
            sources = sources.len(),
            "Rolled up aggregate scores"
        );

        Ok(rollup(&nominations, &source_scores))
    }

    async fn score_direct(
        &self,
        category: &category::Model,
        rule: ScoringRule,
    ) -> AppResult<Vec<NominationScore>> {
        if rule == ScoringRule::Rollup {
            return Err(AppError::Internal(format!(
                "Aggregate category {} cannot be scored from its own ballots",
                category.id
            )));
        }

        let nominations = self.nomination_repo.find_by_category(&category.id).await?;
        let stats = self.ballot_repo.stats_by_category(&category.id).await?;

        Ok(score_nominations(rule, &nominations, &stats))
    }
}
