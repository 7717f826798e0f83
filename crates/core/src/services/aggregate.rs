//! Aggregate synchronizer.
//!
//! An aggregate category owns no ballots. Its nominations mirror the names
//! found in its source categories, and its scores are the per-name sums of
//! the source scores.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use podium_common::{AppError, AppResult, IdGenerator};
use podium_db::{
    entities::{category, category::CategoryType, nomination},
    repositories::CategoryRepository,
};
use sea_orm::Set;

use super::tally::NominationScore;

/// Score each aggregate nomination as the sum of same-named source scores.
///
/// A name found in only one source still rolls up; a name found in none
/// scores zero.
#[must_use]
pub fn rollup(
    aggregate_nominations: &[nomination::Model],
    source_scores: &[NominationScore],
) -> Vec<NominationScore> {
    let mut by_name: HashMap<&str, i64> = HashMap::new();
    for source in source_scores {
        *by_name.entry(source.name.as_str()).or_default() += source.score;
    }

    aggregate_nominations
        .iter()
        .map(|n| NominationScore::new(n, by_name.get(n.name.as_str()).copied().unwrap_or(0)))
        .collect()
}

/// Distinct nomination names across sources, keeping the first description.
#[must_use]
pub fn distinct_by_name(nominations: &[nomination::Model]) -> Vec<(String, Option<String>)> {
    let mut seen = HashSet::new();
    nominations
        .iter()
        .filter(|n| seen.insert(n.name.as_str()))
        .map(|n| (n.name.clone(), n.description.clone()))
        .collect()
}

/// Keeps aggregate categories in step with their sources.
#[derive(Clone)]
pub struct AggregateService {
    category_repo: CategoryRepository,
    id_gen: IdGenerator,
}

impl AggregateService {
    /// Create a new aggregate service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self {
            category_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Check proposed sources for a new aggregate in `show_id`.
    ///
    /// Sources must already exist in the same show and must not be
    /// aggregates themselves, so an aggregate can never reach itself.
    /// Duplicate IDs are collapsed.
    pub async fn resolve_sources(
        &self,
        show_id: &str,
        source_ids: &[String],
    ) -> AppResult<Vec<category::Model>> {
        let mut unique = Vec::with_capacity(source_ids.len());
        for id in source_ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }
        if unique.is_empty() {
            return Err(AppError::BadRequest(
                "Aggregate categories need at least one source category".to_string(),
            ));
        }

        let sources = self.category_repo.find_by_ids(&unique).await?;
        if sources.len() != unique.len() {
            return Err(AppError::BadRequest(
                "Source category not found".to_string(),
            ));
        }

        for source in &sources {
            if source.show_id != show_id {
                return Err(AppError::BadRequest(
                    "Source categories must belong to the same show".to_string(),
                ));
            }
            if source.category_type == CategoryType::Aggregate {
                return Err(AppError::BadRequest(
                    "An aggregate category cannot be a source".to_string(),
                ));
            }
        }

        Ok(sources)
    }

    /// Nominations a new aggregate starts with: one per distinct name among
    /// `source_nominations`.
    #[must_use]
    pub fn initial_nominations(
        &self,
        aggregate_id: &str,
        source_nominations: &[nomination::Model],
    ) -> Vec<nomination::ActiveModel> {
        distinct_by_name(source_nominations)
            .into_iter()
            .map(|(name, description)| self.new_nomination(aggregate_id, name, description))
            .collect()
    }

    /// Mirror row for a nomination propagated into `aggregate_id`.
    ///
    /// Whether it is actually inserted is decided in the write transaction,
    /// where an existing same-named nomination wins.
    #[must_use]
    pub fn mirror(
        &self,
        aggregate_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> nomination::ActiveModel {
        self.new_nomination(
            aggregate_id,
            name.to_string(),
            description.map(str::to_string),
        )
    }

    fn new_nomination(
        &self,
        category_id: &str,
        name: String,
        description: Option<String>,
    ) -> nomination::ActiveModel {
        nomination::ActiveModel {
            id: Set(self.id_gen.generate()),
            category_id: Set(category_id.to_string()),
            name: Set(name),
            description: Set(description),
            created_at: Set(Utc::now().into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn nomination(id: &str, category_id: &str, name: &str, description: Option<&str>) -> nomination::Model {
        nomination::Model {
            id: id.to_string(),
            category_id: category_id.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now().into(),
        }
    }

    fn scored(name: &str, score: i64) -> NominationScore {
        NominationScore {
            id: format!("src-{name}-{score}"),
            name: name.to_string(),
            description: None,
            score,
        }
    }

    fn category(id: &str, show_id: &str, category_type: CategoryType) -> category::Model {
        category::Model {
            id: id.to_string(),
            show_id: show_id.to_string(),
            name: id.to_string(),
            description: None,
            category_type,
            is_active: false,
            revealed: false,
            hide_vote_counts: false,
            winner_only: false,
            ranking_top: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> AggregateService {
        AggregateService::new(CategoryRepository::new(Arc::new(db)))
    }

    #[test]
    fn test_rollup_sums_by_name() {
        let aggregate = vec![
            nomination("g1", "agg", "Alice", None),
            nomination("g2", "agg", "Bob", None),
            nomination("g3", "agg", "Carol", None),
        ];
        let sources = vec![scored("Alice", 2), scored("Alice", 3), scored("Bob", 1)];

        let scores = rollup(&aggregate, &sources);

        assert_eq!(scores[0].id, "g1");
        assert_eq!(scores[0].score, 5);
        assert_eq!(scores[1].score, 1);
        assert_eq!(scores[2].score, 0);
    }

    #[test]
    fn test_distinct_by_name_keeps_first_description() {
        let sources = vec![
            nomination("a1", "a", "Alice", Some("first")),
            nomination("b1", "b", "Alice", Some("second")),
            nomination("b2", "b", "Bob", None),
        ];

        let distinct = distinct_by_name(&sources);

        assert_eq!(
            distinct,
            vec![
                ("Alice".to_string(), Some("first".to_string())),
                ("Bob".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_initial_nominations_target_aggregate() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let sources = vec![
            nomination("a1", "a", "Alice", Some("first")),
            nomination("b1", "b", "Alice", None),
            nomination("b2", "b", "Bob", None),
        ];

        let rows = service.initial_nominations("agg", &sources);

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.category_id.try_as_ref().map(String::as_str), Some("agg"));
        }
        assert_eq!(
            rows[0].description.try_as_ref().cloned().flatten().as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_mirror_copies_name() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let row = service.mirror("agg", "Bob", Some("Accounts"));

        assert_eq!(row.category_id.try_as_ref().map(String::as_str), Some("agg"));
        assert_eq!(row.name.try_as_ref().map(String::as_str), Some("Bob"));
    }

    #[tokio::test]
    async fn test_resolve_sources_requires_one() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service.resolve_sources("show1", &[]).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_resolve_sources_rejects_aggregate_source() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[category("agg", "show1", CategoryType::Aggregate)]])
            .into_connection();

        let result = service(db)
            .resolve_sources("show1", &["agg".to_string()])
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_resolve_sources_rejects_other_show() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[category("a", "show2", CategoryType::Standard)]])
            .into_connection();

        let result = service(db).resolve_sources("show1", &["a".to_string()]).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_resolve_sources_collapses_duplicates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[category("a", "show1", CategoryType::Ranking)]])
            .into_connection();

        let sources = service(db)
            .resolve_sources("show1", &["a".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(sources.len(), 1);
    }
}
