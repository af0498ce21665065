//! crates/streaming_catalog_core/src/aggregation.rs
//!
//! Read-side composition across the catalog and the reviews: rating statistics are
//! recomputed from the review set on every query, then projected and sorted here so
//! that every storage adapter shares one definition of the numbers and the order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::bounded::bounded;
use crate::domain::{MovieInfo, RatingRollup};
use crate::error::{CatalogError, CatalogResult};
use crate::ports::RatingAggregator;
use crate::stores::parse_movie_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Date,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: Direction,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            direction: Direction::Desc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::Name => "name",
            SortKey::Date => "date",
            SortKey::Rating => "rating",
        };
        let direction = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{key}/{direction}")
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

impl SortOrder {
    /// Parses the caller's sort request (case-insensitive).
    ///
    /// No key and no direction means name/desc. A direction without a key, a key
    /// without a direction, or any unknown value is an `InvalidQuery`.
    pub fn parse(sort_by: Option<&str>, direction: Option<&str>) -> CatalogResult<Self> {
        let (sort_by, direction) = match (present(sort_by), present(direction)) {
            (None, None) => return Ok(Self::default()),
            (None, Some(_)) => {
                return Err(CatalogError::InvalidQuery(
                    "direction given without a sort key".into(),
                ))
            }
            (Some(_), None) => {
                return Err(CatalogError::InvalidQuery(
                    "sort key given without a direction".into(),
                ))
            }
            (Some(s), Some(d)) => (s, d),
        };

        let key = match sort_by.as_str() {
            "name" => SortKey::Name,
            "date" => SortKey::Date,
            "rating" => SortKey::Rating,
            other => return Err(CatalogError::InvalidQuery(format!("unknown sort key '{other}'"))),
        };
        let direction = match direction.as_str() {
            "asc" => Direction::Asc,
            "desc" => Direction::Desc,
            other => return Err(CatalogError::InvalidQuery(format!("unknown direction '{other}'"))),
        };
        Ok(Self { key, direction })
    }

    fn compare(&self, a: &MovieInfo, b: &MovieInfo) -> Ordering {
        let ordering = match self.key {
            SortKey::Name => a.movie.title.cmp(&b.movie.title),
            SortKey::Date => a.movie.release_date.cmp(&b.movie.release_date),
            SortKey::Rating => a.rating_average.total_cmp(&b.rating_average),
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Average of `count` ratings summing to `sum`, rounded to one decimal place with
/// halves rounded away from zero. Zero when there are no ratings.
pub fn rating_average(sum: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    // Integer arithmetic keeps e.g. 13/4 = 3.25 from drifting below the half.
    let magnitude = (20 * sum.abs() + count) / (2 * count);
    let tenths = if sum < 0 { -magnitude } else { magnitude };
    tenths as f64 / 10.0
}

fn project(rollup: RatingRollup) -> MovieInfo {
    MovieInfo {
        rating_average: rating_average(rollup.rating_sum, rollup.rating_count),
        rating_count: rollup.rating_count,
        movie: rollup.movie,
    }
}

#[derive(Clone)]
pub struct AggregationEngine {
    ratings: Arc<dyn RatingAggregator>,
    timeout: Duration,
}

impl AggregationEngine {
    pub fn new(ratings: Arc<dyn RatingAggregator>, timeout: Duration) -> Self {
        Self { ratings, timeout }
    }

    /// Every movie with its rating statistics, sorted as requested.
    ///
    /// Ties keep creation order because the rollup arrives oldest-first and the sort
    /// is stable.
    pub async fn list_movies(
        &self,
        sort_by: Option<&str>,
        direction: Option<&str>,
    ) -> CatalogResult<Vec<MovieInfo>> {
        let order = SortOrder::parse(sort_by, direction)?;
        let rows = bounded("ratings.rollup", self.timeout, self.ratings.rollup(None)).await?;

        let mut infos: Vec<MovieInfo> = rows.into_iter().map(project).collect();
        infos.sort_by(|a, b| order.compare(a, b));
        Ok(infos)
    }

    pub async fn get_movie_info(&self, raw_id: &str) -> CatalogResult<MovieInfo> {
        let movie_id = parse_movie_id(raw_id)?;
        self.movie_info(movie_id).await
    }

    pub(crate) async fn movie_info(&self, movie_id: Uuid) -> CatalogResult<MovieInfo> {
        let rows = bounded("ratings.rollup", self.timeout, self.ratings.rollup(Some(movie_id))).await?;
        rows.into_iter()
            .find(|row| row.movie.id == movie_id)
            .map(project)
            .ok_or(CatalogError::NotFound("movie"))
    }
}
