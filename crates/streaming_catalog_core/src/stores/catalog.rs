//! crates/streaming_catalog_core/src/stores/catalog.rs
//!
//! Owns movie records, their ownership metadata and their cover assets.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bounded::bounded;
use crate::domain::{Movie, MovieChanges, MoviePatch, NewMovie};
use crate::error::{CatalogError, CatalogResult};
use crate::ports::{BlobStore, MovieRepository};

/// Parses a caller-supplied movie id. A malformed id is reported exactly like a
/// missing movie.
pub fn parse_movie_id(raw: &str) -> CatalogResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| CatalogError::NotFound("movie"))
}

fn required_text(field: &str, value: &str) -> CatalogResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CatalogError::Validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

/// Capitalizes the first letter of every word, leaving the rest as typed.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for c in value.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = c.is_whitespace();
    }
    out
}

fn movie_title(value: &str) -> CatalogResult<String> {
    required_text("title", value).map(|title| title_case(&title))
}

impl MoviePatch {
    /// Validates the patch and keeps only the mutable fields.
    pub fn into_changes(self) -> CatalogResult<MovieChanges> {
        if self.id.is_some() {
            return Err(CatalogError::Validation("id cannot be changed".into()));
        }
        if self.added_by.is_some() {
            return Err(CatalogError::Validation("added_by cannot be changed".into()));
        }
        Ok(MovieChanges {
            title: self.title.as_deref().map(movie_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(|d| required_text("description", d))
                .transpose()?,
            release_date: self.release_date,
        })
    }
}

fn cover_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "bin",
    }
}

pub fn cover_key(movie_id: Uuid, content_type: &str) -> String {
    format!("covers/{}.{}", movie_id, cover_extension(content_type))
}

#[derive(Clone)]
pub struct CatalogStore {
    movies: Arc<dyn MovieRepository>,
    blobs: Arc<dyn BlobStore>,
    timeout: Duration,
}

impl CatalogStore {
    pub fn new(movies: Arc<dyn MovieRepository>, blobs: Arc<dyn BlobStore>, timeout: Duration) -> Self {
        Self {
            movies,
            blobs,
            timeout,
        }
    }

    pub async fn add_movie(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
        release_date: Option<NaiveDate>,
    ) -> CatalogResult<Movie> {
        let new_movie = NewMovie {
            title: movie_title(title)?,
            description: required_text("description", description)?,
            release_date,
            added_by: owner_id,
        };
        let movie = bounded("movies.insert", self.timeout, self.movies.insert(new_movie)).await?;
        info!(movie_id = %movie.id, added_by = %owner_id, "movie added");
        Ok(movie)
    }

    pub async fn get_movie(&self, raw_id: &str) -> CatalogResult<Movie> {
        let movie_id = parse_movie_id(raw_id)?;
        self.find(movie_id).await
    }

    pub(crate) async fn find(&self, movie_id: Uuid) -> CatalogResult<Movie> {
        bounded("movies.find_by_id", self.timeout, self.movies.find_by_id(movie_id))
            .await?
            .ok_or(CatalogError::NotFound("movie"))
    }

    /// Partial update of title, description and release date.
    pub async fn update_movie(&self, raw_id: &str, patch: MoviePatch) -> CatalogResult<Movie> {
        let changes = patch.into_changes()?;
        let movie_id = parse_movie_id(raw_id)?;
        self.apply_changes(movie_id, changes).await
    }

    pub(crate) async fn apply_changes(&self, movie_id: Uuid, changes: MovieChanges) -> CatalogResult<Movie> {
        if changes.is_empty() {
            return self.find(movie_id).await;
        }
        let movie = bounded("movies.update", self.timeout, self.movies.update(movie_id, &changes))
            .await?
            .ok_or(CatalogError::NotFound("movie"))?;
        info!(movie_id = %movie.id, "movie updated");
        Ok(movie)
    }

    pub async fn delete_movie(&self, raw_id: &str) -> CatalogResult<()> {
        let movie_id = parse_movie_id(raw_id)?;
        self.remove(movie_id).await
    }

    pub(crate) async fn remove(&self, movie_id: Uuid) -> CatalogResult<()> {
        let deleted = bounded("movies.delete", self.timeout, self.movies.delete(movie_id)).await?;
        if !deleted {
            return Err(CatalogError::NotFound("movie"));
        }
        info!(movie_id = %movie_id, "movie deleted");
        Ok(())
    }

    /// Stores a cover image keyed by the movie id, replacing any previous one.
    pub async fn set_cover(&self, raw_id: &str, image: Vec<u8>, content_type: &str) -> CatalogResult<Movie> {
        let movie_id = parse_movie_id(raw_id)?;
        self.store_cover(movie_id, image, content_type).await
    }

    pub(crate) async fn store_cover(
        &self,
        movie_id: Uuid,
        image: Vec<u8>,
        content_type: &str,
    ) -> CatalogResult<Movie> {
        if image.is_empty() {
            return Err(CatalogError::Validation("cover must not be empty".into()));
        }
        // Fail before writing the blob if the movie is gone.
        let previous = self.find(movie_id).await?.cover_key;

        let key = cover_key(movie_id, content_type);
        let stored = bounded("covers.put", self.timeout, self.blobs.put(&key, image, content_type)).await?;
        let movie = bounded("movies.set_cover", self.timeout, self.movies.set_cover(movie_id, &stored))
            .await?
            .ok_or(CatalogError::NotFound("movie"))?;
        info!(movie_id = %movie_id, key = %stored, "cover stored");

        // A cover in another format lives under another key; drop the old object.
        if let Some(old) = previous.filter(|old| *old != stored) {
            if let Err(e) = bounded("covers.delete", self.timeout, self.blobs.delete(&old)).await {
                warn!(movie_id = %movie_id, key = %old, error = %e, "stale cover left behind");
            }
        }
        Ok(movie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(parse_movie_id("not-a-uuid"), Err(CatalogError::NotFound("movie"))));
        assert!(matches!(parse_movie_id(""), Err(CatalogError::NotFound("movie"))));
        let id = Uuid::new_v4();
        assert_eq!(parse_movie_id(&format!(" {id} ")).unwrap(), id);
    }

    #[test]
    fn patch_rejects_immutable_fields() {
        let patch = MoviePatch {
            added_by: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(matches!(patch.into_changes(), Err(CatalogError::Validation(_))));

        let patch = MoviePatch {
            id: Some(Uuid::new_v4()),
            title: Some("Alien".into()),
            ..Default::default()
        };
        assert!(matches!(patch.into_changes(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn patch_trims_text_and_rejects_blank_titles() {
        let patch = MoviePatch {
            title: Some("  Alien ".into()),
            ..Default::default()
        };
        let changes = patch.into_changes().unwrap();
        assert_eq!(changes.title.as_deref(), Some("Alien"));
        assert!(changes.description.is_none());

        let blank = MoviePatch {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(blank.into_changes(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn titles_are_capitalized_per_word() {
        assert_eq!(movie_title("  the godfather part II ").unwrap(), "The Godfather Part II");
        assert_eq!(movie_title("heat (1995)").unwrap(), "Heat (1995)");
        assert_eq!(movie_title("éclair").unwrap(), "Éclair");
        assert!(matches!(movie_title(" "), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn cover_keys_follow_the_content_type() {
        let id = Uuid::new_v4();
        assert_eq!(cover_key(id, "image/jpeg"), format!("covers/{id}.jpg"));
        assert_eq!(cover_key(id, "image/png"), format!("covers/{id}.png"));
        assert_eq!(cover_key(id, "image/webp"), format!("covers/{id}.webp"));
        assert_eq!(cover_key(id, "application/octet-stream"), format!("covers/{id}.bin"));
    }
}
