//! Authorization policy for mutations and reviews. No I/O: callers fetch what the
//! policy needs and evaluate it before invoking a mutating store operation.

use uuid::Uuid;

use crate::domain::Movie;

/// Only the user who added a movie may change or delete it.
pub fn can_modify(movie: &Movie, acting_user_id: Uuid) -> bool {
    movie.added_by == acting_user_id
}

/// A review requires proof of watch.
pub fn can_review(has_watched: bool) -> bool {
    has_watched
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn movie_added_by(owner: Uuid) -> Movie {
        Movie {
            id: Uuid::new_v4(),
            title: "Stalker".into(),
            description: "A guide leads two men through the Zone.".into(),
            release_date: None,
            cover_key: None,
            added_by: owner,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_the_owner_may_modify() {
        let owner = Uuid::new_v4();
        let movie = movie_added_by(owner);
        assert!(can_modify(&movie, owner));
        assert!(!can_modify(&movie, Uuid::new_v4()));
    }

    #[test]
    fn reviewing_needs_a_watch() {
        assert!(can_review(true));
        assert!(!can_review(false));
    }
}
