pub mod auth;
pub mod details;
pub mod health;
pub mod movies;
pub mod validation;

pub use auth::{current_session, sign_in, sign_out, sign_up};
pub use details::movie_details;
pub use health::health_check;
pub use movies::{add_movie, delete_movie, list_movies, movie_count};
pub use validation::{require_owner, require_session, timestamp_to_rfc3339};
