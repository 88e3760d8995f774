// ── Catalog domain model ──
//
// One module per resource. Each record type implements `Resource` and owns
// its create/update inputs, their validation rules and its table columns.

pub mod entity_id;

pub mod genre;
pub mod movie;
pub mod rental;
pub mod tag;
pub mod user;

pub use entity_id::EntityId;

pub use genre::{CreateGenreRequest, Genre, UpdateGenreRequest};
pub use movie::{CreateMovieRequest, Movie, UpdateMovieRequest};
pub use rental::{CreateRentalRequest, Rental, RentalStatus, UpdateRentalRequest};
pub use tag::{CreateTagRequest, Tag, UpdateTagRequest};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserRole};
