mod movie;
mod rip;
mod visit;

pub use movie::{CastMember, Director, Genre, Movie};
pub use rip::MovieRip;
pub use visit::Visit;
