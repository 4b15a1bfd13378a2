pub mod player;
pub mod rating_scheme;
