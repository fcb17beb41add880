//! Stateless helpers behind the small utility commands.

pub mod facts;
pub mod random;
pub mod spelling;
pub mod weather;
pub mod wiki;
