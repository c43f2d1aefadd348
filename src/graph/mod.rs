pub mod room;
pub mod search;

pub use room::*;
pub use search::*;
