pub mod optimizer;
pub mod route;

pub use optimizer::*;
pub use route::*;
