pub mod arrival;
pub mod cancel;
pub mod controller;
pub mod executor;
pub mod explorer;

pub use arrival::*;
pub use cancel::*;
pub use controller::*;
pub use executor::*;
pub use explorer::*;
