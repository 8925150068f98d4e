pub mod error;
pub mod forecast;
pub mod reading;
pub mod recommendation;
pub mod usage;

pub use error::*;
pub use forecast::*;
pub use reading::*;
pub use recommendation::*;
pub use usage::*;
