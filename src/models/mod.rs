pub mod conditions;
pub mod forecast;

pub use conditions::*;
pub use forecast::*;
