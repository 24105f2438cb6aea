pub mod ventusky;

pub use ventusky::{PageSource, VentuskyClient};
