pub mod rename;
pub mod version;

pub use rename::*;
pub use version::*;
