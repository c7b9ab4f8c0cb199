pub mod clr;
pub mod image;
pub mod pe;
pub mod version_info;

pub use pe::PeInspector;
