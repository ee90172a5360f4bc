pub mod content;
pub mod index;
pub mod upload;

pub use content::content;
pub use index::index;
pub use upload::upload;
