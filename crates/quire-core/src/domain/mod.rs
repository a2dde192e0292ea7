//! Domain entities - the core business objects.

mod page;
mod post;
mod sync;
mod taxonomy;

pub use page::Page;
pub use post::{Post, PostFields};
pub use sync::TagSync;
pub use taxonomy::{Category, Tag};
