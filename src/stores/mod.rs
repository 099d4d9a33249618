//! Client-side state containers fronting the REST API.

mod content;
mod session;
pub mod view;

pub use content::ContentStore;
pub use session::{Session, SessionStore};
pub use view::{DEFAULT_PAGE_SIZE, Page, SearchParams, SearchUpdate};
