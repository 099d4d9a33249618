//! Client-side data layer for the blog: typed access to the REST backend,
//! a session store with durable token storage, and a content store whose
//! listing views (filter, sort, paginate) are derived on every read.

pub mod api;
pub mod config;
pub mod dto;
pub mod errors;
pub mod messages;
pub mod models;
pub mod states;
pub mod storage;
pub mod stores;

mod sync;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use errors::{ActionError, ClientError};
pub use messages::Locale;
pub use states::AppState;
