mod post;
mod user;

pub use post::{Category, Comment, Post, PostId, Tag};
pub use user::{Role, UserProfile};
