mod requests;
mod responses;

pub use requests::{
    ChangePasswordRequest, CreateCommentRequest, CreatePostRequest, LoginRequest,
    RegisterRequest, UpdatePostRequest, UpdateProfileRequest,
};
pub use responses::{AuthResponse, ErrorBody, LikeResponse};
