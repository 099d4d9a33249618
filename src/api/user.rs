use super::ApiClient;
use crate::{
    dto::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    },
    errors::ClientError,
    models::UserProfile,
};
use reqwest::Method;

impl ApiClient {
    /// POST /api/auth/login
    /// Body: { "username": "...", "password": "..." }
    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let request = self.request(Method::POST, "/api/auth/login")?.json(payload);
        self.send_json(request).await
    }

    /// POST /api/auth/register
    /// Body: { "username": "...", "email": "...", "password": "...", ... }
    pub async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let request = self.request(Method::POST, "/api/auth/register")?.json(payload);
        self.send_json(request).await
    }

    /// GET /api/auth/me
    /// Headers: Authorization: Bearer <token>
    pub async fn current_user(&self) -> Result<UserProfile, ClientError> {
        let request = self.request(Method::GET, "/api/auth/me")?;
        self.send_json(request).await
    }

    /// PUT /api/users/profile
    /// Headers: Authorization: Bearer <token>
    pub async fn update_profile(
        &self,
        payload: &UpdateProfileRequest,
    ) -> Result<UserProfile, ClientError> {
        let request = self.request(Method::PUT, "/api/users/profile")?.json(payload);
        self.send_json(request).await
    }

    /// PUT /api/users/password
    /// Headers: Authorization: Bearer <token>
    pub async fn change_password(&self, payload: &ChangePasswordRequest) -> Result<(), ClientError> {
        let request = self.request(Method::PUT, "/api/users/password")?.json(payload);
        self.send_empty(request).await
    }
}
