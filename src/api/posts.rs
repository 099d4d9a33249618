use super::ApiClient;
use crate::{
    dto::{CreateCommentRequest, CreatePostRequest, LikeResponse, UpdatePostRequest},
    errors::ClientError,
    models::{Comment, Post, PostId},
};
use reqwest::Method;

impl ApiClient {
    /// GET /api/posts
    pub async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        let request = self.request(Method::GET, "/api/posts")?;
        self.send_json(request).await
    }

    /// GET /api/posts/{id}
    pub async fn get_post(&self, id: PostId) -> Result<Post, ClientError> {
        let request = self.request(Method::GET, &format!("/api/posts/{id}"))?;
        self.send_json(request).await
    }

    /// POST /api/posts
    /// Headers: Authorization: Bearer <token>
    pub async fn create_post(&self, payload: &CreatePostRequest) -> Result<Post, ClientError> {
        let request = self.request(Method::POST, "/api/posts")?.json(payload);
        self.send_json(request).await
    }

    /// PUT /api/posts/{id}
    /// Headers: Authorization: Bearer <token>
    pub async fn update_post(
        &self,
        id: PostId,
        payload: &UpdatePostRequest,
    ) -> Result<Post, ClientError> {
        let request = self
            .request(Method::PUT, &format!("/api/posts/{id}"))?
            .json(payload);
        self.send_json(request).await
    }

    /// DELETE /api/posts/{id}
    /// Headers: Authorization: Bearer <token>
    pub async fn delete_post(&self, id: PostId) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &format!("/api/posts/{id}"))?;
        self.send_empty(request).await
    }

    /// POST /api/posts/{id}/like
    pub async fn like_post(&self, id: PostId) -> Result<LikeResponse, ClientError> {
        let request = self.request(Method::POST, &format!("/api/posts/{id}/like"))?;
        self.send_json(request).await
    }

    /// POST /api/posts/{id}/unlike
    pub async fn unlike_post(&self, id: PostId) -> Result<LikeResponse, ClientError> {
        let request = self.request(Method::POST, &format!("/api/posts/{id}/unlike"))?;
        self.send_json(request).await
    }

    /// POST /api/posts/{id}/comments
    /// Body: { "content": "...", "postId": id }
    pub async fn add_comment(&self, payload: &CreateCommentRequest) -> Result<Comment, ClientError> {
        let request = self
            .request(Method::POST, &format!("/api/posts/{}/comments", payload.post_id))?
            .json(payload);
        self.send_json(request).await
    }
}
