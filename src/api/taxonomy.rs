use super::ApiClient;
use crate::{
    errors::ClientError,
    models::{Category, Tag},
};
use reqwest::Method;

impl ApiClient {
    /// GET /api/categories
    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        let request = self.request(Method::GET, "/api/categories")?;
        self.send_json(request).await
    }

    /// GET /api/tags
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ClientError> {
        let request = self.request(Method::GET, "/api/tags")?;
        self.send_json(request).await
    }
}
