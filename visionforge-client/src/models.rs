//! Model catalog endpoints

use crate::VisionForgeClient;
use crate::error::Result;
use visionforge_core::domain::model::ModelInfo;

impl VisionForgeClient {
    /// List trained models, newest first
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self.client.get(self.url("/models")).send().await?;

        self.handle_response(response).await
    }

    /// Get a model by file name
    pub async fn get_model(&self, model_name: &str) -> Result<ModelInfo> {
        let url = self.url(&format!("/models/{}", model_name));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
