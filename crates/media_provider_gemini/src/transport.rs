use async_trait::async_trait;
use gemini_api::{
    DownloadedMedia, GeminiApiClient, GeminiApiError, GenerateContentRequest,
    GenerateContentResponse, Operation, PredictLongRunningRequest,
};

/// The handful of Gemini calls the gateway makes. Tests swap in a scripted fake.
#[async_trait]
pub(crate) trait GeminiTransport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError>;

    async fn start_video(
        &self,
        model: &str,
        request: &PredictLongRunningRequest,
    ) -> Result<Operation, GeminiApiError>;

    async fn poll_operation(&self, name: &str) -> Result<Operation, GeminiApiError>;

    async fn download(&self, uri: &str) -> Result<DownloadedMedia, GeminiApiError>;
}

#[derive(Debug)]
pub(crate) struct DefaultTransport {
    pub(crate) client: GeminiApiClient,
}

#[async_trait]
impl GeminiTransport for DefaultTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError> {
        self.client.generate_content(model, request).await
    }

    async fn start_video(
        &self,
        model: &str,
        request: &PredictLongRunningRequest,
    ) -> Result<Operation, GeminiApiError> {
        self.client.start_video_generation(model, request).await
    }

    async fn poll_operation(&self, name: &str) -> Result<Operation, GeminiApiError> {
        self.client.get_operation(name).await
    }

    async fn download(&self, uri: &str) -> Result<DownloadedMedia, GeminiApiError> {
        self.client.download(uri).await
    }
}
