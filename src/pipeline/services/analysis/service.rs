use super::orchestrator::AnalysisOrchestrator;
use crate::pipeline::types::{AnalysisResult, RequestedType};
use futures::task::{Context, Poll};
use futures::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::util::BoxService;
use tower::ServiceBuilder;
use tower::Service;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub bytes: Arc<[u8]>,
    pub requested: RequestedType,
}

impl AnalysisRequest {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            requested: RequestedType::Auto,
        }
    }

    pub fn with_requested_type(mut self, requested: RequestedType) -> Self {
        self.requested = requested;
        self
    }
}

/// `tower::Service` over the orchestrator. Never errors on its own; the
/// result carries success or failure.
#[derive(Clone)]
pub struct AnalysisService {
    orchestrator: AnalysisOrchestrator,
}

impl AnalysisService {
    pub fn new(orchestrator: AnalysisOrchestrator) -> Self {
        Self { orchestrator }
    }
}

impl Service<AnalysisRequest> for AnalysisService {
    type Response = AnalysisResult;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AnalysisRequest) -> Self::Future {
        let orchestrator = self.orchestrator.clone();

        Box::pin(async move { Ok(orchestrator.analyze_image(&req.bytes, req.requested).await) })
    }
}

pub struct AnalysisServiceBuilder {
    orchestrator: AnalysisOrchestrator,
    timeout: Option<Duration>,
}

impl AnalysisServiceBuilder {
    pub fn new(orchestrator: AnalysisOrchestrator) -> Self {
        Self {
            orchestrator,
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> BoxService<AnalysisRequest, AnalysisResult, BoxError> {
        let service = ServiceBuilder::new()
            .option_layer(self.timeout.map(TimeoutLayer::new))
            .service(AnalysisService::new(self.orchestrator));

        BoxService::new(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::analysis::AnalysisConfig;
    use crate::pipeline::types::Source;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use tower::ServiceExt;

    fn png() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
            100,
            100,
            Rgb([255, 255, 255]),
        ));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn orchestrator() -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(AnalysisConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_analysis_service() {
        let mut service = AnalysisService::new(orchestrator());
        let result = service.call(AnalysisRequest::new(png())).await.unwrap();

        assert!(result.success);
        assert_eq!(result.source, Source::DescriptionOnly);
        assert!(result
            .summary
            .starts_with("This appears to be a grayscale or monochrome general image."));
    }

    #[tokio::test]
    async fn boxed_service_with_timeout() {
        let service = AnalysisServiceBuilder::new(orchestrator())
            .timeout(Duration::from_secs(30))
            .build();

        let result = service
            .oneshot(AnalysisRequest::new(b"garbage".to_vec()))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.source, Source::Error);
    }
}
