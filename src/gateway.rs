use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

use crate::model::{
    ChatRequest, ChatResponse, CompletionRequest, CompletionResponse, ImageRequest, ImageResponse,
};

pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a>>;

/// Hosted model API: one call per method, no state between calls.
pub trait RemoteGateway {
    fn deployment(&self) -> &str;

    fn completions<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> GatewayFuture<'a, CompletionResponse>;

    fn chat_completions<'a>(&'a self, request: ChatRequest) -> GatewayFuture<'a, ChatResponse>;

    fn image_generations<'a>(&'a self, request: ImageRequest) -> GatewayFuture<'a, ImageResponse>;
}

/// Model runtime on the user's machine, already bound to one model.
pub trait LocalGateway {
    fn model_name(&self) -> &str;

    fn generate<'a>(&'a self, prompt: String) -> GatewayFuture<'a, String>;
}
