//! Streaming dispatch
//!
//! One background task per stream selects the provider, relays chunks as
//! they arrive, and reports at most one error. Failover is only possible
//! before the first chunk reaches the caller.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use uniroute_llm::{ChatRequest, LlmError, Provider, RequestContext, StreamChunk};

use crate::error::GatewayError;
use crate::router::Router;

/// Output of [`Router::route_stream`]
///
/// Both channels close when the worker exits. The error channel carries at
/// most one error and closes empty on success.
#[derive(Debug)]
pub struct RoutedStream {
    /// Chunks in arrival order
    pub chunks: mpsc::Receiver<StreamChunk>,
    /// Terminal error, if the stream failed
    pub error: oneshot::Receiver<GatewayError>,
}

impl RoutedStream {
    /// Drain every chunk, then report the stream's error if there was one
    pub async fn collect(mut self) -> Result<Vec<StreamChunk>, GatewayError> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.chunks.recv().await {
            chunks.push(chunk);
        }

        match self.error.await {
            Ok(error) => Err(error),
            Err(_) => Ok(chunks),
        }
    }
}

/// How one candidate's stream ended
enum Relay {
    /// Stream finished cleanly after forwarding `forwarded` chunks
    Finished { forwarded: usize },
    /// Stream failed before anything reached the caller
    FailedEarly(LlmError),
    /// Stream failed after output had been forwarded
    FailedLate(LlmError),
    /// Caller dropped the chunk receiver
    Abandoned,
}

impl Router {
    /// Stream `request` from the best provider
    ///
    /// Must be called within a Tokio runtime. Cancelling the context aborts
    /// the worker and reports [`GatewayError::Cancelled`].
    pub fn route_stream(&self, context: &RequestContext, request: ChatRequest) -> RoutedStream {
        let (chunk_tx, chunk_rx) = mpsc::channel(self.inner.stream_buffer);
        let (error_tx, error_rx) = oneshot::channel();

        let router = self.clone();
        let context = context.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = context.cancellation().cancelled() => Err(GatewayError::Cancelled),
                outcome = router.stream_worker(&context, &request, &chunk_tx) => outcome,
            };

            if let Err(e) = outcome {
                tracing::warn!(model = %request.model, error = %e, "stream failed");
                let _ = error_tx.send(e);
            }
        });

        RoutedStream {
            chunks: chunk_rx,
            error: error_rx,
        }
    }

    async fn stream_worker(
        &self,
        context: &RequestContext,
        request: &ChatRequest,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> Result<(), GatewayError> {
        let mut candidates = self.dispatch(context, request).await?.candidates;

        let Some(selected) = candidates.first().cloned() else {
            return Err(GatewayError::NoProvidersRegistered);
        };

        if !selected.capabilities().streaming {
            return self.stream_from_chat(context, request, &selected, tx).await;
        }

        if request.is_local_model() {
            candidates.truncate(1);
        }

        let mut attempts = 0;
        let mut last_error = None;

        for provider in &candidates {
            attempts += 1;
            let start = Instant::now();
            let relay = relay(context, request, provider, tx).await;
            self.latency_tracker().record(provider.name(), start.elapsed());

            match relay {
                Relay::Finished { forwarded: 0 } => {
                    tracing::debug!(provider = %provider.name(), "stream ended without output");
                    return if self.inner.empty_stream_is_error {
                        Err(GatewayError::EmptyStream)
                    } else {
                        Ok(())
                    };
                }
                Relay::Finished { forwarded } => {
                    tracing::info!(provider = %provider.name(), chunks = forwarded, "stream routed");
                    return Ok(());
                }
                Relay::Abandoned => {
                    tracing::debug!(provider = %provider.name(), "stream receiver dropped");
                    return Ok(());
                }
                Relay::FailedLate(source) => {
                    return Err(GatewayError::StreamInterrupted {
                        provider: provider.name().to_owned(),
                        source,
                    });
                }
                Relay::FailedEarly(e) => {
                    tracing::warn!(
                        provider = %provider.name(),
                        attempt = attempts,
                        error = %e,
                        "stream attempt failed before output"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => Err(GatewayError::AllProvidersFailed { attempts, source }),
            None => Ok(()),
        }
    }

    /// Serve a non-streaming provider as a single terminal chunk
    async fn stream_from_chat(
        &self,
        context: &RequestContext,
        request: &ChatRequest,
        provider: &Arc<dyn Provider>,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> Result<(), GatewayError> {
        let start = Instant::now();
        let result = provider.chat(request, context).await;
        self.latency_tracker().record(provider.name(), start.elapsed());

        let response = result.map_err(|source| GatewayError::AllProvidersFailed { attempts: 1, source })?;

        let chunk = StreamChunk {
            id: response.id.clone(),
            content: response.content(),
            done: true,
            usage: Some(response.usage),
            provider: Some(provider.name().to_owned()),
        };

        tracing::info!(provider = %provider.name(), "stream served from single response");
        let _ = tx.send(chunk).await;
        Ok(())
    }
}

/// Forward one candidate's chunks, closing with a terminal chunk if the provider sent none
async fn relay(
    context: &RequestContext,
    request: &ChatRequest,
    provider: &Arc<dyn Provider>,
    tx: &mpsc::Sender<StreamChunk>,
) -> Relay {
    let mut stream = match provider.chat_stream(request, context).await {
        Ok(stream) => stream,
        Err(e) => return Relay::FailedEarly(e),
    };

    let mut forwarded = 0;
    let mut last_id = String::new();

    while let Some(item) = stream.next().await {
        let mut chunk = match item {
            Ok(chunk) => chunk,
            Err(e) if forwarded == 0 => return Relay::FailedEarly(e),
            Err(e) => return Relay::FailedLate(e),
        };

        chunk.provider = Some(provider.name().to_owned());
        last_id.clone_from(&chunk.id);
        let done = chunk.done;

        if tx.send(chunk).await.is_err() {
            return Relay::Abandoned;
        }
        forwarded += 1;

        if done {
            return Relay::Finished { forwarded };
        }
    }

    if forwarded > 0 {
        let mut terminal = StreamChunk::terminal(last_id);
        terminal.provider = Some(provider.name().to_owned());
        if tx.send(terminal).await.is_err() {
            return Relay::Abandoned;
        }
    }

    Relay::Finished { forwarded }
}
