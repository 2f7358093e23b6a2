use anyhow::{Context, Result, anyhow};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::dispatcher::messages::{Request, Response};
use crate::search::{SearchIndex, SearchOptions};

/// Name of the worker thread
const WORKER_THREAD_NAME: &str = "query-dispatcher";

/// Whether an index is available to answer queries
#[derive(Debug, Default)]
pub enum DispatcherState {
    /// No document set received yet
    #[default]
    Uninitialized,
    /// Serving queries from this index
    Ready(SearchIndex),
}

/// Owns the search index and turns requests into responses
#[derive(Debug, Default)]
pub struct QueryDispatcher {
    state: DispatcherState,
    options: SearchOptions,
}

impl QueryDispatcher {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            state: DispatcherState::Uninitialized,
            options,
        }
    }

    pub fn state(&self) -> &DispatcherState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, DispatcherState::Ready(_))
    }

    /// Handle one request. Queries arriving before any index exists are
    /// dropped and produce no response.
    pub fn handle(&mut self, request: Request) -> Option<Response> {
        match request {
            Request::BuildIndex { documents } => {
                match SearchIndex::from_documents(&documents, self.options.clone()) {
                    Ok(index) => {
                        let entries = index.len();
                        tracing::info!(
                            "Search index created with {} entries from {} documents",
                            entries,
                            documents.len()
                        );
                        self.state = DispatcherState::Ready(index);
                        Some(Response::IndexBuilt {
                            documents: documents.len(),
                            entries,
                        })
                    }
                    Err(e) => {
                        tracing::error!("Failed to build search index: {:#}", e);
                        Some(Response::IndexFailed {
                            error: format!("{e:#}"),
                        })
                    }
                }
            }
            Request::Query { id, text } => {
                let DispatcherState::Ready(index) = &self.state else {
                    tracing::debug!("Dropping query {} received before any index was built", id);
                    return None;
                };

                tracing::debug!("Searching for query: {}", text);
                let results = index.query(&text).unwrap_or_else(|e| {
                    tracing::warn!("Query {} failed: {:#}", id, e);
                    Vec::new()
                });

                Some(Response::Results {
                    id,
                    query: text,
                    results,
                })
            }
        }
    }
}

/// Caller side of a running dispatcher
#[derive(Debug)]
pub struct DispatcherHandle {
    requests: UnboundedSender<Request>,
    responses: UnboundedReceiver<Response>,
    thread: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Queue a request; never blocks
    pub fn post(&self, request: Request) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| anyhow!("Query dispatcher has stopped"))
    }

    /// Next response, or `None` once the worker has stopped
    pub async fn recv(&mut self) -> Option<Response> {
        self.responses.recv().await
    }

    /// Next response if one is already waiting
    pub fn try_recv(&mut self) -> Option<Response> {
        self.responses.try_recv().ok()
    }

    /// Stop the worker after it drains queued requests and wait for it to exit
    pub fn shutdown(self) -> Result<()> {
        let DispatcherHandle {
            requests, thread, ..
        } = self;
        drop(requests);

        if let Some(thread) = thread {
            thread
                .join()
                .map_err(|_| anyhow!("Query dispatcher thread panicked"))?;
        }
        Ok(())
    }
}

/// Start a dispatcher on its own thread.
///
/// The thread exits once every [`DispatcherHandle`] sender is gone.
pub fn spawn_dispatcher(options: SearchOptions) -> Result<DispatcherHandle> {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    let dispatcher = QueryDispatcher::new(options);

    let thread = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run(dispatcher, request_rx, response_tx))
        .context("Failed to spawn query dispatcher thread")?;

    Ok(DispatcherHandle {
        requests: request_tx,
        responses: response_rx,
        thread: Some(thread),
    })
}

fn run(
    mut dispatcher: QueryDispatcher,
    mut requests: UnboundedReceiver<Request>,
    responses: UnboundedSender<Response>,
) {
    while let Some(request) = requests.blocking_recv() {
        if let Some(response) = dispatcher.handle(request) {
            if responses.send(response).is_err() {
                tracing::debug!("Response receiver dropped, stopping query dispatcher");
                break;
            }
        }
    }
    tracing::debug!("Query dispatcher stopped");
}
