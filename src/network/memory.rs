use crate::network::client::PageFetcher;
use crate::network::errors::NetworkError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// * Serves pages from memory: replaying saved pages, or scripting failures in tests.
// * Each URL owns a queue of responses; the last one repeats once the queue drains.
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    pages: Mutex<HashMap<String, VecDeque<Result<String, String>>>>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    // * Queues a successful response for `url`
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.push(url.into(), Ok(body.into()));
        self
    }

    // * Queues a transport failure for `url`
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(url.into(), Err(message.into()));
        self
    }

    fn push(&self, url: String, response: Result<String, String>) {
        let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        pages.entry(url).or_default().push_back(response);
    }

    // * Every URL fetched so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PageFetcher for InMemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<String, NetworkError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());

        let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        let queue = pages.get_mut(url).ok_or(NetworkError::HttpStatus(404))?;

        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match response {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(NetworkError::Simulated(message)),
            None => Err(NetworkError::EmptyResponse),
        }
    }
}
