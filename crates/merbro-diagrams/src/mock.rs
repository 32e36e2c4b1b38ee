//! In-memory page for tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::error::{DiagramError, Result};
use crate::page::{Clip, DiagramPage, OwnedPage};

/// Page double that replays canned evaluation results and records calls.
#[derive(Default)]
pub(crate) struct MockPage {
    responses: Mutex<VecDeque<Result<Value>>>,
    pub scripts: Mutex<Vec<String>>,
    pub viewports: Mutex<Vec<(u32, u32)>>,
    pub captures: Mutex<Vec<(Clip, bool)>>,
    png: Vec<u8>,
    releases: Arc<AtomicUsize>,
}

impl MockPage {
    pub fn new() -> Self {
        Self {
            png: sample_png(120, 80),
            ..Self::default()
        }
    }

    /// Queue a successful evaluation result.
    pub fn respond(self, value: Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(value));
        self
    }

    /// Queue a page exception.
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(DiagramError::evaluation(message)));
        self
    }

    pub fn with_png(mut self, png: Vec<u8>) -> Self {
        self.png = png;
        self
    }

    /// Counter of `release` calls, readable after the page is consumed.
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

impl DiagramPage for MockPage {
    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.scripts.lock().unwrap().push(script.to_owned());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }

    async fn resize_viewport(&self, width: u32, height: u32) -> Result<()> {
        self.viewports.lock().unwrap().push((width, height));
        Ok(())
    }

    async fn capture_png(&self, clip: Clip, beyond_viewport: bool) -> Result<Vec<u8>> {
        self.captures.lock().unwrap().push((clip, beyond_viewport));
        Ok(self.png.clone())
    }
}

impl OwnedPage for MockPage {
    async fn release(self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Minimal PNG header with the given dimensions.
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, // IHDR length
        b'I', b'H', b'D', b'R', // IHDR type
    ];
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[0; 5]);
    data
}
