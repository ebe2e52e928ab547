use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use msgsched::dag::Dispatched;
use msgsched::errors::Result;
use msgsched::exec::DispatchSink;

/// A dispatch sink that records released ids in push order and never blocks.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    released: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything released so far.
    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

impl DispatchSink for RecordingSink {
    fn dispatch(
        &mut self,
        batch: Vec<Dispatched>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let released = Arc::clone(&self.released);

        Box::pin(async move {
            let mut guard = released.lock().unwrap();
            guard.extend(batch.into_iter().map(|d| d.id.to_string()));
            Ok(())
        })
    }
}
