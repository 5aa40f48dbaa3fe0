use crate::core::errors::ExchangeError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

pub type ResponseResult = Result<Vec<u8>, ExchangeError>;

/// Requests blocked in `write_sync`, keyed by request id
///
/// Every operation takes the single table lock, so lookup-and-remove on delivery,
/// removal on timeout and the bulk failure on disconnect can never interleave.
/// An entry leaves the table exactly once and its sender fires at most once.
#[derive(Default)]
pub struct PendingRequests {
    requests: Mutex<HashMap<String, oneshot::Sender<ResponseResult>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<ResponseResult>>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `request_id` and return the slot its response will land in
    pub fn register(
        &self,
        request_id: &str,
    ) -> Result<oneshot::Receiver<ResponseResult>, ExchangeError> {
        let mut requests = self.lock();
        if requests.contains_key(request_id) {
            return Err(ExchangeError::DuplicateRequestId(request_id.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        requests.insert(request_id.to_string(), tx);
        Ok(rx)
    }

    /// Hand `frame` to the waiter registered under `request_id`
    ///
    /// The frame comes back as `Err` when nobody is waiting for it, so the caller
    /// can route it elsewhere.
    pub fn resolve(&self, request_id: &str, frame: Vec<u8>) -> Result<(), Vec<u8>> {
        let mut requests = self.lock();
        let Some(tx) = requests.remove(request_id) else {
            return Err(frame);
        };
        match tx.send(Ok(frame)) {
            Ok(()) => Ok(()),
            Err(Ok(frame)) => Err(frame),
            Err(Err(_)) => Ok(()),
        }
    }

    /// Deregister without notifying; false if the entry was already resolved
    pub fn remove(&self, request_id: &str) -> bool {
        self.lock().remove(request_id).is_some()
    }

    /// Resolve every waiter with an error built by `error`
    pub fn fail_all(&self, error: impl Fn() -> ExchangeError) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(Err(error()));
        }
        count
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.lock().contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
