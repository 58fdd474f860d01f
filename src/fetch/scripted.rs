//! In-memory fetcher whose requests stay pending until a test settles them.

use std::collections::{HashMap, VecDeque};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::Fetcher;
use crate::cache::TranslationGroup;
use crate::error::FetchError;

type Reply = Result<TranslationGroup, FetchError>;

#[derive(Default)]
struct Script {
    requests: Vec<String>,
    pending: HashMap<String, VecDeque<oneshot::Sender<Reply>>>,
}

pub(crate) struct ScriptedFetcher {
    script: Mutex<Script>,
    honor_cancel: bool,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            honor_cancel: true,
        }
    }

    /// A transport that ignores cancellation and still delivers whatever
    /// reply it is given.
    pub(crate) fn ignoring_cancel() -> Self {
        Self {
            honor_cancel: false,
            ..Self::new()
        }
    }

    /// Every URL requested so far, in order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.script.lock().requests.clone()
    }

    pub(crate) fn request_count(&self, url: &str) -> usize {
        self.script.lock().requests.iter().filter(|r| *r == url).count()
    }

    /// Settle the oldest pending request for `url`. False if none is pending
    /// or its fetch future has already gone away.
    pub(crate) fn reply(&self, url: &str, reply: Reply) -> bool {
        let sender = self
            .script
            .lock()
            .pending
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        match sender {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    pub(crate) fn reply_json(&self, url: &str, body: Value) -> bool {
        match body {
            Value::Object(group) => self.reply(url, Ok(group)),
            other => panic!("scripted body must be an object, got {other}"),
        }
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(
        &self,
        url: String,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<TranslationGroup, FetchError>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut script = self.script.lock();
            script.requests.push(url.clone());
            script.pending.entry(url).or_default().push_back(tx);
        }
        let honor_cancel = self.honor_cancel;
        Box::pin(async move {
            if honor_cancel {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(FetchError::Cancelled),
                    reply = rx => reply.unwrap_or(Err(FetchError::Cancelled)),
                }
            } else {
                rx.await.unwrap_or(Err(FetchError::Cancelled))
            }
        })
    }
}
