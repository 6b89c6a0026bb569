//! The transport boundary.
//!
//! The entity cache never talks HTTP directly; it goes through the
//! [`Transport`] trait so tests can script responses and count calls.

mod http;
mod routes;

use serde_json::Value;

use crate::error::Result;

pub use http::HttpTransport;
pub use routes::ApiRoute;

/// A synchronous request executor against named routes.
///
/// Implementations return the decoded `data` portion of the platform's
/// response envelope, or fail with a typed error carrying the remote code.
/// Timeouts are the implementation's concern; callers treat every call as
/// bounded.
pub trait Transport: Send + Sync {
    fn get(&self, route: &str) -> Result<Value>;

    fn post(&self, route: &str, body: &Value) -> Result<Value>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport for tests.

    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::Value;

    use crate::error::{Error, Result};

    use super::Transport;

    enum Fallback {
        /// Fail every unscripted request with this remote code.
        Failure(i32),
        /// Answer every unscripted request with a copy of this value.
        Value(Value),
    }

    struct Inner {
        replies: Mutex<VecDeque<Result<Value>>>,
        fallback: Fallback,
        calls: AtomicUsize,
    }

    /// Transport that pops one scripted reply per request and counts calls.
    ///
    /// Cloning shares the script and the counter, so tests can keep a handle
    /// after moving a clone into the client.
    #[derive(Clone)]
    pub(crate) struct MockTransport {
        inner: Arc<Inner>,
    }

    impl MockTransport {
        /// No script; every request fails with the given remote code.
        pub(crate) fn always_err(code: i32) -> Self {
            Self::with_fallback(Fallback::Failure(code))
        }

        /// No script; every request succeeds with a copy of `value`.
        pub(crate) fn always(value: Value) -> Self {
            Self::with_fallback(Fallback::Value(value))
        }

        fn with_fallback(fallback: Fallback) -> Self {
            Self {
                inner: Arc::new(Inner {
                    replies: Mutex::new(VecDeque::new()),
                    fallback,
                    calls: AtomicUsize::new(0),
                }),
            }
        }

        /// Queue one reply, served before the fallback kicks in.
        pub(crate) fn push(self, reply: Result<Value>) -> Self {
            self.inner.replies.lock().unwrap().push_back(reply);
            self
        }

        /// Queue one failing reply with the given remote code.
        pub(crate) fn push_err(self, code: i32) -> Self {
            self.push(Err(Error::BadResponse {
                code,
                message: format!("scripted failure {code}"),
            }))
        }

        pub(crate) fn calls(&self) -> usize {
            self.inner.calls.load(Ordering::SeqCst)
        }

        fn next(&self) -> Result<Value> {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(reply) = self.inner.replies.lock().unwrap().pop_front() {
                return reply;
            }
            match &self.inner.fallback {
                Fallback::Failure(code) => Err(Error::BadResponse {
                    code: *code,
                    message: format!("fallback failure {code}"),
                }),
                Fallback::Value(value) => Ok(value.clone()),
            }
        }
    }

    impl Transport for MockTransport {
        fn get(&self, _route: &str) -> Result<Value> {
            self.next()
        }

        fn post(&self, _route: &str, _body: &Value) -> Result<Value> {
            self.next()
        }
    }
}
