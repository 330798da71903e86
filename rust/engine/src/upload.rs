// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Upload coalescing
//!
//! Concurrent uploads of the same source share one in-flight request. Every
//! caller that joins while it runs receives the same resolved value; the
//! entry is dropped once it settles so a later upload starts afresh.

use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use rustc_hash::FxHashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

type SharedUpload<T> = Shared<BoxFuture<'static, std::result::Result<T, String>>>;

pub struct UploadCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    in_flight: Arc<Mutex<FxHashMap<String, SharedUpload<T>>>>,
}

impl<T> Clone for UploadCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> Default for UploadCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }
}

impl<T> UploadCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `start` for `key` unless an upload for it is already in flight, in
    /// which case wait for that one instead.
    pub async fn upload<F, Fut>(&self, key: &str, start: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, String>> + Send + 'static,
    {
        let shared = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(key) {
                Some(existing) => {
                    tracing::debug!(key, "joining in-flight upload");
                    existing.clone()
                }
                None => {
                    tracing::debug!(key, "starting upload");
                    let shared = start().boxed().shared();
                    in_flight.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };

        let result = shared.clone().await;

        let mut in_flight = self.in_flight.lock().await;
        if in_flight.get(key).map_or(false, |current| current.ptr_eq(&shared)) {
            in_flight.remove(key);
        }
        drop(in_flight);

        result.map_err(Error::Upload)
    }

    /// Number of distinct keys currently uploading
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counted(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> BoxFuture<'static, std::result::Result<String, String>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(value.to_string())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn concurrent_uploads_share_one_request() {
        let coalescer = UploadCoalescer::<String>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            coalescer.upload("site.3dm", counted(&calls, "url-1")),
            coalescer.upload("site.3dm", counted(&calls, "url-2")),
            coalescer.upload("site.3dm", counted(&calls, "url-3")),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), "url-1");
        assert_eq!(b.unwrap(), "url-1");
        assert_eq!(c.unwrap(), "url-1");
        assert_eq!(coalescer.in_flight().await, 0);
    }

    #[tokio::test]
    async fn distinct_keys_and_later_uploads_run_separately() {
        let coalescer = UploadCoalescer::<String>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            coalescer.upload("a.glb", counted(&calls, "a")),
            coalescer.upload("b.glb", counted(&calls, "b")),
        );
        assert_eq!((a.unwrap().as_str(), b.unwrap().as_str()), ("a", "b"));

        let again = coalescer.upload("a.glb", counted(&calls, "a2")).await.unwrap();
        assert_eq!(again, "a2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failures_surface_as_upload_errors() {
        let coalescer = UploadCoalescer::<String>::new();
        let failing = || async { Err::<String, _>("403 forbidden".to_string()) };

        let (a, b) = tokio::join!(
            coalescer.upload("site.3dm", failing),
            coalescer.upload("site.3dm", failing),
        );
        assert!(matches!(a, Err(Error::Upload(ref m)) if m == "403 forbidden"));
        assert!(matches!(b, Err(Error::Upload(_))));
    }
}
