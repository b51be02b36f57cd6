//! Async Driver
//!
//! Runs a runtime's deferred work on a current-thread `tokio` runtime:
//! scheduled flushes as soon as the driver is woken (after the configured
//! flush delay), and the garbage-collection sweep when its timer expires.
//!
//! The reactive runtime is `!Send`, so the driver must be polled on the
//! thread that owns it, e.g. inside `LocalSet::run_until` or `join!`.
//!
//! ```rust
//! use std::rc::Rc;
//! use weft_core::{driver, MemoryTree, Runtime};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let rt = Runtime::new(Rc::new(MemoryTree::new()));
//! let count = rt.signal(1);
//! let c = count.clone();
//! let doubled = rt.derive(move || c.get() * 2);
//!
//! let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
//! let work = async {
//!     count.set(21);
//!     tokio::time::sleep(std::time::Duration::from_millis(5)).await;
//!     assert_eq!(doubled.get(), 42);
//!     let _ = stop.send(());
//! };
//! tokio::join!(driver::drive(rt.clone(), async { let _ = stopped.await; }), work);
//! # }
//! ```

use std::future::Future;
use std::time::Instant;

use tracing::{debug, trace};

use crate::reactive::Runtime;

/// Drive `runtime` until `shutdown` resolves.
pub async fn drive<S>(runtime: Runtime, shutdown: S)
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    debug!("reactive driver started");

    loop {
        if runtime.has_pending_flush() {
            let delay = runtime.config().flush_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let reports = runtime.run_microtasks();
            trace!(flushes = reports.len(), "ran scheduled flushes");
        }

        let deadline = runtime.next_timer();
        tokio::select! {
            _ = &mut shutdown => break,
            _ = runtime.inner.wake.notified() => {}
            _ = sleep_until(deadline) => {
                runtime.run_timers(Instant::now());
            }
        }
    }

    debug!("reactive driver stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::host::{HostTree, MemoryTree};
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn flushes_when_woken() {
        let tree = Rc::new(MemoryTree::new());
        let rt = Runtime::new(tree.clone());
        let root = tree.document();
        let count = rt.signal(0i64);
        let c = count.clone();
        let handle = rt.bind(move |_| c.get().into());
        rt.attach(root, [handle]);

        let (stop, stopped) = oneshot::channel::<()>();
        let work = async {
            count.set(7);
            assert_eq!(tree.text_content(root), "0");
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(tree.text_content(root), "7");
            assert!(!rt.has_pending_flush());
            let _ = stop.send(());
        };

        tokio::join!(
            drive(rt.clone(), async {
                let _ = stopped.await;
            }),
            work
        );
    }

    #[tokio::test]
    async fn sweeps_on_its_timer() {
        let tree = Rc::new(MemoryTree::new());
        let config = Config {
            gc_interval_ms: 20,
            ..Config::default()
        };
        let rt = Runtime::with_config(tree.clone(), config).unwrap();
        let label = rt.signal("a".to_string());
        let l = label.clone();
        let handle = rt.bind(move |_| l.get().into());
        rt.attach(tree.document(), [handle.clone()]);
        assert!(rt.next_timer().is_some());

        let (stop, stopped) = oneshot::channel::<()>();
        let work = async {
            tree.remove_node(handle.identity());
            tokio::time::sleep(Duration::from_millis(80)).await;
            assert!(rt.next_timer().is_none());
            assert_eq!(label.binding_count(), 0);
            let _ = stop.send(());
        };

        tokio::join!(
            drive(rt.clone(), async {
                let _ = stopped.await;
            }),
            work
        );
    }

    #[tokio::test]
    async fn honours_flush_delay() {
        let tree = Rc::new(MemoryTree::new());
        let config = Config {
            flush_delay_ms: 30,
            ..Config::default()
        };
        let rt = Runtime::with_config(tree, config).unwrap();
        let a = rt.signal(1);
        let a2 = a.clone();
        let b = rt.derive(move || a2.get() + 1);

        let (stop, stopped) = oneshot::channel::<()>();
        let work = async {
            a.set(10);
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(b.get(), 2);
            tokio::time::sleep(Duration::from_millis(80)).await;
            assert_eq!(b.get(), 11);
            let _ = stop.send(());
        };

        tokio::join!(
            drive(rt.clone(), async {
                let _ = stopped.await;
            }),
            work
        );
    }
}
