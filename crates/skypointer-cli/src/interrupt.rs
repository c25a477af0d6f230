//! Ctrl-C handling that never cuts a move short.
//!
//! The handler is armed before the hardware is touched, so SIGINT is always
//! caught. Callers look at the flag only between moves.

use crate::hardware::Signal;
use skypointer_core::hardware::OperatorSignal;
use skypointer_core::{PointerError, Result};
use tokio::sync::watch;

#[derive(Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Install the SIGINT handler. Returns once it is registered.
    pub async fn arm() -> anyhow::Result<Self> {
        let (tx, interrupt) = Self::channel();
        let (armed_tx, armed_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            // the first poll registers the handler
            let early = tokio::select! {
                biased;
                res = &mut ctrl_c => Some(res),
                _ = std::future::ready(()) => None,
            };
            let _ = armed_tx.send(());
            let res = match early {
                Some(res) => res,
                None => ctrl_c.await,
            };
            match res {
                Ok(()) => {
                    tracing::info!("interrupt received, stopping after the current move");
                    let _ = tx.send(true);
                }
                Err(e) => tracing::warn!(error = %e, "could not listen for Ctrl-C"),
            }
            // keep the channel open so waiters do not mistake exit for a signal
            std::future::pending::<()>().await;
        });

        armed_rx.await?;
        Ok(interrupt)
    }

    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|set| *set).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// The operator button, but reporting [`PointerError::Interrupted`] once
/// Ctrl-C has been seen. Calibration reads it between jogs only.
pub struct InterruptibleSignal {
    inner: Signal,
    interrupt: Interrupt,
}

impl InterruptibleSignal {
    pub fn new(inner: Signal, interrupt: Interrupt) -> Self {
        Self { inner, interrupt }
    }
}

impl OperatorSignal for InterruptibleSignal {
    fn is_pressed(&mut self) -> Result<bool> {
        if self.interrupt.is_set() {
            return Err(PointerError::Interrupted);
        }
        self.inner.is_pressed()
    }
}
