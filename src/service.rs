//! Async front end for a [`Driver`].
//!
//! The driver is owned by a dedicated task that receives commands over a
//! bounded mpsc channel, so any number of requesters can share one
//! transactor without a lock. Packets are processed strictly in arrival
//! order, which is what keeps NextExpectedId meaningful.
//!
//! ```text
//! Requester 1 ─┐
//! Requester 2 ─┼─► mpsc::Sender<Command> ─► Service Task ─► Driver
//! Requester N ─┘        ◄── oneshot reply ──┘
//! ```

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::TransactorConfig;
use crate::driver::{Driver, Response};
use crate::engine::TransactionEngine;
use crate::error::{Result, TransactorError};
use crate::protocol::Packet;

/// Work item for the service task.
#[derive(Debug)]
enum Command {
    Process {
        words: Vec<u32>,
        reply: oneshot::Sender<Result<Response>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    NextExpectedId {
        reply: oneshot::Sender<u16>,
    },
}

/// Handle for talking to the service task.
///
/// Cheap to clone. The task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct TransactorHandle {
    tx: mpsc::Sender<Command>,
}

impl TransactorHandle {
    /// Run a packet and wait for its response.
    pub async fn submit(&self, packet: &Packet) -> Result<Response> {
        self.submit_words(packet.words()?).await
    }

    /// Run raw inbound words and wait for the response.
    pub async fn submit_words(&self, words: Vec<u32>) -> Result<Response> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Process { words, reply }).await?;
        rx.await.map_err(|_| TransactorError::ServiceClosed)?
    }

    /// Assert the global reset.
    pub async fn reset(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reset { reply }).await?;
        rx.await.map_err(|_| TransactorError::ServiceClosed)
    }

    /// Current NextExpectedId.
    pub async fn next_expected_id(&self) -> Result<u16> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::NextExpectedId { reply }).await?;
        rx.await.map_err(|_| TransactorError::ServiceClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| TransactorError::ServiceClosed)
    }
}

/// Spawn the service task around a new [`Driver`].
///
/// Returns the handle and the task's `JoinHandle`, which resolves once all
/// handles are dropped.
pub fn spawn_transactor_task<E>(
    config: TransactorConfig,
    engine: E,
) -> Result<(TransactorHandle, JoinHandle<Result<()>>)>
where
    E: TransactionEngine + Send + 'static,
{
    let capacity = config.channel_capacity;
    let driver = Driver::new(config, engine)?;
    let (tx, rx) = mpsc::channel(capacity);

    let task = tokio::spawn(service_loop(rx, driver));

    Ok((TransactorHandle { tx }, task))
}

async fn service_loop<E>(mut rx: mpsc::Receiver<Command>, mut driver: Driver<E>) -> Result<()>
where
    E: TransactionEngine,
{
    while let Some(command) = rx.recv().await {
        match command {
            Command::Process { words, reply } => {
                let result = driver.process_words(&words);
                if let Err(e) = &result {
                    tracing::warn!("Packet failed: {}", e);
                }
                // Requester may have given up waiting
                let _ = reply.send(result);
            }
            Command::Reset { reply } => {
                driver.reset();
                let _ = reply.send(());
            }
            Command::NextExpectedId { reply } => {
                let _ = reply.send(driver.transactor().next_expected_id());
            }
        }
    }

    tracing::debug!("All transactor handles dropped, service stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LoopbackEngine;
    use crate::protocol::{ByteOrder, IdWord};
    use crate::transactor::PacketOutcome;

    #[tokio::test]
    async fn test_submit_and_sequence() {
        let (handle, _task) =
            spawn_transactor_task(TransactorConfig::default(), LoopbackEngine::new()).unwrap();

        let packet = Packet::new(IdWord::control(1, ByteOrder::Normal).encode(), vec![1, 2]);
        let response = handle.submit(&packet).await.unwrap();
        assert_eq!(response.outcome(), PacketOutcome::Delivered { words: 2 });
        assert_eq!(handle.next_expected_id().await.unwrap(), 2);

        handle.reset().await.unwrap();
        assert_eq!(handle.next_expected_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_task_stops_when_handles_dropped() {
        let (handle, task) =
            spawn_transactor_task(TransactorConfig::default(), LoopbackEngine::new()).unwrap();
        drop(handle);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let config = TransactorConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(spawn_transactor_task(config, LoopbackEngine::new()).is_err());
    }
}
