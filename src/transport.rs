//! The transport contract
//!
//! A transport moves raw JSON-RPC messages between this peer and the other
//! side of the connection. Unlike a client/server SDK, where the transport
//! is asymmetric (a server accepts, a client dials), a peer-neutral engine
//! needs the same shape on both ends: something that can be started, can
//! send a message, can be closed, and that calls back into the engine when
//! a message arrives, the connection drops, or a transport-level error
//! occurs.

use futures_util::future::BoxFuture;
use serde_json::Value;
use crate::error::Error;

/// Called by a transport when it has a new inbound message.
pub type OnMessage = Box<dyn Fn(Value) + Send + Sync>;

/// Called by a transport when the connection closes, expectedly or not.
pub type OnClose = Box<dyn Fn() + Send + Sync>;

/// Called by a transport when it hits an error it can't recover from.
pub type OnError = Box<dyn Fn(Error) + Send + Sync>;

/// A bidirectional channel for exchanging JSON-RPC messages with a peer.
///
/// Implementors own the underlying I/O (stdio pipes, a websocket, an
/// in-memory duplex for tests) and are responsible for framing: `send`
/// receives one already-serialized [`Message`](crate::types::Message) value
/// and `on_message` must be invoked once per complete inbound message.
pub trait Transport: Send + Sync {
    /// Starts the transport's read loop. Must be called at most once.
    fn start(&self) -> BoxFuture<'_, Result<(), Error>>;

    /// Sends one message to the peer.
    fn send(&self, message: Value) -> BoxFuture<'_, Result<(), Error>>;

    /// Closes the transport, whether or not it was started.
    fn close(&self) -> BoxFuture<'_, Result<(), Error>>;

    /// Registers the callback invoked for each inbound message.
    fn on_message(&self, callback: OnMessage);

    /// Registers the callback invoked when the connection closes.
    fn on_close(&self, callback: OnClose);

    /// Registers the callback invoked on a transport-level error.
    fn on_error(&self, callback: OnError);
}

#[cfg(test)]
pub(crate) mod duplex {
    //! An in-memory, loopback-free duplex transport pairing two peers for
    //! integration tests. Never exposed outside the crate.

    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use super::*;

    pub struct DuplexTransport {
        outbox: mpsc::UnboundedSender<Value>,
        inbox: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
        on_message: Mutex<Option<OnMessage>>,
    }

    impl DuplexTransport {
        /// Builds a connected pair: messages sent on one arrive on the other.
        pub fn pair() -> (Self, Self) {
            let (tx_a, rx_a) = mpsc::unbounded_channel();
            let (tx_b, rx_b) = mpsc::unbounded_channel();
            (
                Self { outbox: tx_b, inbox: Mutex::new(Some(rx_a)), on_message: Mutex::new(None) },
                Self { outbox: tx_a, inbox: Mutex::new(Some(rx_b)), on_message: Mutex::new(None) },
            )
        }
    }

    impl Transport for DuplexTransport {
        fn start(&self) -> BoxFuture<'_, Result<(), Error>> {
            Box::pin(async move {
                let mut rx = self.inbox.lock().unwrap().take().expect("start called twice");
                let on_message = self.on_message.lock().unwrap().take();
                if let Some(on_message) = on_message {
                    tokio::spawn(async move {
                        while let Some(message) = rx.recv().await {
                            on_message(message);
                        }
                    });
                }
                Ok(())
            })
        }

        fn send(&self, message: Value) -> BoxFuture<'_, Result<(), Error>> {
            let result = self.outbox.send(message);
            Box::pin(async move {
                result.map_err(|_| Error::new(crate::error::ErrorCode::InternalError, "peer dropped"))
            })
        }

        fn close(&self) -> BoxFuture<'_, Result<(), Error>> {
            Box::pin(async move { Ok(()) })
        }

        fn on_message(&self, callback: OnMessage) {
            *self.on_message.lock().unwrap() = Some(callback);
        }

        fn on_close(&self, _callback: OnClose) {}
        fn on_error(&self, _callback: OnError) {}
    }

    #[tokio::test]
    async fn it_delivers_a_message_to_the_other_side() {
        use std::sync::{Arc, atomic::{AtomicBool, Ordering}};

        let (a, b) = DuplexTransport::pair();
        let received = Arc::new(AtomicBool::new(false));
        let received_clone = received.clone();
        b.on_message(Box::new(move |_| received_clone.store(true, Ordering::SeqCst)));

        a.start().await.unwrap();
        b.start().await.unwrap();
        a.send(serde_json::json!({"jsonrpc": "2.0", "method": "ping"})).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(received.load(Ordering::SeqCst));
    }
}
