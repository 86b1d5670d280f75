//! Mock transport for testing
//!
//! Simulates an SG396 in memory so the driver can be exercised without
//! physical hardware. It provides:
//! - Register echo: `FREQ123.00` stores `123.00`, a later `FREQ?` returns it
//! - Scripted replies that take precedence over the echo
//! - Controllable failure injection
//! - Call logging for test verification

use super::MessageTransport;
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One call seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `write(command)`
    Write(String),
    /// `query(command)`
    Query(String),
}

#[derive(Default)]
struct MockState {
    call_log: Vec<Call>,
    registers: HashMap<String, String>,
    scripted: HashMap<String, VecDeque<String>>,
    next_failure: Option<TransportError>,
}

/// Mock message transport
///
/// Cloning yields another handle onto the same simulated instrument, so a test
/// can hand one clone to the driver and inspect the other.
///
/// # Example
///
/// ```
/// use sg396::transport::{MessageTransport, MockTransport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mock = MockTransport::new();
/// let mut transport = mock.clone();
/// transport.write("AMPR-10.00").await.unwrap();
/// assert_eq!(transport.query("AMPR?").await.unwrap(), "-10.00");
/// assert_eq!(mock.writes(), vec!["AMPR-10.00"]);
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a mock with empty registers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload the register behind `mnemonic`, as if the instrument powered
    /// up with that setting.
    pub fn with_register(self, mnemonic: &str, value: &str) -> Self {
        self.lock()
            .registers
            .insert(mnemonic.to_string(), value.to_string());
        self
    }

    /// Queue a reply for the next `query(command)`.
    pub fn push_reply(&self, command: &str, reply: &str) {
        self.lock()
            .scripted
            .entry(command.to_string())
            .or_default()
            .push_back(reply.to_string());
    }

    /// Fail the next call with `error`.
    pub fn inject_next_failure(&self, error: TransportError) {
        self.lock().next_failure = Some(error);
    }

    /// Every call in order.
    pub fn call_log(&self) -> Vec<Call> {
        self.lock().call_log.clone()
    }

    /// Commands passed to `write`, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock()
            .call_log
            .iter()
            .filter_map(|call| match call {
                Call::Write(command) => Some(command.clone()),
                Call::Query(_) => None,
            })
            .collect()
    }

    /// Commands passed to `query`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.lock()
            .call_log
            .iter()
            .filter_map(|call| match call {
                Call::Query(command) => Some(command.clone()),
                Call::Write(_) => None,
            })
            .collect()
    }

    /// Clear the call log, keeping registers and scripted replies.
    pub fn clear_log(&self) {
        self.lock().call_log.clear();
    }

    /// Current value of the register behind `mnemonic`.
    pub fn register(&self, mnemonic: &str) -> Option<String> {
        self.lock().registers.get(mnemonic).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Splits `FREQ1000.00` into `("FREQ", "1000.00")`.
fn split_mnemonic(command: &str) -> (&str, &str) {
    let end = command
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '*'))
        .unwrap_or(command.len());
    command.split_at(end)
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn write(&mut self, command: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.call_log.push(Call::Write(command.to_string()));
        if let Some(error) = state.next_failure.take() {
            return Err(error);
        }

        let (mnemonic, argument) = split_mnemonic(command);
        if !argument.is_empty() {
            state
                .registers
                .insert(mnemonic.to_string(), argument.to_string());
        }
        Ok(())
    }

    async fn query(&mut self, command: &str) -> Result<String, TransportError> {
        let mut state = self.lock();
        state.call_log.push(Call::Query(command.to_string()));
        if let Some(error) = state.next_failure.take() {
            return Err(error);
        }

        if let Some(reply) = state
            .scripted
            .get_mut(command)
            .and_then(VecDeque::pop_front)
        {
            return Ok(reply);
        }

        command
            .strip_suffix('?')
            .and_then(|mnemonic| state.registers.get(mnemonic).cloned())
            .ok_or(TransportError::Timeout(Duration::ZERO))
    }
}
