//! In-memory transport used by the unit tests.
use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    ClientConfig, Environment, RemoteEnvironment, Status,
    protocol::{
        ConnectReply, FrameCodec, HEADER_SIZE, Message, MessageKind, Transport, TransportError,
    },
};

#[derive(Debug, Default)]
struct Script {
    open: bool,
    connects: Vec<(String, u16)>,
    send_attempts: usize,
    sent: Vec<Message>,
    replies: VecDeque<Vec<u8>>,
    inbound: VecDeque<u8>,
    fail_connect: bool,
    fail_send: bool,
    fail_receive: bool,
}

/// A transport that records every request and answers with queued replies.
///
/// Clones share the same script, so a test keeps one clone for inspection
/// after handing another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Queues `reply` to be delivered after the next request.
    pub fn push_reply(&self, reply: impl Into<Message>) {
        self.push_raw(reply, |_| {});
    }

    /// Queues `reply` after letting `edit` tamper with the encoded frame.
    pub fn push_raw(&self, reply: impl Into<Message>, edit: impl FnOnce(&mut Vec<u8>)) {
        let mut codec = FrameCodec::default();
        let mut frame = codec.encode(&reply.into()).unwrap().to_vec();
        edit(&mut frame);
        self.script().replies.push_back(frame);
    }

    pub fn fail_next_connect(&self) {
        self.script().fail_connect = true;
    }

    pub fn fail_next_send(&self) {
        self.script().fail_send = true;
    }

    pub fn fail_next_receive(&self) {
        self.script().fail_receive = true;
    }

    /// Every request that reached the wire, decoded.
    pub fn sent(&self) -> Vec<Message> {
        self.script().sent.clone()
    }

    pub fn sent_kinds(&self) -> Vec<MessageKind> {
        self.script().sent.iter().map(Message::kind).collect()
    }

    pub fn connects(&self) -> Vec<(String, u16)> {
        self.script().connects.clone()
    }

    /// Connect and send attempts, successful or not.
    pub fn calls(&self) -> usize {
        let script = self.script();
        script.connects.len() + script.send_attempts
    }

    pub fn is_open(&self) -> bool {
        self.script().open
    }
}

impl Transport for ScriptedTransport {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        _config: &ClientConfig,
    ) -> Result<(), TransportError> {
        let mut script = self.script();
        script.connects.push((host.to_string(), port));
        script.inbound.clear();
        if std::mem::take(&mut script.fail_connect) {
            script.open = false;
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
        }
        script.open = true;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut script = self.script();
        if !script.open {
            return Err(TransportError::NotConnected);
        }
        script.send_attempts += 1;
        if std::mem::take(&mut script.fail_send) {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        }

        let (header, payload) = bytes.split_at(HEADER_SIZE);
        let message = FrameCodec::default().decode(header, payload).unwrap();
        script.sent.push(message);
        if let Some(reply) = script.replies.pop_front() {
            script.inbound.extend(reply);
        }
        Ok(())
    }

    fn receive_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut script = self.script();
        if !script.open {
            return Err(TransportError::NotConnected);
        }
        if std::mem::take(&mut script.fail_receive) {
            return Err(io::Error::from(io::ErrorKind::ConnectionReset).into());
        }
        let wanted = buf.len();
        if script.inbound.len() < wanted {
            script.inbound.clear();
            return Err(TransportError::ConnectionClosed);
        }
        for (dst, src) in buf.iter_mut().zip(script.inbound.drain(..wanted)) {
            *dst = src;
        }
        Ok(())
    }

    fn close(&mut self) {
        let mut script = self.script();
        script.open = false;
        script.inbound.clear();
    }

    fn is_connected(&self) -> bool {
        self.script().open
    }
}

/// An environment connected to `ham://127.0.0.1:9999/test.db` with the given
/// server handle.
pub fn connected_env(
    transport: &ScriptedTransport,
    handle: u64,
) -> RemoteEnvironment<ScriptedTransport> {
    transport.push_reply(ConnectReply {
        status: Status::SUCCESS,
        env_flags: 0,
        env_handle: handle,
    });
    let mut env = RemoteEnvironment::with_transport(transport.clone(), ClientConfig::default());
    env.open("ham://127.0.0.1:9999/test.db", 0).unwrap();
    env
}
