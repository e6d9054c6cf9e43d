// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-process message bus standing in for the host shell's send/receive
//! primitives. Channels are created on first subscription.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

pub const SCREEN_CHANNEL: &str = "screen";
pub const WRITE_CHANNEL: &str = "write";

#[derive(Debug, Default)]
pub struct ShellBridge {
    channels: Mutex<HashMap<String, Vec<Sender<String>>>>,
}

impl ShellBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `message` to every live subscriber of `channel` and return
    /// how many received it.
    pub fn send(&self, channel: &str, message: &str) -> usize {
        let mut channels = match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(subscribers) = channels.get_mut(channel) else {
            return 0;
        };
        subscribers.retain(|subscriber| subscriber.send(message.to_owned()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            channels.remove(channel);
        }
        delivered
    }

    pub fn subscribe(&self, channel: &str) -> Receiver<String> {
        let (tx, rx) = mpsc::channel();
        let mut channels = match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        channels.entry(channel.to_owned()).or_default().push(tx);
        rx
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        match self.channels.lock() {
            Ok(guard) => guard.get(channel).map_or(0, Vec::len),
            Err(poisoned) => poisoned.into_inner().get(channel).map_or(0, Vec::len),
        }
    }
}
