//! Input bus feeding the main loop.
//!
//! AppKit callbacks, notification blocks and the IPC thread never touch the
//! island directly. They push an [`IslandInput`] here and the main loop drains
//! the bus on every pass.

use async_channel::{Receiver, Sender};
use std::sync::OnceLock;

use crate::ipc::IpcCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum IslandInput {
    /// Pointer entered (`true`) or left (`false`) the island view.
    Pointer(bool),
    /// Click released inside the island view.
    Tap,
    /// Screen parameters changed (resolution, monitor attached or removed).
    DisplayChanged,
    Command(IpcCommand),
}

struct InputBus {
    tx: Sender<IslandInput>,
    rx: Receiver<IslandInput>,
}

static INPUT_BUS: OnceLock<InputBus> = OnceLock::new();

fn bus() -> &'static InputBus {
    INPUT_BUS.get_or_init(|| {
        let (tx, rx) = async_channel::unbounded();
        InputBus { tx, rx }
    })
}

pub fn push_input(input: IslandInput) {
    if let Err(e) = bus().tx.try_send(input) {
        log::warn!("Dropped island input: {}", e);
    }
}

/// Everything queued since the last call, in arrival order.
pub fn drain_inputs() -> Vec<IslandInput> {
    let rx = &bus().rx;
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}
