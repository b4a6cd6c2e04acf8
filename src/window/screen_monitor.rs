//! Watches for display configuration changes.

use objc2_foundation::{NSNotification, NSNotificationCenter, NSString};
use std::ptr::NonNull;

use crate::input::{push_input, IslandInput};

/// Posts [`IslandInput::DisplayChanged`] whenever AppKit reports new screen
/// parameters. Must be called from the main thread.
pub fn start_monitoring() {
    let notification_center = NSNotificationCenter::defaultCenter();
    let notification_name = NSString::from_str("NSApplicationDidChangeScreenParametersNotification");

    let block = block2::RcBlock::new(|_notification: NonNull<NSNotification>| {
        log::debug!("Screen parameters changed");
        push_input(IslandInput::DisplayChanged);
    });

    unsafe {
        notification_center.addObserverForName_object_queue_usingBlock(
            Some(&notification_name),
            None,
            None,
            &block,
        );
    }

    log::info!("Screen monitor started");
}
