//! Subscription manager: bus registration + push room membership.
//!
//! ═══════════════════════════════════════════════════════════════════════
//! ChannelLifecycle — testable channel state (no live transport needed)
//! ═══════════════════════════════════════════════════════════════════════
//!
//! The lifecycle struct tracks Closed → Opening → Open → Closing → Closed
//! and returns a [`ReleasePlan`] from every teardown transition, so the
//! caller performs the side effects and no exit path can skip a release.

use tokio::sync::mpsc;

use super::error::SessionError;
use super::traits::{ChannelHandle, EventBus, PushChannel, SESSION_TOPICS};
use crate::models::ResultCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Handles the caller must release after a teardown transition.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReleasePlan {
    pub bus: Option<ChannelHandle>,
    pub push: Option<ChannelHandle>,
}

#[derive(Debug)]
pub struct ChannelLifecycle {
    phase: ChannelPhase,
    bus_handle: Option<ChannelHandle>,
    push_handle: Option<ChannelHandle>,
}

impl ChannelLifecycle {
    pub fn new() -> Self {
        Self {
            phase: ChannelPhase::Closed,
            bus_handle: None,
            push_handle: None,
        }
    }

    pub fn phase(&self) -> ChannelPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == ChannelPhase::Open
    }

    pub fn begin_open(&mut self) {
        self.phase = ChannelPhase::Opening;
    }

    pub fn on_bus_registered(&mut self, handle: ChannelHandle) {
        self.bus_handle = Some(handle);
    }

    pub fn on_push_joined(&mut self, handle: ChannelHandle) {
        self.push_handle = Some(handle);
        self.phase = ChannelPhase::Open;
    }

    /// Roll back a partial open. Whatever handle was already obtained must
    /// be released by the caller.
    pub fn fail_open(&mut self) -> ReleasePlan {
        self.phase = ChannelPhase::Closed;
        ReleasePlan {
            bus: self.bus_handle.take(),
            push: self.push_handle.take(),
        }
    }

    /// Begin teardown. Returns every held handle; the lifecycle stays
    /// Closing until the caller acknowledges the releases with
    /// [`released`](Self::released).
    pub fn begin_close(&mut self) -> ReleasePlan {
        self.phase = ChannelPhase::Closing;
        ReleasePlan {
            bus: self.bus_handle.take(),
            push: self.push_handle.take(),
        }
    }

    /// Acknowledge that the handles from [`begin_close`](Self::begin_close)
    /// have been released.
    pub fn released(&mut self) {
        self.phase = ChannelPhase::Closed;
    }
}

impl Default for ChannelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Successfully opened channels, receivers included.
pub struct OpenChannels {
    pub lifecycle: ChannelLifecycle,
    pub bus_rx: mpsc::Receiver<serde_json::Value>,
    pub push_rx: mpsc::Receiver<serde_json::Value>,
}

/// Register on the bus, then join the push room. Either failure rolls back
/// whatever was obtained before the error is returned.
pub fn open_channels(
    bus: &dyn EventBus,
    push: &dyn PushChannel,
    patient_id: &str,
) -> Result<OpenChannels, SessionError> {
    let mut lifecycle = ChannelLifecycle::new();
    lifecycle.begin_open();

    let (bus_handle, bus_rx) = match bus.register(patient_id, &SESSION_TOPICS) {
        Ok(opened) => opened,
        Err(err) => {
            let plan = lifecycle.fail_open();
            release(bus, push, plan);
            return Err(err.into());
        }
    };
    lifecycle.on_bus_registered(bus_handle);

    let (push_handle, push_rx) = match push.join(patient_id, &ResultCategory::ALL) {
        Ok(opened) => opened,
        Err(err) => {
            let plan = lifecycle.fail_open();
            release(bus, push, plan);
            return Err(err.into());
        }
    };
    lifecycle.on_push_joined(push_handle);

    tracing::debug!(patient_id = %patient_id, "Live channels open");
    Ok(OpenChannels {
        lifecycle,
        bus_rx,
        push_rx,
    })
}

/// Perform the releases a transition demanded.
pub fn release(bus: &dyn EventBus, push: &dyn PushChannel, plan: ReleasePlan) {
    if let Some(handle) = plan.bus {
        bus.unregister(handle);
    }
    if let Some(handle) = plan.push {
        push.leave(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_open() {
        let mut lifecycle = ChannelLifecycle::new();
        assert_eq!(lifecycle.phase(), ChannelPhase::Closed);
        lifecycle.begin_open();
        assert_eq!(lifecycle.phase(), ChannelPhase::Opening);
        lifecycle.on_bus_registered(ChannelHandle(1));
        lifecycle.on_push_joined(ChannelHandle(2));
        assert!(lifecycle.is_open());
    }

    #[test]
    fn fail_after_bus_register_releases_bus_only() {
        let mut lifecycle = ChannelLifecycle::new();
        lifecycle.begin_open();
        lifecycle.on_bus_registered(ChannelHandle(1));
        let plan = lifecycle.fail_open();
        assert_eq!(plan.bus, Some(ChannelHandle(1)));
        assert_eq!(plan.push, None);
        assert_eq!(lifecycle.phase(), ChannelPhase::Closed);
    }

    #[test]
    fn fail_before_any_handle_releases_nothing() {
        let mut lifecycle = ChannelLifecycle::new();
        lifecycle.begin_open();
        assert_eq!(lifecycle.fail_open(), ReleasePlan::default());
    }

    #[test]
    fn close_from_open_releases_both() {
        let mut lifecycle = ChannelLifecycle::new();
        lifecycle.begin_open();
        lifecycle.on_bus_registered(ChannelHandle(1));
        lifecycle.on_push_joined(ChannelHandle(2));

        let plan = lifecycle.begin_close();
        assert_eq!(plan.bus, Some(ChannelHandle(1)));
        assert_eq!(plan.push, Some(ChannelHandle(2)));
        lifecycle.released();
        assert_eq!(lifecycle.phase(), ChannelPhase::Closed);
    }

    #[test]
    fn closed_only_after_release_is_acked() {
        let mut lifecycle = ChannelLifecycle::new();
        lifecycle.begin_open();
        lifecycle.on_bus_registered(ChannelHandle(1));
        lifecycle.on_push_joined(ChannelHandle(2));

        lifecycle.begin_close();
        // Handles are still being released at this point
        assert_eq!(lifecycle.phase(), ChannelPhase::Closing);
        lifecycle.released();
        assert_eq!(lifecycle.phase(), ChannelPhase::Closed);
    }

    #[test]
    fn close_when_already_closed_is_a_noop() {
        let mut lifecycle = ChannelLifecycle::new();
        assert_eq!(lifecycle.begin_close(), ReleasePlan::default());
        lifecycle.released();
        assert_eq!(lifecycle.phase(), ChannelPhase::Closed);
    }

    #[test]
    fn handles_are_released_only_once() {
        let mut lifecycle = ChannelLifecycle::new();
        lifecycle.begin_open();
        lifecycle.on_bus_registered(ChannelHandle(1));
        lifecycle.on_push_joined(ChannelHandle(2));
        let first = lifecycle.begin_close();
        assert_ne!(first, ReleasePlan::default());
        assert_eq!(lifecycle.begin_close(), ReleasePlan::default());
    }
}
