// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits at the seams of the bridge.
//
// `NativeDatePickerSpec` is the module surface the scripting side binds to.
// `PickerPresenter` is the platform collaborator that actually shows a
// dialog.  `EventSink` is the scripting runtime's event-emission convention.
// Anything implementing these is substitutable, including test doubles.

use pickerbridge_core::error::Result;
use pickerbridge_core::{DynamicValue, PropertyBag};

use crate::bridge::EventEmitter;
use crate::picker::{PickerOptions, PickerReply};

/// Native side of the `RNDatePicker` module: one method per operation.
///
/// Listener bookkeeping is done by the bridge before `add_listener` /
/// after `remove_listeners` reach the module, so the default hooks are no-ops.
pub trait NativeDatePickerSpec: Send + Sync {
    /// Begin the dialog flow. Completion arrives later through `emitter`.
    fn open_picker(&self, props: PropertyBag, emitter: EventEmitter) -> Result<()>;

    /// The scripting side subscribed to `event_name`.
    fn add_listener(&self, _event_name: &str) -> Result<()> {
        Ok(())
    }

    /// The scripting side dropped `count` subscriptions.
    fn remove_listeners(&self, _count: u64) -> Result<()> {
        Ok(())
    }
}

/// Presents the platform date-picker dialog.
pub trait PickerPresenter: Send + Sync {
    /// Human-readable platform name (e.g. "iOS 17", "Headless").
    fn platform_name(&self) -> &str;

    /// Show the dialog for `options` and return without waiting for the user.
    ///
    /// The outcome is reported through `reply`, from any thread.  Returning
    /// `Err` means no dialog was shown; the reply is then discarded silently.
    fn present(&self, options: PickerOptions, reply: PickerReply) -> Result<()>;
}

/// A named event on its way into the scripting runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEvent {
    pub name: String,
    pub payload: DynamicValue,
}

/// Delivery endpoint into the scripting runtime.
///
/// Called without the registry lock held, so implementations may dispatch or
/// emit back into the bridge. An emission already past its listener check
/// when teardown starts may still be delivered.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: ScriptEvent);
}
