// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Pickerbridge: cross-runtime call bridge for the `RNDatePicker` module.
//!
//! The scripting runtime calls `openPicker`, `addListener` and
//! `removeListeners` by name through [`CallBridge::dispatch`]; the native
//! side answers later with named events through an [`EventEmitter`].
//! Events only reach the runtime while it has a live listener for them.

pub mod bridge;
pub mod dispatch;
pub mod marshal;
pub mod picker;
pub mod registry;
pub mod stub;
pub mod traits;

pub use bridge::{CallBridge, ChannelSink, EventEmitter, event_channel};
pub use marshal::{Marshaler, to_dynamic};
pub use picker::{DatePickerModule, PickerMode, PickerOptions, PickerReply, SpinnerState, events};
pub use registry::ListenerRegistry;
pub use traits::{EventSink, NativeDatePickerSpec, PickerPresenter, ScriptEvent};

use std::sync::Arc;

/// Presenter for the target operating system.
///
/// No native dialog ships in this crate, so every target gets the stub;
/// hosts with a real dialog pass their own `PickerPresenter` to
/// [`CallBridge::with_presenter`].
pub fn platform_presenter() -> Arc<dyn PickerPresenter> {
    Arc::new(stub::StubPresenter)
}
