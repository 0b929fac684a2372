// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Presenters for builds without a native dialog.
//
// `StubPresenter` refuses every request with `PlatformUnavailable`.
// `HeadlessPresenter` answers without user interaction from a background
// thread, which is how CI and the demo binary exercise the full event path.

use std::thread;

use chrono::{DateTime, Utc};
use pickerbridge_core::error::{BridgeError, Result};

use crate::picker::{PickerOptions, PickerReply};
use crate::traits::PickerPresenter;

/// No-op presenter returned on platforms without a native picker.
pub struct StubPresenter;

impl PickerPresenter for StubPresenter {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn present(&self, _options: PickerOptions, _reply: PickerReply) -> Result<()> {
        tracing::warn!("PickerPresenter::present called on stub presenter");
        Err(BridgeError::PlatformUnavailable)
    }
}

/// What a `HeadlessPresenter` answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessAnswer {
    /// Confirm the initial date.
    AcceptInitial,
    /// Confirm this date, clamped to the picker's bounds.
    Pick(DateTime<Utc>),
    /// Dismiss the dialog.
    Dismiss,
}

/// Non-interactive presenter that settles every dialog on its own thread.
pub struct HeadlessPresenter {
    answer: HeadlessAnswer,
}

impl HeadlessPresenter {
    pub fn new(answer: HeadlessAnswer) -> Self {
        Self { answer }
    }
}

impl Default for HeadlessPresenter {
    fn default() -> Self {
        Self::new(HeadlessAnswer::AcceptInitial)
    }
}

impl PickerPresenter for HeadlessPresenter {
    fn platform_name(&self) -> &str {
        "Headless"
    }

    fn present(&self, options: PickerOptions, reply: PickerReply) -> Result<()> {
        let answer = self.answer;
        thread::Builder::new()
            .name("picker-headless".into())
            .spawn(move || match answer {
                HeadlessAnswer::AcceptInitial => {
                    reply.confirm(options.date);
                }
                HeadlessAnswer::Pick(date) => {
                    reply.confirm(options.clamp(date));
                }
                HeadlessAnswer::Dismiss => {
                    reply.cancel();
                }
            })
            .map(|_| ())
            .map_err(|e| BridgeError::Presenter(format!("could not start headless picker: {e}")))
    }
}
