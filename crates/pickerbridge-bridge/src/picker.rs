// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The date-picker module: the native handler behind `openPicker`.
//
// `openPicker` receives an untyped property bag.  This module decodes it into
// `PickerOptions`, hands those to the platform presenter, and gives the
// presenter a one-shot `PickerReply` that turns the user's choice into
// `onConfirm` / `onCancel` events.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use pickerbridge_core::error::{BridgeError, Result};
use pickerbridge_core::{BridgeConfig, NativeValue, PropertyBag};
use tracing::{debug, info, warn};

use crate::bridge::EventEmitter;
use crate::traits::{NativeDatePickerSpec, PickerPresenter};

/// Event names emitted by the module.
pub mod events {
    /// User confirmed a date.
    pub const CONFIRM: &str = "onConfirm";
    /// Dialog dismissed without a choice.
    pub const CANCEL: &str = "onCancel";
    /// Intermediate value while the user scrolls.
    pub const DATE_CHANGE: &str = "onDateChange";
    /// Spinner started or stopped moving.
    pub const STATE_CHANGE: &str = "onStateChange";
}

/// Minute steps the platform spinners support.
const MINUTE_INTERVALS: [u32; 11] = [1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30];

/// Largest UTC offset in use anywhere (UTC+14).
const MAX_TZ_OFFSET_MINUTES: i32 = 14 * 60;

const KNOWN_KEYS: [&str; 11] = [
    "id",
    "date",
    "mode",
    "minimumDate",
    "maximumDate",
    "locale",
    "title",
    "confirmText",
    "cancelText",
    "minuteInterval",
    "timeZoneOffsetInMinutes",
];

/// Which parts of a timestamp the dialog lets the user pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Date,
    Time,
    DateTime,
}

impl PickerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PickerMode::Date => "date",
            PickerMode::Time => "time",
            PickerMode::DateTime => "datetime",
        }
    }
}

impl fmt::Display for PickerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickerMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(PickerMode::Date),
            "time" => Ok(PickerMode::Time),
            "datetime" => Ok(PickerMode::DateTime),
            other => Err(BridgeError::InvalidOptions(format!(
                "mode must be \"date\", \"time\" or \"datetime\", got {other:?}"
            ))),
        }
    }
}

/// Typed view of the `openPicker` property bag.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerOptions {
    /// Caller-chosen tag echoed in every event for this dialog.
    pub id: Option<String>,
    /// Initially selected value; always within the bounds.
    pub date: DateTime<Utc>,
    pub mode: PickerMode,
    pub minimum_date: Option<DateTime<Utc>>,
    pub maximum_date: Option<DateTime<Utc>>,
    pub locale: Option<String>,
    pub title: Option<String>,
    pub confirm_text: String,
    pub cancel_text: String,
    pub minute_interval: u32,
    pub timezone_offset_minutes: Option<i32>,
}

impl PickerOptions {
    /// Decode and validate `props`. `now` is the default initial date.
    pub fn from_props(props: &PropertyBag, config: &BridgeConfig, now: DateTime<Utc>) -> Result<Self> {
        for key in props.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            debug!(key = %key, "ignoring unknown picker option");
        }

        let mode = match string_opt(props, "mode")? {
            Some(mode) => mode.parse()?,
            None => PickerMode::DateTime,
        };

        let minimum_date = date_opt(props, "minimumDate")?;
        let maximum_date = date_opt(props, "maximumDate")?;
        if let (Some(min), Some(max)) = (minimum_date, maximum_date) {
            if min > max {
                return Err(BridgeError::InvalidOptions(format!(
                    "minimumDate {} is after maximumDate {}",
                    format_date(min),
                    format_date(max)
                )));
            }
        }

        let date = match date_opt(props, "date")? {
            Some(date) => {
                if minimum_date.is_some_and(|min| date < min)
                    || maximum_date.is_some_and(|max| date > max)
                {
                    return Err(BridgeError::InvalidOptions(format!(
                        "date {} lies outside minimumDate/maximumDate",
                        format_date(date)
                    )));
                }
                date
            }
            None => clamp(now, minimum_date, maximum_date),
        };

        let minute_interval = match integer_opt(props, "minuteInterval")? {
            Some(n) => u32::try_from(n).unwrap_or(0),
            None => config.default_minute_interval,
        };
        if !MINUTE_INTERVALS.contains(&minute_interval) {
            return Err(BridgeError::InvalidOptions(format!(
                "minuteInterval must be one of {MINUTE_INTERVALS:?}, got {minute_interval}"
            )));
        }

        let timezone_offset_minutes = match integer_opt(props, "timeZoneOffsetInMinutes")? {
            Some(n) if n.unsigned_abs() <= MAX_TZ_OFFSET_MINUTES as u64 => Some(n as i32),
            Some(n) => {
                return Err(BridgeError::InvalidOptions(format!(
                    "timeZoneOffsetInMinutes {n} is outside ±{MAX_TZ_OFFSET_MINUTES}"
                )));
            }
            None => None,
        };

        Ok(Self {
            id: string_opt(props, "id")?,
            date,
            mode,
            minimum_date,
            maximum_date,
            locale: string_opt(props, "locale")?,
            title: string_opt(props, "title")?,
            confirm_text: string_opt(props, "confirmText")?.unwrap_or_else(|| "Confirm".into()),
            cancel_text: string_opt(props, "cancelText")?.unwrap_or_else(|| "Cancel".into()),
            minute_interval,
            timezone_offset_minutes,
        })
    }

    /// Pull `date` into `[minimum_date, maximum_date]`.
    pub fn clamp(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        clamp(date, self.minimum_date, self.maximum_date)
    }
}

fn clamp(
    date: DateTime<Utc>,
    min: Option<DateTime<Utc>>,
    max: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let date = min.map_or(date, |min| date.max(min));
    max.map_or(date, |max| date.min(max))
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn invalid(key: &str, expected: &str, found: &NativeValue) -> BridgeError {
    BridgeError::InvalidOptions(format!("{key} must be {expected}, got {found:?}"))
}

fn string_opt(props: &PropertyBag, key: &str) -> Result<Option<String>> {
    match props.get(key) {
        None => Ok(None),
        Some(value) if value.is_nullish() => Ok(None),
        Some(NativeValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(key, "a string", other)),
    }
}

fn integer_opt(props: &PropertyBag, key: &str) -> Result<Option<i64>> {
    match props.get(key) {
        None => Ok(None),
        Some(value) if value.is_nullish() => Ok(None),
        Some(NativeValue::Int(n)) => Ok(Some(*n)),
        Some(NativeValue::Float(f)) if f.is_finite() && f.fract() == 0.0 => Ok(Some(*f as i64)),
        Some(other) => Err(invalid(key, "a whole number", other)),
    }
}

/// Dates arrive as epoch milliseconds or RFC 3339 strings.
fn date_opt(props: &PropertyBag, key: &str) -> Result<Option<DateTime<Utc>>> {
    let value = match props.get(key) {
        None => return Ok(None),
        Some(value) if value.is_nullish() => return Ok(None),
        Some(value) => value,
    };

    match value {
        NativeValue::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| BridgeError::InvalidOptions(format!("{key}: {e} ({s:?})"))),
        other => other
            .as_f64()
            .filter(|ms| ms.is_finite())
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms.round() as i64))
            .map(Some)
            .ok_or_else(|| invalid(key, "epoch milliseconds or an RFC 3339 string", other)),
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Spinner motion reported through `onStateChange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerState {
    Idle,
    Spinning,
}

impl SpinnerState {
    fn as_str(self) -> &'static str {
        match self {
            SpinnerState::Idle => "idle",
            SpinnerState::Spinning => "spinning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// `present` has not returned yet.
    Presenting,
    /// Dialog is up; dropping the reply cancels.
    Open,
    /// Reply dropped unsettled before `present` returned.
    Orphaned,
    Settled,
}

struct ReplyState {
    emitter: EventEmitter,
    id: Option<String>,
    phase: Mutex<Phase>,
}

impl ReplyState {
    fn transition(&self, f: impl FnOnce(Phase) -> Phase) -> (Phase, Phase) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        let before = *phase;
        *phase = f(before);
        (before, *phase)
    }

    /// Move to `Settled`; true if this call did it.
    fn settle(&self) -> bool {
        let (before, _) = self.transition(|_| Phase::Settled);
        before != Phase::Settled
    }

    fn is_settled(&self) -> bool {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) == Phase::Settled
    }

    /// `present` succeeded.
    fn arm(&self) {
        let (before, _) = self.transition(|p| match p {
            Phase::Presenting => Phase::Open,
            _ => Phase::Settled,
        });
        if before == Phase::Orphaned {
            self.emit_cancel();
        }
    }

    /// `present` failed; the dialog never existed.
    fn abandon(&self) {
        self.transition(|_| Phase::Settled);
    }

    fn payload(&self) -> PropertyBag {
        let mut bag = PropertyBag::new();
        if let Some(id) = &self.id {
            bag.insert("id".into(), NativeValue::String(id.clone()));
        }
        bag
    }

    fn dated_payload(&self, date: DateTime<Utc>) -> PropertyBag {
        let mut bag = self.payload();
        bag.insert("date".into(), NativeValue::String(format_date(date)));
        bag.insert("timestamp".into(), NativeValue::Int(date.timestamp_millis()));
        bag
    }

    fn emit_cancel(&self) -> bool {
        self.emitter
            .emit(events::CANCEL, &NativeValue::Properties(self.payload()))
    }
}

/// One-shot channel from the presenter back to the scripting side.
///
/// `confirm` and `cancel` settle the reply; later calls are ignored.
/// Dropping an unsettled reply reports `onCancel`.
pub struct PickerReply {
    state: Arc<ReplyState>,
}

impl PickerReply {
    pub(crate) fn new(emitter: EventEmitter, id: Option<String>) -> Self {
        Self {
            state: Arc::new(ReplyState {
                emitter,
                id,
                phase: Mutex::new(Phase::Presenting),
            }),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.state.id.as_deref()
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_settled()
    }

    /// User picked `date`. Returns whether an event was delivered.
    pub fn confirm(&self, date: DateTime<Utc>) -> bool {
        if !self.state.settle() {
            return false;
        }
        debug!(id = ?self.state.id, date = %format_date(date), "picker confirmed");
        self.state
            .emitter
            .emit(events::CONFIRM, &NativeValue::Properties(self.state.dated_payload(date)))
    }

    /// User dismissed the dialog. Returns whether an event was delivered.
    pub fn cancel(&self) -> bool {
        if !self.state.settle() {
            return false;
        }
        debug!(id = ?self.state.id, "picker cancelled");
        self.state.emit_cancel()
    }

    /// Intermediate value while the dialog is still open.
    pub fn date_change(&self, date: DateTime<Utc>) -> bool {
        if self.is_settled() {
            return false;
        }
        self.state
            .emitter
            .emit(events::DATE_CHANGE, &NativeValue::Properties(self.state.dated_payload(date)))
    }

    pub fn spinner_state(&self, state: SpinnerState) -> bool {
        if self.is_settled() {
            return false;
        }
        let mut bag = self.state.payload();
        bag.insert("spinnerState".into(), NativeValue::from(state.as_str()));
        self.state
            .emitter
            .emit(events::STATE_CHANGE, &NativeValue::Properties(bag))
    }
}

impl Drop for PickerReply {
    fn drop(&mut self) {
        let (before, _) = self.state.transition(|p| match p {
            Phase::Presenting => Phase::Orphaned,
            _ => Phase::Settled,
        });
        if before == Phase::Open {
            debug!(id = ?self.state.id, "reply dropped unsettled, reporting cancel");
            self.state.emit_cancel();
        }
    }
}

impl fmt::Debug for PickerReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickerReply")
            .field("id", &self.state.id)
            .field("settled", &self.is_settled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// Stock implementation of the module on top of a platform presenter.
pub struct DatePickerModule {
    presenter: Arc<dyn PickerPresenter>,
    config: BridgeConfig,
}

impl DatePickerModule {
    pub fn new(presenter: Arc<dyn PickerPresenter>, config: BridgeConfig) -> Self {
        Self { presenter, config }
    }
}

impl NativeDatePickerSpec for DatePickerModule {
    fn open_picker(&self, props: PropertyBag, emitter: EventEmitter) -> Result<()> {
        let options = PickerOptions::from_props(&props, &self.config, Utc::now())?;
        info!(
            platform = self.presenter.platform_name(),
            mode = %options.mode,
            id = ?options.id,
            "presenting date picker"
        );

        let reply = PickerReply::new(emitter, options.id.clone());
        let state = Arc::clone(&reply.state);
        match self.presenter.present(options, reply) {
            Ok(()) => {
                state.arm();
                Ok(())
            }
            Err(e) => {
                state.abandon();
                warn!(error = %e, "date picker could not be presented");
                Err(e)
            }
        }
    }

    fn add_listener(&self, event_name: &str) -> Result<()> {
        if ![events::CONFIRM, events::CANCEL, events::DATE_CHANGE, events::STATE_CHANGE]
            .contains(&event_name)
        {
            debug!(event = %event_name, "listener added for an event this module never emits");
        }
        Ok(())
    }
}
