// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cross-runtime call bridge.
//
// One `CallBridge` exists per scripting runtime instance and is owned by the
// native host.  Inbound calls go through `dispatch`; outbound results go
// through `EventEmitter`, a weak handle native handlers can carry to any
// thread.  Once the bridge is torn down (explicitly or by drop) every
// dispatch fails with `BridgeClosed` and every emission is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak, mpsc};

use pickerbridge_core::error::{BridgeError, Result};
use pickerbridge_core::{BridgeConfig, DynamicValue, NativeValue};
use tracing::{debug, info};
use uuid::Uuid;

use crate::dispatch::{self, CallContext};
use crate::marshal::{Marshaler, to_dynamic};
use crate::picker::DatePickerModule;
use crate::registry::{self, ListenerRegistry};
use crate::traits::{EventSink, NativeDatePickerSpec, PickerPresenter, ScriptEvent};

struct BridgeInner {
    id: Uuid,
    config: BridgeConfig,
    marshaler: Marshaler,
    registry: Mutex<ListenerRegistry>,
    closed: AtomicBool,
    module: Arc<dyn NativeDatePickerSpec>,
    sink: Arc<dyn EventSink>,
}

impl BridgeInner {
    fn registry(&self) -> MutexGuard<'_, ListenerRegistry> {
        registry::lock(&self.registry)
    }

    fn emit(&self, event_name: &str, payload: &NativeValue) -> bool {
        if self.closed.load(Ordering::Acquire) {
            debug!(bridge = %self.id, event = %event_name, "bridge closed, event dropped");
            return false;
        }

        let payload = to_dynamic(payload);

        // Decided under the lock, delivered after it is released so a sink
        // may call back into the bridge.
        {
            let registry = self.registry();
            if registry.is_invalidated() {
                debug!(bridge = %self.id, event = %event_name, "bridge closed, event dropped");
                return false;
            }
            if !registry.has_listeners(event_name) {
                if self.config.log_dropped_events {
                    debug!(bridge = %self.id, event = %event_name, "no listeners, event dropped");
                }
                return false;
            }
        }

        debug!(bridge = %self.id, event = %event_name, "delivering event");
        self.sink.deliver(ScriptEvent {
            name: event_name.to_owned(),
            payload,
        });
        true
    }
}

/// Façade the native host holds for one scripting runtime instance.
pub struct CallBridge {
    inner: Arc<BridgeInner>,
}

impl CallBridge {
    /// Bind `module` to a scripting runtime that receives events via `sink`.
    ///
    /// The sink runs on whichever thread emits, with no bridge lock held.
    pub fn new(
        module: Arc<dyn NativeDatePickerSpec>,
        sink: Arc<dyn EventSink>,
        config: BridgeConfig,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(bridge = %id, module = %config.module_name, "bridge initialised");
        Self {
            inner: Arc::new(BridgeInner {
                id,
                marshaler: Marshaler::from_config(&config),
                config,
                registry: Mutex::new(ListenerRegistry::new()),
                closed: AtomicBool::new(false),
                module,
                sink,
            }),
        }
    }

    /// Bind the stock date-picker module backed by `presenter`.
    pub fn with_presenter(
        presenter: Arc<dyn PickerPresenter>,
        sink: Arc<dyn EventSink>,
        config: BridgeConfig,
    ) -> Self {
        let module = Arc::new(DatePickerModule::new(presenter, config.clone()));
        Self::new(module, sink, config)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Call `operation` with already-decoded scripting values.
    pub fn dispatch(&self, operation: &str, args: &[DynamicValue]) -> Result<()> {
        if self.is_closed() {
            return Err(BridgeError::BridgeClosed);
        }

        let ctx = CallContext {
            module: self.inner.module.as_ref(),
            registry: &self.inner.registry,
            emitter: self.emitter(),
        };
        dispatch::dispatch(&ctx, &self.inner.marshaler, operation, args)
    }

    /// Handle for native code to emit events back into the runtime.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Emit directly from the host. Returns whether the event was delivered.
    pub fn emit(&self, event_name: &str, payload: &NativeValue) -> bool {
        self.inner.emit(event_name, payload)
    }

    pub fn listener_count(&self, event_name: &str) -> u64 {
        self.inner.registry().listener_count(event_name)
    }

    pub fn total_listeners(&self) -> u64 {
        self.inner.registry().total()
    }

    /// Invalidate every registration and refuse further calls. Idempotent.
    pub fn teardown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut registry = self.inner.registry();
        let dropped = registry.total();
        registry.invalidate();
        info!(bridge = %self.inner.id, dropped_listeners = dropped, "bridge torn down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Drop for CallBridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for CallBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallBridge")
            .field("id", &self.inner.id)
            .field("module", &self.inner.config.module_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Weak, thread-safe handle for emitting events into the scripting runtime.
///
/// Emitting after the bridge is torn down or dropped is a silent no-op.
#[derive(Clone)]
pub struct EventEmitter {
    inner: Weak<BridgeInner>,
}

impl EventEmitter {
    /// An emitter bound to no bridge; every emission is dropped.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// Marshal `payload` and deliver it if anyone listens for `event_name`.
    ///
    /// Returns whether the event was delivered.
    pub fn emit(&self, event_name: &str, payload: &NativeValue) -> bool {
        match self.inner.upgrade() {
            Some(inner) => inner.emit(event_name, payload),
            None => {
                debug!(event = %event_name, "bridge gone, event dropped");
                false
            }
        }
    }

    /// Whether the bridge behind this handle is still open.
    pub fn is_live(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| !inner.closed.load(Ordering::Acquire))
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("live", &self.is_live())
            .finish()
    }
}

/// Sink that queues events for the scripting event loop to drain.
pub struct ChannelSink {
    tx: mpsc::Sender<ScriptEvent>,
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: ScriptEvent) {
        if let Err(mpsc::SendError(event)) = self.tx.send(event) {
            debug!(event = %event.name, "scripting side stopped receiving, event dropped");
        }
    }
}

/// Create a channel-backed sink and the receiver the event loop polls.
pub fn event_channel() -> (Arc<ChannelSink>, mpsc::Receiver<ScriptEvent>) {
    let (tx, rx) = mpsc::channel();
    (Arc::new(ChannelSink { tx }), rx)
}
