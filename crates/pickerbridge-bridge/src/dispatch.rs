// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Static call dispatch table for the `RNDatePicker` module.
//
// The table mirrors the generated module interface and is fixed at build
// time.  A dispatch looks the operation up by exact name, checks arity, then
// marshals every argument before the handler runs, so a bad argument never
// leaves a half-applied call behind.

use std::sync::{Mutex, MutexGuard};

use pickerbridge_core::error::{BridgeError, Result};
use pickerbridge_core::{DynamicValue, NativeValue, ValueType};
use tracing::{debug, instrument, warn};

use crate::bridge::EventEmitter;
use crate::marshal::Marshaler;
use crate::registry::ListenerRegistry;
use crate::traits::NativeDatePickerSpec;

/// Operation names as the scripting side calls them.
pub mod names {
    pub const OPEN_PICKER: &str = "openPicker";
    pub const REMOVE_LISTENERS: &str = "removeListeners";
    pub const ADD_LISTENER: &str = "addListener";
}

/// One declared parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ValueType,
}

type Handler = fn(&CallContext<'_>, Vec<NativeValue>) -> Result<()>;

/// One entry of the dispatch table.
#[derive(Clone, Copy)]
pub struct OperationSpec {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    handler: Handler,
}

impl OperationSpec {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl std::fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Every operation the module exposes.
pub static OPERATIONS: [OperationSpec; 3] = [
    OperationSpec {
        name: names::OPEN_PICKER,
        params: &[ParamSpec {
            name: "props",
            ty: ValueType::Properties,
        }],
        handler: open_picker,
    },
    OperationSpec {
        name: names::REMOVE_LISTENERS,
        params: &[ParamSpec {
            name: "count",
            ty: ValueType::Int,
        }],
        handler: remove_listeners,
    },
    OperationSpec {
        name: names::ADD_LISTENER,
        params: &[ParamSpec {
            name: "eventName",
            ty: ValueType::String,
        }],
        handler: add_listener,
    },
];

/// Exact-name lookup.
pub fn lookup(operation: &str) -> Option<&'static OperationSpec> {
    OPERATIONS.iter().find(|op| op.name == operation)
}

/// What a handler may touch while it runs.
pub struct CallContext<'a> {
    pub module: &'a dyn NativeDatePickerSpec,
    pub registry: &'a Mutex<ListenerRegistry>,
    pub emitter: EventEmitter,
}

impl CallContext<'_> {
    pub fn registry(&self) -> MutexGuard<'_, ListenerRegistry> {
        crate::registry::lock(self.registry)
    }
}

/// Validate, marshal and run `operation` with `args`.
#[instrument(skip(ctx, marshaler, args), fields(argc = args.len()))]
pub fn dispatch(
    ctx: &CallContext<'_>,
    marshaler: &Marshaler,
    operation: &str,
    args: &[DynamicValue],
) -> Result<()> {
    let Some(spec) = lookup(operation) else {
        warn!(operation, "call to unknown operation (stale binding?)");
        return Err(BridgeError::UnknownOperation(operation.to_owned()));
    };

    if args.len() != spec.arity() {
        return Err(BridgeError::ArityMismatch {
            operation: spec.name.to_owned(),
            expected: spec.arity(),
            actual: args.len(),
        });
    }

    let native = spec
        .params
        .iter()
        .zip(args)
        .map(|(param, arg)| marshaler.to_native(arg, param.ty, param.name))
        .collect::<Result<Vec<_>>>()?;

    debug!(operation = spec.name, "invoking handler");
    (spec.handler)(ctx, native)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn open_picker(ctx: &CallContext<'_>, args: Vec<NativeValue>) -> Result<()> {
    match args.into_iter().next() {
        Some(NativeValue::Properties(props)) => ctx.module.open_picker(props, ctx.emitter.clone()),
        other => Err(unexpected_arg("props", "object", other)),
    }
}

fn remove_listeners(ctx: &CallContext<'_>, args: Vec<NativeValue>) -> Result<()> {
    let count = match args.into_iter().next() {
        Some(NativeValue::Int(n)) => n,
        other => return Err(unexpected_arg("count", "integer", other)),
    };
    let count = u64::try_from(count).map_err(|_| BridgeError::TypeMismatch {
        path: "count".into(),
        expected: "non-negative integer".into(),
        found: count.to_string(),
    })?;

    // The hook may emit, so the registry is not locked while it runs.
    ctx.registry().check_removal(count)?;
    ctx.module.remove_listeners(count)?;
    ctx.registry().remove_listeners(count)
}

fn add_listener(ctx: &CallContext<'_>, args: Vec<NativeValue>) -> Result<()> {
    let event_name = match args.into_iter().next() {
        Some(NativeValue::String(name)) => name,
        other => return Err(unexpected_arg("eventName", "string", other)),
    };

    ctx.module.add_listener(&event_name)?;
    ctx.registry().add_listener(&event_name);
    Ok(())
}

fn unexpected_arg(path: &str, expected: &str, found: Option<NativeValue>) -> BridgeError {
    BridgeError::TypeMismatch {
        path: path.to_owned(),
        expected: expected.to_owned(),
        found: found.map_or_else(|| "nothing".to_owned(), |v| format!("{v:?}")),
    }
}
