// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pickerbridge demo host.
//
// Plays the part of both runtimes: subscribes to the picker events, calls
// `openPicker` with the JSON props given on the command line, and prints the
// event the headless presenter answers with.
//
//   pickerbridge [--config FILE] [--dismiss] ['{"mode":"date","id":"dob"}']

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pickerbridge_bridge::stub::{HeadlessAnswer, HeadlessPresenter};
use pickerbridge_bridge::{CallBridge, event_channel, events};
use pickerbridge_core::error::Result;
use pickerbridge_core::{BridgeConfig, BridgeError, DynamicValue, classify_error};

/// How long to wait for the presenter to answer.
const ANSWER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "pickerbridge", version, about = "Drive the date-picker bridge with a headless presenter")]
struct Cli {
    /// JSON bridge configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dismiss the picker instead of confirming the initial date.
    #[arg(long)]
    dismiss: bool,
    /// `openPicker` props as a JSON object.
    #[arg(default_value = "{}")]
    props: String,
}

fn run(args: Cli) -> Result<()> {
    let config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    let props: serde_json::Value = serde_json::from_str(&args.props)?;

    let answer = if args.dismiss {
        HeadlessAnswer::Dismiss
    } else {
        HeadlessAnswer::AcceptInitial
    };
    let (sink, rx) = event_channel();
    let bridge = CallBridge::with_presenter(Arc::new(HeadlessPresenter::new(answer)), sink, config);

    for name in [events::CONFIRM, events::CANCEL] {
        bridge.dispatch("addListener", &[DynamicValue::from(name)])?;
    }
    bridge.dispatch("openPicker", &[DynamicValue::from(props)])?;

    match rx.recv_timeout(ANSWER_TIMEOUT) {
        Ok(event) => {
            tracing::info!(event = %event.name, "picker answered");
            println!("{} {}", event.name, event.payload.to_json());
        }
        Err(_) => {
            return Err(BridgeError::Presenter(format!(
                "no answer within {}s",
                ANSWER_TIMEOUT.as_secs()
            )));
        }
    }

    bridge.dispatch("removeListeners", &[DynamicValue::Number(2.0)])?;
    bridge.teardown();
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Pickerbridge demo starting");

    let args = Cli::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, class = ?classify_error(&e), "demo failed");
            ExitCode::FAILURE
        }
    }
}
