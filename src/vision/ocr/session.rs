// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared ONNX session access for the OCR models

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayD};
use ort::session::Session;
use ort::value::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a session, recovering it if a previous holder panicked
///
/// A session holds no state between runs, so a panic while it was locked
/// leaves nothing half-updated.
pub fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Recovering OCR session lock after a panicked run");
        PoisonError::into_inner(poisoned)
    })
}

/// Run a single-input session and copy out its first output
///
/// The lock is released before this returns, so post-processing of the
/// output never runs while the session is held.
pub fn run_first_output(
    session: &Mutex<Session>,
    input_name: &str,
    input: &Array4<f32>,
) -> Result<ArrayD<f32>> {
    let input_value =
        Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

    let mut session = lock_session(session);

    let outputs = session
        .run(ort::inputs![input_name => input_value])
        .context("Inference failed")?;

    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?
        .to_owned();

    Ok(output)
}
