// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JNI entry points for `photon.PhotonApi`.
//
//   public native void run(int port);
//   public native void applyUpdates(String updates);
//   public native float measureText(String text);
//
// A panic must never unwind into the JVM, so every body runs under
// `catch_unwind`.  Failures become Java exceptions; the returned value is
// then ignored by the JVM.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use jni::JNIEnv;
use jni::objects::{JObject, JString};
use jni::sys::{jfloat, jint};
use tracing::error;

use photon_core::error::{PhotonError, Result};

use crate::api;

const ILLEGAL_STATE: &str = "java/lang/IllegalStateException";
const ILLEGAL_ARGUMENT: &str = "java/lang/IllegalArgumentException";

/// Convenience: map any `jni::errors::Error` into `PhotonError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> PhotonError {
    PhotonError::Bridge(format!("{context}: {e}"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "native panic".to_string()
    }
}

/// Run `body`, converting a panic into an error.
fn guarded<T>(name: &str, body: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(export = name, panic = %message, "panic caught at JNI boundary");
            Err(PhotonError::Bridge(format!("{name} panicked: {message}")))
        }
    }
}

fn throw(env: &mut JNIEnv<'_>, class: &str, err: &PhotonError) {
    if let Err(e) = env.throw_new(class, err.to_string()) {
        error!(class, error = %e, "failed to throw Java exception");
    }
}

fn java_string(env: &mut JNIEnv<'_>, value: &JString<'_>) -> Result<String> {
    Ok(env.get_string(value).map_err(|e| jni_err("get_string", e))?.into())
}

/// Exception class for an error raised by `applyUpdates`.
fn apply_exception_class(err: &PhotonError) -> &'static str {
    match err {
        PhotonError::Protocol(_) | PhotonError::Serialization(_) => ILLEGAL_ARGUMENT,
        _ => ILLEGAL_STATE,
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_photon_PhotonApi_run<'local>(mut env: JNIEnv<'local>, _this: JObject<'local>, port: jint) {
    api::init_logging();
    if let Err(e) = guarded("run", || api::run_blocking(port).map(|_| ())) {
        error!(port, error = %e, "photon session failed");
        throw(&mut env, ILLEGAL_STATE, &e);
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_photon_PhotonApi_applyUpdates<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    updates: JString<'local>,
) {
    api::init_logging();
    let result = guarded("applyUpdates", || {
        let updates = java_string(&mut env, &updates)?;
        api::apply_updates_json(&updates).map(|_| ())
    });
    if let Err(e) = result {
        throw(&mut env, apply_exception_class(&e), &e);
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_photon_PhotonApi_measureText<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    text: JString<'local>,
) -> jfloat {
    api::init_logging();
    let result = guarded("measureText", || {
        let text = java_string(&mut env, &text)?;
        api::measure_text(&text)
    });
    match result {
        Ok(width) => width,
        Err(e) => {
            throw(&mut env, ILLEGAL_STATE, &e);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panics_become_bridge_errors() {
        let err = guarded::<()>("boom", || panic!("kaboom")).unwrap_err();
        assert!(matches!(&err, PhotonError::Bridge(m) if m.contains("kaboom")));

        let owned = guarded::<()>("boom", || panic!("{}", String::from("owned"))).unwrap_err();
        assert!(owned.to_string().contains("owned"));
    }

    #[test]
    fn errors_pass_through_unchanged() {
        assert_eq!(guarded("ok", || Ok(5)).unwrap(), 5);
        let err = guarded::<()>("err", || Err(PhotonError::Protocol("bad".into()))).unwrap_err();
        assert_eq!(apply_exception_class(&err), ILLEGAL_ARGUMENT);
        assert_eq!(apply_exception_class(&PhotonError::Bridge("x".into())), ILLEGAL_STATE);
    }
}
