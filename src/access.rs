//! Exclusive-access classification.
//!
//! On a GIL interpreter the `Python<'_>` token the probe already holds *is*
//! exclusive access: no other thread runs interpreter code while the probe
//! does, and `Python::attach`'s closure scope releases it exactly once on
//! every exit path. On a free-threaded interpreter no such global lock
//! exists, so serialized introspection is structurally unavailable and the
//! probe must refuse to run rather than take racy reads of frame state.

use std::sync::OnceLock;

use pyo3::intern;
use pyo3::prelude::*;

/// Concurrency mode of the interpreter, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Global exclusive execution is the normal mode (GIL build).
    Exclusive,
    /// Free-threaded (no-GIL) build: exclusive access cannot be obtained.
    FreeThreaded,
}

static RUNTIME_MODE: OnceLock<RuntimeMode> = OnceLock::new();

/// Classify the interpreter, caching the answer for the process lifetime.
pub fn runtime_mode(py: Python<'_>) -> RuntimeMode {
    *RUNTIME_MODE.get_or_init(|| {
        let mode = detect(py);
        crate::probe_debug_log!("frame probe classified runtime as {:?}", mode);
        mode
    })
}

/// CPython 3.13+ reports the live mode through `sys._is_gil_enabled()`;
/// early free-threaded builds exposed `sys.flags.nogil` instead. A runtime
/// answering neither query is a plain GIL build.
fn detect(py: Python<'_>) -> RuntimeMode {
    let sys = match py.import("sys") {
        Ok(module) => module,
        Err(_) => return RuntimeMode::Exclusive,
    };

    if let Ok(query) = sys.getattr(intern!(py, "_is_gil_enabled")) {
        if let Ok(enabled) = query.call0().and_then(|v| v.extract::<bool>()) {
            return if enabled {
                RuntimeMode::Exclusive
            } else {
                RuntimeMode::FreeThreaded
            };
        }
    }

    match sys.getattr(intern!(py, "flags")) {
        Ok(flags) if flags.hasattr(intern!(py, "nogil")).unwrap_or(false) => {
            RuntimeMode::FreeThreaded
        }
        _ => RuntimeMode::Exclusive,
    }
}
