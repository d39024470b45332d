//! Ambient error preservation.
//!
//! The probe is a diagnostic side effect: the calling thread may already be
//! carrying a pending error when it fires, and nothing the probe does is
//! allowed to disturb that state or raise a new error into the caller.

use pyo3::prelude::*;

/// Run `op` with the calling thread's pending-error state snapshotted and
/// restored afterwards.
///
/// Any error `op` itself raised or cleared is invisible to the caller: an
/// error still raised when `op` returns is taken off the thread state and
/// reported through `log`, then the snapshot is restored verbatim.
pub fn with_preserved_error<F>(py: Python<'_>, op: F)
where
    F: FnOnce(Python<'_>),
{
    let ambient = PyErr::take(py);

    op(py);

    if let Some(leaked) = PyErr::take(py) {
        log::warn!("frame probe discarded an internal error: {leaked}");
    }
    if let Some(err) = ambient {
        err.restore(py);
    }
}
