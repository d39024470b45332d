//! Python-facing surface of the probe.

use pyo3::prelude::*;

use crate::preserve::with_preserved_error;
use crate::probe;
use crate::py_host::PyHost;

/// Disassemble the currently executing Python frame.
///
/// Prints a marker-framed disassembly block on `sys.stdout` (or a labelled
/// "no frame" block when there is no interpreted call stack) and returns
/// `None`. Never raises: the caller's pending-error state is restored
/// verbatim on every exit path.
#[pyfunction]
#[pyo3(signature = (marker = "MARKER"))]
pub fn disassemble_frame(py: Python<'_>, marker: &str) {
    with_preserved_error(py, |py| match PyHost::new(py) {
        Ok(mut host) => probe::run(&mut host, marker),
        Err(err) => {
            // sys.stdout itself is unusable; there is no primary stream to
            // frame a block on.
            log::warn!("frame probe could not bind sys.stdout: {err}");
        }
    });
}

/// Entry point for native callers that may not already hold the interpreter
/// lock. Attachment is scoped to this one invocation and released on every
/// exit path.
pub fn disassemble_current_frame(marker: &str) {
    Python::attach(|py| disassemble_frame(py, marker));
}

#[pymodule]
pub fn frame_probe(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(disassemble_frame, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
