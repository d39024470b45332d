//! CPython implementation of the host adapter.
//!
//! Frame and code objects are borrowed from the interpreter for the
//! duration of one probe invocation and never outlive it. The disassembly
//! capability (`dis.disco`) and the attribute-name handles are resolved
//! lazily and cached for the process lifetime; `sys.stdout` is resolved per
//! invocation so stream redirection keeps working.

use std::io::{self, Write};
use std::sync::OnceLock;

use pyo3::ffi;
use pyo3::intern;
use pyo3::prelude::*;

use crate::access::{self, RuntimeMode};
use crate::host::{FrameDetails, Host};

static DISCO: OnceLock<Py<PyAny>> = OnceLock::new();

/// `dis.disco`, resolved once per process. A concurrent first use under the
/// exclusive-access window makes the publish race benign: one resolution
/// wins, the loser is dropped while still attached.
fn disco(py: Python<'_>) -> PyResult<&'static Py<PyAny>> {
    if let Some(capability) = DISCO.get() {
        return Ok(capability);
    }
    let resolved = py.import("dis")?.getattr(intern!(py, "disco"))?.unbind();
    crate::probe_debug_log!("frame probe resolved dis.disco");
    Ok(DISCO.get_or_init(|| resolved))
}

/// `io::Write` adapter over a Python text stream.
///
/// Marker lines go through the same `sys.stdout` object the `dis` listing
/// is printed to, so both share one buffer and one flush and their relative
/// order is deterministic.
pub struct PyStreamWriter<'py> {
    stream: Bound<'py, PyAny>,
}

impl io::Write for PyStreamWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let py = self.stream.py();
        let text = std::str::from_utf8(buf).map_err(io::Error::other)?;
        self.stream
            .call_method1(intern!(py, "write"), (text,))
            .map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let py = self.stream.py();
        self.stream
            .call_method0(intern!(py, "flush"))
            .map_err(io::Error::other)?;
        Ok(())
    }
}

/// Live interpreter as seen by the probe.
pub struct PyHost<'py> {
    py: Python<'py>,
    primary: PyStreamWriter<'py>,
    secondary: io::Stderr,
}

impl<'py> PyHost<'py> {
    /// Bind the probe to the interpreter's current `sys.stdout`.
    pub fn new(py: Python<'py>) -> PyResult<Self> {
        let stdout = py.import("sys")?.getattr(intern!(py, "stdout"))?;
        Ok(PyHost {
            py,
            primary: PyStreamWriter { stream: stdout },
            secondary: io::stderr(),
        })
    }
}

impl<'py> Host for PyHost<'py> {
    type Frame = Bound<'py, PyAny>;
    type Error = PyErr;

    fn runtime_mode(&mut self) -> RuntimeMode {
        access::runtime_mode(self.py)
    }

    fn current_frame(&mut self) -> PyResult<Option<Bound<'py, PyAny>>> {
        // Borrowed pointer to the interpreter's notion of "the frame that
        // is executing right now"; NULL at native-only call depth.
        let raw = unsafe { ffi::PyEval_GetFrame() };
        Ok(unsafe { Bound::from_borrowed_ptr_or_opt(self.py, raw.cast()) })
    }

    fn frame_details(&mut self, frame: &Bound<'py, PyAny>) -> PyResult<FrameDetails> {
        let py = self.py;
        let instruction_offset: i64 = frame.getattr(intern!(py, "f_lasti"))?.extract()?;
        let current_line: i64 = frame.getattr(intern!(py, "f_lineno"))?.extract()?;
        let code = frame.getattr(intern!(py, "f_code"))?;
        let source_path: String = code.getattr(intern!(py, "co_filename"))?.extract()?;
        Ok(FrameDetails {
            instruction_offset,
            current_line,
            source_path,
        })
    }

    fn disassemble(&mut self, frame: &Bound<'py, PyAny>, details: &FrameDetails) -> PyResult<()> {
        let py = self.py;
        let code = frame.getattr(intern!(py, "f_code"))?;
        disco(py)?
            .bind(py)
            .call1((code, details.instruction_offset))?;
        Ok(())
    }

    fn primary(&mut self) -> &mut dyn Write {
        &mut self.primary
    }

    fn secondary(&mut self) -> &mut dyn Write {
        &mut self.secondary
    }

    fn flush_primary(&mut self) -> io::Result<()> {
        self.primary.flush()
    }
}
