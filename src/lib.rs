//! frame-probe: debugger-support probe that disassembles the currently
//! executing Python frame.
//!
//! Invoked with a marker string, the probe prints a disassembly of the
//! caller's frame to `sys.stdout`, bracketed by `BEGIN`/`END` marker lines
//! so an external tool (e.g. an IDE debugger) can locate the block, then
//! returns with the thread's pending-error state exactly as it found it.
//!
//! # Architecture
//!
//! - **`access`**: classifies the interpreter's concurrency mode; on
//!   free-threaded runtimes introspection is refused up front
//! - **`preserve`**: snapshot/restore of the thread's pending-error state
//! - **`host`**: narrow adapter trait over interpreter internals
//! - **`py_host`**: the CPython implementation of that adapter
//! - **`probe`**: orchestration and marker-framed reporting

pub mod access;
pub mod host;
pub mod preserve;
pub mod probe;
mod probe_logging;
pub mod py_host;
pub mod pyprobe;

// Re-exports for convenience
pub use access::RuntimeMode;
pub use host::{FrameDetails, Host};
pub use preserve::with_preserved_error;
pub use py_host::PyHost;
pub use pyprobe::{disassemble_current_frame, disassemble_frame, frame_probe};
