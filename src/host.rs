//! Narrow adapter over the host interpreter.
//!
//! The frame and code objects the probe inspects are owned and mutated by
//! the interpreter; the probe only ever holds borrowed references for the
//! duration of one invocation. Modelling that seam as a trait keeps the
//! orchestration in [`crate::probe`] testable against a fake host.

use std::fmt::Display;
use std::io::{self, Write};

use crate::access::RuntimeMode;

/// Identifying metadata extracted from a live frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDetails {
    /// Byte offset of the currently executing instruction within its code
    /// object (`f_lasti`).
    pub instruction_offset: i64,
    /// Source line currently executing (`f_lineno`).
    pub current_line: i64,
    /// Source file backing the frame's code object (`co_filename`).
    pub source_path: String,
}

/// Capabilities the probe consumes from the interpreter.
///
/// `Frame` stays opaque to the orchestration; only the production adapter
/// knows it is a Python frame object. Errors from any capability are
/// incidental: the probe reports them on the secondary stream and never
/// propagates them to the caller.
pub trait Host {
    type Frame;
    type Error: Display;

    /// Concurrency mode of the interpreter. `FreeThreaded` means exclusive
    /// access is structurally unavailable and introspection must not be
    /// attempted.
    fn runtime_mode(&mut self) -> RuntimeMode;

    /// The frame executing right now relative to the calling context.
    /// `None` is a normal outcome: the probe was invoked from native-only
    /// call depth.
    fn current_frame(&mut self) -> Result<Option<Self::Frame>, Self::Error>;

    fn frame_details(&mut self, frame: &Self::Frame) -> Result<FrameDetails, Self::Error>;

    /// Print a disassembly listing for `frame` to the primary stream,
    /// centered on `details.instruction_offset`. Pass-through: the listing
    /// is neither parsed nor buffered by the probe.
    fn disassemble(
        &mut self,
        frame: &Self::Frame,
        details: &FrameDetails,
    ) -> Result<(), Self::Error>;

    /// Stream carrying the marker block and the interleaved listing.
    fn primary(&mut self) -> &mut dyn Write;

    /// Stream for diagnostics that must not interleave with the marker
    /// block: the unsupported-mode notice and incidental error reports.
    fn secondary(&mut self) -> &mut dyn Write;

    fn flush_primary(&mut self) -> io::Result<()>;
}
