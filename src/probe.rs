//! Probe orchestration and marker-framed reporting.
//!
//! One synchronous operation per invocation: classify the runtime, resolve
//! the current frame, and emit a marker-framed block on the primary stream.
//! Nothing here returns an error to the caller; every failure from the host
//! folds into a marker-prefixed report on the secondary stream.

use std::fmt::Display;
use std::io::Write;

use crate::access::RuntimeMode;
use crate::host::Host;

/// Run the probe against `host`, framing all primary output with `marker`.
pub fn run<H: Host>(host: &mut H, marker: &str) {
    if host.runtime_mode() == RuntimeMode::FreeThreaded {
        report_unsupported(host.secondary(), marker);
        return;
    }

    match host.current_frame() {
        Err(err) => report_incidental(host.secondary(), marker, &err),
        Ok(None) => {
            // Distinct from a resolved-but-empty frame: there is no
            // interpreted call stack at this depth.
            let _ = write!(host.primary(), "\n{marker} BEGIN no frame END\n\n");
        }
        Ok(Some(frame)) => match host.frame_details(&frame) {
            Err(err) => report_incidental(host.secondary(), marker, &err),
            Ok(details) => {
                let _ = write!(
                    host.primary(),
                    "\n{marker} BEGIN line={} {}\n",
                    details.current_line, details.source_path
                );
                if let Err(err) = host.disassemble(&frame, &details) {
                    report_incidental(host.secondary(), marker, &err);
                }
                // The block is closed even when the listing failed, so the
                // partial output already produced stays well-formed.
                let _ = write!(
                    host.primary(),
                    "{marker} END line={} {}\n\n",
                    details.current_line, details.source_path
                );
            }
        },
    }

    if let Err(err) = host.flush_primary() {
        report_incidental(host.secondary(), marker, &err);
    }
}

fn report_unsupported(out: &mut dyn Write, marker: &str) {
    let _ = write!(
        out,
        "\n{marker} ERROR: frame disassembly requires exclusive interpreter access.\n\
         {marker}        free-threaded (no-GIL) runtimes are not supported.\n\n"
    );
}

fn report_incidental(out: &mut dyn Write, marker: &str, err: &dyn Display) {
    let _ = writeln!(out, "{marker} probe error: {err}");
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::*;
    use crate::host::FrameDetails;

    struct FakeHost {
        mode: RuntimeMode,
        frame: Option<FrameDetails>,
        details_error: Option<String>,
        disasm_error: Option<String>,
        listing: String,
        frame_queries: usize,
        flushes: usize,
        primary: Vec<u8>,
        secondary: Vec<u8>,
    }

    impl FakeHost {
        fn with_frame(details: FrameDetails) -> Self {
            FakeHost {
                frame: Some(details),
                ..FakeHost::empty()
            }
        }

        fn empty() -> Self {
            FakeHost {
                mode: RuntimeMode::Exclusive,
                frame: None,
                details_error: None,
                disasm_error: None,
                listing: "  0 LOAD_GLOBAL  probe\n  2 CALL  1\n".to_string(),
                frame_queries: 0,
                flushes: 0,
                primary: Vec::new(),
                secondary: Vec::new(),
            }
        }

        fn primary_text(&self) -> &str {
            std::str::from_utf8(&self.primary).unwrap()
        }

        fn secondary_text(&self) -> &str {
            std::str::from_utf8(&self.secondary).unwrap()
        }
    }

    impl Host for FakeHost {
        type Frame = FrameDetails;
        type Error = String;

        fn runtime_mode(&mut self) -> RuntimeMode {
            self.mode
        }

        fn current_frame(&mut self) -> Result<Option<FrameDetails>, String> {
            self.frame_queries += 1;
            Ok(self.frame.clone())
        }

        fn frame_details(&mut self, frame: &FrameDetails) -> Result<FrameDetails, String> {
            match &self.details_error {
                Some(err) => Err(err.clone()),
                None => Ok(frame.clone()),
            }
        }

        fn disassemble(
            &mut self,
            _frame: &FrameDetails,
            _details: &FrameDetails,
        ) -> Result<(), String> {
            if let Some(err) = &self.disasm_error {
                return Err(err.clone());
            }
            let listing = self.listing.clone();
            self.primary.extend_from_slice(listing.as_bytes());
            Ok(())
        }

        fn primary(&mut self) -> &mut dyn Write {
            &mut self.primary
        }

        fn secondary(&mut self) -> &mut dyn Write {
            &mut self.secondary
        }

        fn flush_primary(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn sample_details() -> FrameDetails {
        FrameDetails {
            instruction_offset: 24,
            current_line: 42,
            source_path: "/tmp/x.py".to_string(),
        }
    }

    #[test]
    fn test_no_frame_block_is_exact() {
        let mut host = FakeHost::empty();
        run(&mut host, "MARKER");
        assert_eq!(host.primary_text(), "\nMARKER BEGIN no frame END\n\n");
        assert!(host.secondary.is_empty());
        assert_eq!(host.flushes, 1);
    }

    #[test]
    fn test_resolved_frame_block_brackets_listing() {
        let mut host = FakeHost::with_frame(sample_details());
        run(&mut host, "T1");

        let out = host.primary_text().to_string();
        let begin = out.find("T1 BEGIN line=42 /tmp/x.py\n").expect("BEGIN line");
        let listing = out.find("LOAD_GLOBAL").expect("listing");
        let end = out.find("T1 END line=42 /tmp/x.py\n").expect("END line");
        assert!(begin < listing && listing < end);
        assert!(out.starts_with('\n'));
        assert!(out.ends_with("\n\n"));
        assert!(host.secondary.is_empty());
    }

    #[test]
    fn test_free_threaded_mode_skips_introspection() {
        let mut host = FakeHost::with_frame(sample_details());
        host.mode = RuntimeMode::FreeThreaded;
        run(&mut host, "FT");

        assert_eq!(host.frame_queries, 0, "must not touch the frame");
        assert!(host.primary.is_empty());
        let diag = host.secondary_text();
        let marked: Vec<&str> = diag
            .lines()
            .filter(|line| !line.is_empty())
            .collect();
        assert_eq!(marked.len(), 2);
        assert!(marked.iter().all(|line| line.starts_with("FT")));
        assert!(diag.contains("free-threaded"));
    }

    #[test]
    fn test_details_failure_reports_and_skips_block() {
        let mut host = FakeHost::with_frame(sample_details());
        host.details_error = Some("f_lineno is not an int".to_string());
        run(&mut host, "D1");

        assert!(host.primary.is_empty());
        assert_eq!(
            host.secondary_text(),
            "D1 probe error: f_lineno is not an int\n"
        );
        assert_eq!(host.flushes, 1);
    }

    #[test]
    fn test_disassembly_failure_still_closes_block() {
        let mut host = FakeHost::with_frame(sample_details());
        host.disasm_error = Some("no module named dis".to_string());
        run(&mut host, "D2");

        let out = host.primary_text();
        assert!(out.contains("D2 BEGIN line=42 /tmp/x.py\n"));
        assert!(out.contains("D2 END line=42 /tmp/x.py\n"));
        assert!(!out.contains("LOAD_GLOBAL"));
        assert!(host.secondary_text().contains("no module named dis"));
    }

    #[test]
    fn test_sequential_invocations_do_not_interleave() {
        let mut host = FakeHost::with_frame(sample_details());
        run(&mut host, "M1");
        host.frame = None;
        run(&mut host, "M2");

        let out = host.primary_text();
        let m1_end = out.find("M1 END").expect("first block closed");
        let m2_begin = out.find("M2 BEGIN").expect("second block opened");
        assert!(m1_end < m2_begin);
        assert_eq!(host.flushes, 2);
    }

    #[test]
    fn test_unavailable_frame_lookup_reports_incidentally() {
        struct FailingLookup(FakeHost);

        impl Host for FailingLookup {
            type Frame = FrameDetails;
            type Error = String;

            fn runtime_mode(&mut self) -> RuntimeMode {
                RuntimeMode::Exclusive
            }

            fn current_frame(&mut self) -> Result<Option<FrameDetails>, String> {
                Err("thread state unavailable".to_string())
            }

            fn frame_details(&mut self, frame: &FrameDetails) -> Result<FrameDetails, String> {
                Ok(frame.clone())
            }

            fn disassemble(
                &mut self,
                _frame: &FrameDetails,
                _details: &FrameDetails,
            ) -> Result<(), String> {
                Ok(())
            }

            fn primary(&mut self) -> &mut dyn Write {
                &mut self.0.primary
            }

            fn secondary(&mut self) -> &mut dyn Write {
                &mut self.0.secondary
            }

            fn flush_primary(&mut self) -> io::Result<()> {
                self.0.flushes += 1;
                Ok(())
            }
        }

        let mut host = FailingLookup(FakeHost::empty());
        run(&mut host, "L1");
        assert!(host.0.primary.is_empty());
        assert_eq!(
            host.0.secondary_text(),
            "L1 probe error: thread state unavailable\n"
        );
    }
}
