//! The callback a front-end reports parse errors through.

/// Receives errors from a front-end while it parses.
///
/// Coordinates are 1-based with an inclusive start. Calls arrive synchronously
/// on the parsing thread and never after `parse` returns. Implementations must
/// not fail and must not block.
pub trait ErrorSink {
    fn report(
        &mut self,
        filename: &str,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
        message: &str,
    );
}
