//! Per-parse object graph: the front-end trait, the parse context that links
//! a fresh program to the shared system, and the parser that binds both to an
//! error sink.

use crate::sink::ErrorSink;

/// A compiler front-end that can be driven by the diagnostics bridge.
pub trait FrontEnd {
    /// Built-in types and symbols. Built once per session, then shared (and
    /// extended) by every parse.
    type System;
    /// Syntax container for a single parse. Never reused.
    type Program;

    fn new_system(&self) -> Self::System;

    fn new_program(&self) -> Self::Program;

    /// Parse `input` as the contents of `filename`, reporting every error to
    /// `sink` before returning.
    fn parse(
        &self,
        context: &mut ParseContext<'_, Self::System, Self::Program>,
        sink: &mut dyn ErrorSink,
        filename: &str,
        input: &[u8],
    );
}

/// A fresh program attached to the shared system for the span of one parse.
///
/// The program's parent and its system are the same value; both accessors
/// resolve to it.
pub struct ParseContext<'u, S, P> {
    system: &'u mut S,
    program: P,
}

impl<'u, S, P> ParseContext<'u, S, P> {
    pub fn new(system: &'u mut S, program: P) -> Self {
        Self { system, program }
    }

    /// Scope the program resolves unknown names in.
    #[must_use]
    pub fn parent(&self) -> &S {
        &*self.system
    }

    #[must_use]
    pub fn system(&self) -> &S {
        &*self.system
    }

    pub fn system_mut(&mut self) -> &mut S {
        &mut *self.system
    }

    #[must_use]
    pub fn program(&self) -> &P {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut P {
        &mut self.program
    }

    #[must_use]
    pub fn into_program(self) -> P {
        self.program
    }
}

/// One parser per parse, bound to an error sink and a fresh program.
pub struct Parser<'a, 'u, F: FrontEnd> {
    front_end: &'a F,
    sink: &'a mut dyn ErrorSink,
    context: ParseContext<'u, F::System, F::Program>,
}

impl<'a, 'u, F: FrontEnd> Parser<'a, 'u, F> {
    pub fn new(
        front_end: &'a F,
        sink: &'a mut dyn ErrorSink,
        context: ParseContext<'u, F::System, F::Program>,
    ) -> Self {
        Self {
            front_end,
            sink,
            context,
        }
    }

    /// Entry point. Only the first `len` bytes of `input` are parsed; every
    /// outcome is reported through the sink.
    pub fn parse(&mut self, filename: &str, input: &[u8], len: usize) {
        let input = input.get(..len).unwrap_or(input);
        self.front_end
            .parse(&mut self.context, &mut *self.sink, filename, input);
    }

    #[must_use]
    pub fn into_context(self) -> ParseContext<'u, F::System, F::Program> {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Universe {
        programs_attached: usize,
    }

    #[derive(Default)]
    struct Program {
        statements: Vec<String>,
    }

    /// Reports one error per line containing `?`.
    struct LineFrontEnd;

    impl FrontEnd for LineFrontEnd {
        type System = Universe;
        type Program = Program;

        fn new_system(&self) -> Universe {
            Universe::default()
        }

        fn new_program(&self) -> Program {
            Program::default()
        }

        fn parse(
            &self,
            context: &mut ParseContext<'_, Universe, Program>,
            sink: &mut dyn ErrorSink,
            filename: &str,
            input: &[u8],
        ) {
            context.system_mut().programs_attached += 1;
            let text = String::from_utf8_lossy(input);
            for (index, line) in text.lines().enumerate() {
                let line_no = index as u32 + 1;
                match line.find('?') {
                    Some(col) => {
                        let col = col as u32 + 1;
                        sink.report(filename, line_no, col, line_no, col + 1, "unexpected `?`");
                    }
                    None => context.program_mut().statements.push(line.to_string()),
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        reports: Vec<(String, u32, u32, u32, u32, String)>,
    }

    impl ErrorSink for RecordingSink {
        fn report(
            &mut self,
            filename: &str,
            start_line: u32,
            start_column: u32,
            end_line: u32,
            end_column: u32,
            message: &str,
        ) {
            self.reports.push((
                filename.to_string(),
                start_line,
                start_column,
                end_line,
                end_column,
                message.to_string(),
            ));
        }
    }

    #[test]
    fn test_parser_reports_through_sink() {
        let front_end = LineFrontEnd;
        let mut system = front_end.new_system();
        let mut sink = RecordingSink::default();

        let context = ParseContext::new(&mut system, front_end.new_program());
        let mut parser = Parser::new(&front_end, &mut sink, context);
        let input = b"a = 1;\nb = ?;\n";
        parser.parse("main.fu", input, input.len());

        let program = parser.into_context().into_program();
        assert_eq!(program.statements, ["a = 1;"]);
        assert_eq!(
            sink.reports,
            [("main.fu".to_string(), 2, 5, 2, 6, "unexpected `?`".to_string())]
        );
    }

    #[test]
    fn test_parse_respects_length() {
        let front_end = LineFrontEnd;
        let mut system = front_end.new_system();
        let mut sink = RecordingSink::default();

        let context = ParseContext::new(&mut system, front_end.new_program());
        let mut parser = Parser::new(&front_end, &mut sink, context);
        parser.parse("main.fu", b"ok\n?", 3);

        assert!(sink.reports.is_empty());
    }

    #[test]
    fn test_contexts_share_one_system() {
        let front_end = LineFrontEnd;
        let mut system = front_end.new_system();

        for _ in 0..3 {
            let mut sink = RecordingSink::default();
            let context = ParseContext::new(&mut system, front_end.new_program());
            assert!(std::ptr::eq(context.parent(), context.system()));
            let mut parser = Parser::new(&front_end, &mut sink, context);
            parser.parse("main.fu", b"x", 1);
        }

        assert_eq!(system.programs_attached, 3);
    }
}
