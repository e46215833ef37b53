/// Command Interceptor: inspects a user-typed command line before it is
/// sent to GDB, in a fixed handler order, and decides whether to swallow
/// it, rewrite and forward it, or pass it through untouched.
use crate::trace_grammar::parse_trace_command;

#[derive(Debug, Clone, PartialEq)]
pub enum InterceptResult {
    Handled,
    HandledAndForward(String),
    NotHandled,
}

pub trait InterceptorHandler {
    fn name(&self) -> &'static str;
    fn try_handle(&self, command: &str) -> InterceptResult;
}

/// Triggers a breakpoint-list refresh after any `break-*`/`b `/`tbreak`
/// family command completes — it forwards the command unmodified but flags
/// that the caller should schedule a breakpoint refresh.
pub struct BreakpointRefreshHandler;

impl InterceptorHandler for BreakpointRefreshHandler {
    fn name(&self) -> &'static str {
        "breakpoint-refresh"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        let trimmed = command.trim();
        let is_breakpoint_family = ["break", "b ", "tbreak", "watch", "rwatch", "awatch", "delete", "clear", "enable", "disable"]
            .iter()
            .any(|prefix| trimmed.starts_with(prefix));
        if is_breakpoint_family {
            InterceptResult::HandledAndForward(command.to_string())
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// Rewrites a bare `reset` alias into the probe-specific monitor command.
pub struct ResetAliasHandler;

impl InterceptorHandler for ResetAliasHandler {
    fn name(&self) -> &'static str {
        "reset-alias"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        match command.trim() {
            "reset" => InterceptResult::HandledAndForward("monitor reset".to_string()),
            "hard reset" => InterceptResult::HandledAndForward("monitor hard_srst".to_string()),
            _ => InterceptResult::NotHandled,
        }
    }
}

/// Swallows a lone `help` typed at the console, producing purely local
/// output rather than round-tripping through GDB.
pub struct LocalHelpHandler;

impl InterceptorHandler for LocalHelpHandler {
    fn name(&self) -> &'static str {
        "local-help"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        if command.trim() == "help" {
            InterceptResult::Handled
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// Rewrites `info ...` into the MI/monitor equivalent console command. GDB's
/// CLI `info` sub-commands have no direct MI counterpart, so this forwards
/// through `interpreter-exec console` rather than a native MI verb.
pub struct InfoHandler;

impl InterceptorHandler for InfoHandler {
    fn name(&self) -> &'static str {
        "info"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        if command.trim().starts_with("info ") {
            InterceptResult::HandledAndForward(command.trim().to_string())
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `list`, `list +`, `list -`, `list N`, `list file:N`, `list function` —
/// all forwarded to GDB's own `list` command, which already understands
/// every one of these forms.
pub struct ListHandler;

impl InterceptorHandler for ListHandler {
    fn name(&self) -> &'static str {
        "list"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        let trimmed = command.trim();
        if trimmed == "list" || trimmed == "list +" || trimmed == "list -" || trimmed.starts_with("list ") {
            InterceptResult::HandledAndForward(trimmed.to_string())
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `find start, end, pattern` — memory search, forwarded unmodified.
pub struct FindHandler;

impl InterceptorHandler for FindHandler {
    fn name(&self) -> &'static str {
        "find"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        if command.trim().starts_with("find ") {
            InterceptResult::HandledAndForward(command.trim().to_string())
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `x[/Nfsu] expr` — memory examine, forwarded unmodified; GDB's own
/// flag/format/size/unit parsing handles the optional `/Nfsu` suffix.
pub struct ExamineHandler;

impl InterceptorHandler for ExamineHandler {
    fn name(&self) -> &'static str {
        "examine"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        let trimmed = command.trim();
        if trimmed == "x" || trimmed.starts_with("x/") || trimmed.starts_with("x ") {
            InterceptResult::HandledAndForward(trimmed.to_string())
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `display`/`undisplay` — auto-display expressions re-evaluated at every
/// stop, forwarded to GDB's own implementation.
pub struct DisplayHandler;

impl InterceptorHandler for DisplayHandler {
    fn name(&self) -> &'static str {
        "display"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        let trimmed = command.trim();
        if trimmed.starts_with("display") || trimmed.starts_with("undisplay") {
            InterceptResult::HandledAndForward(trimmed.to_string())
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `file PATH`, `load`, `reset load` — (re)loading an executable and
/// re-flashing it; `reset load` is rewritten into the probe-specific
/// `monitor reset` followed by the caller re-downloading (the caller
/// inspects the returned string for the `reset load` alias and triggers a
/// follow-up `target-download` itself).
pub struct FileLoadHandler;

impl InterceptorHandler for FileLoadHandler {
    fn name(&self) -> &'static str {
        "file-load"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        let trimmed = command.trim();
        match trimmed {
            "load" => InterceptResult::HandledAndForward("target-download".to_string()),
            "reset load" => InterceptResult::HandledAndForward("monitor reset".to_string()),
            _ if trimmed.starts_with("file ") => InterceptResult::HandledAndForward(trimmed.to_string()),
            _ => InterceptResult::NotHandled,
        }
    }
}

/// `trace start|stop|status|channel ...` — validated against the trace
/// grammar before forwarding, so a malformed trace command is rejected
/// locally instead of round-tripping to GDB.
pub struct TraceHandler;

impl InterceptorHandler for TraceHandler {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        let trimmed = command.trim();
        if !trimmed.starts_with("trace") {
            return InterceptResult::NotHandled;
        }
        match parse_trace_command(trimmed) {
            Ok(_) => InterceptResult::HandledAndForward(trimmed.to_string()),
            Err(_) => InterceptResult::Handled,
        }
    }
}

/// `serial ...` — serial monitor configuration; the serial-port monitor
/// itself is an external collaborator (out of scope), so this only
/// recognizes the command so it isn't round-tripped to GDB as an unknown
/// CLI verb.
pub struct SerialHandler;

impl InterceptorHandler for SerialHandler {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        if command.trim().starts_with("serial") {
            InterceptResult::Handled
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `semihosting clear` — clears the semihosting output pane; purely local,
/// the caller inspects the result to know to clear its own buffer.
pub struct SemihostingHandler;

impl InterceptorHandler for SemihostingHandler {
    fn name(&self) -> &'static str {
        "semihosting"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        if command.trim() == "semihosting clear" {
            InterceptResult::Handled
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `directory PATH` — adds a source search path, forwarded unmodified.
pub struct DirectoryHandler;

impl InterceptorHandler for DirectoryHandler {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        if command.trim().starts_with("directory ") {
            InterceptResult::HandledAndForward(command.trim().to_string())
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// `disassemble`/`assembly` — forwarded to GDB's `disassemble`; `assembly`
/// is accepted as a synonym some front-ends use.
pub struct DisassembleHandler;

impl InterceptorHandler for DisassembleHandler {
    fn name(&self) -> &'static str {
        "disassemble"
    }

    fn try_handle(&self, command: &str) -> InterceptResult {
        let trimmed = command.trim();
        if trimmed == "disassemble" || trimmed.starts_with("disassemble ") {
            InterceptResult::HandledAndForward(trimmed.to_string())
        } else if trimmed == "assembly" || trimmed.starts_with("assembly ") {
            InterceptResult::HandledAndForward(trimmed.replacen("assembly", "disassemble", 1))
        } else {
            InterceptResult::NotHandled
        }
    }
}

/// Dispatches a command through a fixed-order chain of handlers, stopping
/// at the first one that claims it.
pub struct CommandTable {
    handlers: Vec<Box<dyn InterceptorHandler + Send + Sync>>,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTable {
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(LocalHelpHandler),
                Box::new(ResetAliasHandler),
                Box::new(BreakpointRefreshHandler),
                Box::new(InfoHandler),
                Box::new(ListHandler),
                Box::new(FindHandler),
                Box::new(ExamineHandler),
                Box::new(DisplayHandler),
                Box::new(FileLoadHandler),
                Box::new(TraceHandler),
                Box::new(SerialHandler),
                Box::new(SemihostingHandler),
                Box::new(DirectoryHandler),
                Box::new(DisassembleHandler),
            ],
        }
    }

    pub fn dispatch(&self, command: &str) -> InterceptResult {
        for handler in &self.handlers {
            match handler.try_handle(command) {
                InterceptResult::NotHandled => continue,
                result => return result,
            }
        }
        InterceptResult::NotHandled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_alias_rewrites_to_monitor_command() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("reset"),
            InterceptResult::HandledAndForward("monitor reset".to_string())
        );
    }

    #[test]
    fn breakpoint_family_forwards_unmodified() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("break main.c:10"),
            InterceptResult::HandledAndForward("break main.c:10".to_string())
        );
    }

    #[test]
    fn unrelated_command_passes_through() {
        let table = CommandTable::new();
        assert_eq!(table.dispatch("print x"), InterceptResult::NotHandled);
    }

    #[test]
    fn local_help_is_swallowed() {
        let table = CommandTable::new();
        assert_eq!(table.dispatch("help"), InterceptResult::Handled);
    }

    #[test]
    fn handler_order_is_fixed_help_before_reset() {
        let table = CommandTable::new();
        assert_eq!(table.handlers[0].name(), "local-help");
        assert_eq!(table.handlers[1].name(), "reset-alias");
    }

    #[test]
    fn info_command_forwards_unmodified() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("info registers"),
            InterceptResult::HandledAndForward("info registers".to_string())
        );
    }

    #[test]
    fn list_plus_and_minus_are_recognized() {
        let table = CommandTable::new();
        assert_eq!(table.dispatch("list +"), InterceptResult::HandledAndForward("list +".to_string()));
        assert_eq!(table.dispatch("list main.c:10"), InterceptResult::HandledAndForward("list main.c:10".to_string()));
    }

    #[test]
    fn examine_with_format_suffix_forwards() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("x/4xw $sp"),
            InterceptResult::HandledAndForward("x/4xw $sp".to_string())
        );
    }

    #[test]
    fn reset_load_rewrites_to_monitor_reset() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("reset load"),
            InterceptResult::HandledAndForward("monitor reset".to_string())
        );
    }

    #[test]
    fn load_rewrites_to_target_download() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("load"),
            InterceptResult::HandledAndForward("target-download".to_string())
        );
    }

    #[test]
    fn valid_trace_command_forwards_unmodified() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("trace start"),
            InterceptResult::HandledAndForward("trace start".to_string())
        );
    }

    #[test]
    fn invalid_trace_command_is_swallowed_not_forwarded() {
        let table = CommandTable::new();
        assert_eq!(table.dispatch("trace frobnicate"), InterceptResult::Handled);
    }

    #[test]
    fn semihosting_clear_is_swallowed() {
        let table = CommandTable::new();
        assert_eq!(table.dispatch("semihosting clear"), InterceptResult::Handled);
    }

    #[test]
    fn assembly_synonym_rewrites_to_disassemble() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("assembly main"),
            InterceptResult::HandledAndForward("disassemble main".to_string())
        );
    }

    #[test]
    fn directory_command_forwards_unmodified() {
        let table = CommandTable::new();
        assert_eq!(
            table.dispatch("directory /srv/src"),
            InterceptResult::HandledAndForward("directory /srv/src".to_string())
        );
    }
}
