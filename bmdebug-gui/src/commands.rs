/// Commands that can be sent to the debug session
///
/// This module defines the command interface for controlling GDB/Black
/// Magic Probe operations from the GUI.

#[derive(Debug, Clone)]
pub enum GdbCommand {
    Continue,
    StepOver,
    StepInto,
    StepOut,
    Interrupt,
    SetBreakpoint(String),
    RefreshDebugInfo,
    ReadMemory(String, u32),
    /// Spawn GDB, connect to the probe and load `elf_path`.
    StartSession {
        gdb_path: String,
        elf_path: String,
        target_index: u32,
    },
    StopSession,
    /// Run a line typed in the console through the register-alias rewriter,
    /// the command interceptor, and (if not swallowed locally) GDB itself.
    SubmitConsole(String),
    /// Move the console's history cursor and report the entry it landed on.
    HistoryPrev,
    HistoryNext,
    /// Ask the completion engine for candidates matching a partial line.
    RequestCompletion(String),
    /// Evaluate a symbol for the hover tooltip.
    HoverEval(String),
    /// Create a new watch expression.
    AddWatch(String),
}

/// Events that come from the debug session or debugging operations
#[derive(Debug)]
pub enum DebugEvent {
    RegistersUpdated(Vec<gdbadapter::Register>),
    StackFramesUpdated(Vec<gdbadapter::StackFrame>),
    AssemblyUpdated(Vec<gdbadapter::AssemblyLine>),
    BreakpointsUpdated(Vec<gdbadapter::ModelBreakpoint>),
    LocalsUpdated(Vec<gdbadapter::Local>),
    WatchesUpdated(Vec<gdbadapter::Watch>),
    MemoryUpdated(gdbadapter::MemoryDump),
    ConsoleMessage(String),
    /// The completion engine's candidates for the in-flight `RequestCompletion`.
    CompletionSuggestions(Vec<String>),
    /// The history entry `HistoryPrev`/`HistoryNext` landed on, if any.
    HistoryEntry(Option<String>),
    /// The resolved hover value for the most recent `HoverEval`, if any.
    HoverResolved(Option<gdbadapter::HoverValue>),
    SessionStarted,
    SessionStartFailed(String),
    SessionStopped,
    // Command completion events
    CommandCompleted(GdbCommand),
    CommandFailed(GdbCommand, String),
    GdbConnectionLost,
    TargetStateChanged(TargetState),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetState {
    Running,
    Stopped,
    Detached,
}
