/// Black Magic Probe debugger front-end: GDB/MI session management,
/// record classification, and the supporting models (breakpoints, watches,
/// locals, registers, memory, source, SWO trace) built on top of it.
use thiserror::Error;

pub mod commands;
pub mod communication;
pub mod completion;
pub mod config;
pub mod history;
pub mod hover;
pub mod interceptor;
pub mod lexer;
pub mod models;
pub mod parser;
pub mod process;
pub mod record_store;
pub mod register_alias;
pub mod session;
pub mod source;
pub mod state_machine;
pub mod trace_grammar;
pub mod types;

pub use commands::{Breakpoint as CommandBreakpoint, CommandError, GdbCommands, StackFrame, Variable};
pub use communication::{CommunicationError, GdbCommunication};
pub use config::{ElfConfig, GlobalConfig};
pub use hover::HoverValue;
pub use models::{
    extract_breakpoints, extract_disassembly, extract_memory, extract_registers, AssemblyLine,
    Breakpoint as ModelBreakpoint, Local, MemoryDump, Register, RefreshKind, RegisterValue, Watch,
};
pub use parser::*;
pub use process::{GdbProcess, ProcessError};
pub use record_store::{Cursor, RecordStore};
pub use register_alias::SvdSource;
pub use session::{ConsoleOutcome, FrameOutcome, Session, SessionError};
pub use types::*;

#[derive(Error, Debug)]
pub enum GdbError {
    #[error("Failed to start GDB process: {0}")]
    ProcessStartError(#[from] std::io::Error),
    #[error("GDB command failed: {0}")]
    CommandError(String),
    #[error("Failed to parse GDB output: {0}")]
    ParseError(String),
    #[error("GDB process terminated unexpectedly")]
    ProcessTerminated,
    #[error("Communication error: {0}")]
    CommunicationError(String),
}

pub type Result<T> = std::result::Result<T, GdbError>;
