/// GDB/MI types and data structures
///
/// This module defines the data structures used to represent GDB/MI protocol
/// messages, plus the classified-record flag set the rest of the crate
/// builds on (see `RecordFlags`).
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Represents the different types of GDB output
#[derive(Debug, Clone, PartialEq)]
pub enum GdbOutput {
    Result(GdbResult),
    Async(AsyncRecord),
    Stream(StreamRecord),
}

/// Represents a GDB/MI result record
#[derive(Debug, Clone, PartialEq)]
pub struct GdbResult {
    pub token: Option<u32>,
    pub class: ResultClass,
    pub results: HashMap<String, Value>,
}

/// GDB/MI result classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

/// Represents a GDB/MI async record
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncRecord {
    pub token: Option<u32>,
    pub class: AsyncClass,
    pub results: HashMap<String, Value>,
}

/// GDB/MI async classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncClass {
    // Exec async records
    Running,
    Stopped,

    // Notify async records
    ThreadGroupAdded,
    ThreadGroupRemoved,
    ThreadGroupStarted,
    ThreadGroupExited,
    ThreadCreated,
    ThreadExited,
    ThreadSelected,
    LibraryLoaded,
    LibraryUnloaded,
    TraceframeChanged,
    TsvCreated,
    TsvDeleted,
    TsvModified,
    BreakpointCreated,
    BreakpointModified,
    BreakpointDeleted,
    RecordStarted,
    RecordStopped,
    CmdParamChanged,
    MemoryChanged,
}

/// Represents a GDB/MI stream record
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    pub stream_type: StreamType,
    pub content: String,
}

/// Types of GDB/MI streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Console, // ~ prefix
    Target,  // @ prefix
    Log,     // & prefix
}

/// Represents values in GDB/MI output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    List(Vec<Value>),
    Tuple(HashMap<String, Value>),
}

impl Value {
    /// Get the value as a string, if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a list, if possible
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Get the value as a tuple, if possible
    pub fn as_tuple(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }
}

/// Events that can be received from GDB
#[derive(Debug, Clone)]
pub enum GdbEvent {
    Result(GdbResult),
    Async(AsyncRecord),
    Stream(StreamRecord),
}

/// Stop reason for stopped events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BreakpointHit,
    WatchpointTrigger,
    ReadWatchpointTrigger,
    AccessWatchpointTrigger,
    FunctionFinished,
    LocationReached,
    WatchpointScope,
    EndSteppingRange,
    ExitedSignalled,
    Exited,
    ExitedNormally,
    SignalReceived,
    SolibEvent,
    Fork,
    Vfork,
    SyscallEntry,
    SyscallReturn,
    Exec,
    NoHistory,
}

impl StopReason {
    /// Parse a stop reason from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "breakpoint-hit" => Some(StopReason::BreakpointHit),
            "watchpoint-trigger" => Some(StopReason::WatchpointTrigger),
            "read-watchpoint-trigger" => Some(StopReason::ReadWatchpointTrigger),
            "access-watchpoint-trigger" => Some(StopReason::AccessWatchpointTrigger),
            "function-finished" => Some(StopReason::FunctionFinished),
            "location-reached" => Some(StopReason::LocationReached),
            "watchpoint-scope" => Some(StopReason::WatchpointScope),
            "end-stepping-range" => Some(StopReason::EndSteppingRange),
            "exited-signalled" => Some(StopReason::ExitedSignalled),
            "exited" => Some(StopReason::Exited),
            "exited-normally" => Some(StopReason::ExitedNormally),
            "signal-received" => Some(StopReason::SignalReceived),
            "solib-event" => Some(StopReason::SolibEvent),
            "fork" => Some(StopReason::Fork),
            "vfork" => Some(StopReason::Vfork),
            "syscall-entry" => Some(StopReason::SyscallEntry),
            "syscall-return" => Some(StopReason::SyscallReturn),
            "exec" => Some(StopReason::Exec),
            "no-history" => Some(StopReason::NoHistory),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::BreakpointHit => "breakpoint-hit",
            StopReason::WatchpointTrigger => "watchpoint-trigger",
            StopReason::ReadWatchpointTrigger => "read-watchpoint-trigger",
            StopReason::AccessWatchpointTrigger => "access-watchpoint-trigger",
            StopReason::FunctionFinished => "function-finished",
            StopReason::LocationReached => "location-reached",
            StopReason::WatchpointScope => "watchpoint-scope",
            StopReason::EndSteppingRange => "end-stepping-range",
            StopReason::ExitedSignalled => "exited-signalled",
            StopReason::Exited => "exited",
            StopReason::ExitedNormally => "exited-normally",
            StopReason::SignalReceived => "signal-received",
            StopReason::SolibEvent => "solib-event",
            StopReason::Fork => "fork",
            StopReason::Vfork => "vfork",
            StopReason::SyscallEntry => "syscall-entry",
            StopReason::SyscallReturn => "syscall-return",
            StopReason::Exec => "exec",
            StopReason::NoHistory => "no-history",
        };
        write!(f, "{}", s)
    }
}

/// Flag bits attached to each classified record in the `RecordStore`.
///
/// Exactly one of the "stream class" bits (`INPUT`..`MON_OUT`) is set on any
/// given record; `NO_EOL`, `STARTUP`, and `HANDLED` are independent modifier
/// bits that can combine with any class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordFlags(u32);

impl RecordFlags {
    pub const NONE: Self = Self(0);
    pub const INPUT: Self = Self(1 << 0);
    pub const ERROR: Self = Self(1 << 1);
    pub const RESULT: Self = Self(1 << 2);
    pub const EXEC: Self = Self(1 << 3);
    pub const STATUS: Self = Self(1 << 4);
    pub const NOTICE: Self = Self(1 << 5);
    pub const LOG: Self = Self(1 << 6);
    pub const TARGET: Self = Self(1 << 7);
    pub const MI_INPUT: Self = Self(1 << 8);
    pub const SCRIPT: Self = Self(1 << 9);
    pub const MON_OUT: Self = Self(1 << 10);

    // Orthogonal modifier bits.
    pub const NO_EOL: Self = Self(1 << 20);
    pub const STARTUP: Self = Self(1 << 21);
    pub const HANDLED: Self = Self(1 << 22);

    /// Mask covering every "stream class" bit (mutually exclusive in a
    /// well-formed record).
    const CLASS_MASK: u32 = Self::INPUT.0
        | Self::ERROR.0
        | Self::RESULT.0
        | Self::EXEC.0
        | Self::STATUS.0
        | Self::NOTICE.0
        | Self::LOG.0
        | Self::TARGET.0
        | Self::MI_INPUT.0
        | Self::SCRIPT.0
        | Self::MON_OUT.0;

    pub fn contains(self, mask: Self) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// True if any bit in `mask` is set.
    pub fn intersects(self, mask: Self) -> bool {
        self.0 & mask.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// The single stream-class bit set on this flag set, if any.
    pub fn class(self) -> Self {
        Self(self.0 & Self::CLASS_MASK)
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for RecordFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for RecordFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for RecordFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// One classified line of GDB output, as stored in the `RecordStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub text: String,
    pub flags: RecordFlags,
}

impl ClassifiedRecord {
    pub fn new(text: impl Into<String>, flags: RecordFlags) -> Self {
        Self {
            text: text.into(),
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_flags_class_is_exclusive_bit() {
        let f = RecordFlags::RESULT | RecordFlags::HANDLED;
        assert!(f.contains(RecordFlags::RESULT));
        assert!(f.contains(RecordFlags::HANDLED));
        assert_eq!(f.class(), RecordFlags::RESULT);
    }

    #[test]
    fn record_flags_intersects() {
        let f = RecordFlags::LOG;
        assert!(f.intersects(RecordFlags::LOG | RecordFlags::SCRIPT));
        assert!(!f.intersects(RecordFlags::EXEC));
    }
}
