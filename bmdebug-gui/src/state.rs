/// Application state management
///
/// This module manages the overall state of the debugging session
/// and coordinates between different UI components.

use crate::commands::TargetState;

/// Main application state that holds all debugging and UI state
#[derive(Debug)]
pub struct AppState {
    /// Debug session state
    pub is_debugging: bool,
    pub target_state: TargetState,
    /// Target index on a multi-device scan (`-t`/`--target`).
    pub target_index: u32,

    /// UI state
    pub console_output: String,
    pub error_message: String,

    /// Debug information
    pub registers: Vec<gdbadapter::Register>,
    pub assembly_lines: Vec<gdbadapter::AssemblyLine>,
    pub stack_frames: Vec<gdbadapter::StackFrame>,
    /// Locally-entered breakpoint locations, pending confirmation from GDB.
    pub breakpoints: Vec<String>,
    /// GDB-confirmed breakpoints, as reported by `-break-list`.
    pub model_breakpoints: Vec<gdbadapter::ModelBreakpoint>,
    pub locals: Vec<gdbadapter::Local>,
    pub watches: Vec<gdbadapter::Watch>,

    /// UI panels visibility
    pub show_registers: bool,
    pub show_assembly: bool,
    pub show_stack: bool,
    pub show_memory: bool,
    pub show_console: bool,
    pub show_locals: bool,
    pub show_watches: bool,

    /// Memory viewer state
    pub memory_address: String,
    pub memory_size: u32,
    pub memory_data: Vec<u8>,

    /// Console input, with history navigation and completion suggestions.
    pub console_input: String,
    pub completion_suggestions: Vec<String>,

    /// Hover/evaluate-expression widget.
    pub hover_symbol_input: String,
    pub hover_value: Option<gdbadapter::HoverValue>,

    pub watch_input: String,

    /// Input fields
    pub breakpoint_input: String,
    pub gdb_path_input: String,
    pub elf_path_input: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            is_debugging: false,
            target_state: TargetState::Detached,
            target_index: 1,
            console_output: "Welcome to Bmdebug GDB Frontend\n".to_string(),
            error_message: String::new(),
            registers: Vec::new(),
            assembly_lines: Vec::new(),
            stack_frames: Vec::new(),
            breakpoints: Vec::new(),
            model_breakpoints: Vec::new(),
            locals: Vec::new(),
            watches: Vec::new(),
            show_registers: true,
            show_assembly: true,
            show_stack: true,
            show_memory: false,
            show_console: true,
            show_locals: true,
            show_watches: true,
            memory_address: "0x0".to_string(),
            memory_size: 256,
            memory_data: Vec::new(),
            console_input: String::new(),
            completion_suggestions: Vec::new(),
            hover_symbol_input: String::new(),
            hover_value: None,
            watch_input: String::new(),
            breakpoint_input: String::new(),
            gdb_path_input: "arm-none-eabi-gdb".to_string(),
            elf_path_input: String::new(),
        }
    }
}

impl AppState {
    /// Create a new application state
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset debug session state
    pub fn reset_debug_state(&mut self) {
        self.is_debugging = false;
        self.target_state = TargetState::Detached;
        self.registers.clear();
        self.assembly_lines.clear();
        self.stack_frames.clear();
        self.breakpoints.clear();
        self.model_breakpoints.clear();
        self.locals.clear();
        self.watches.clear();
        self.memory_data.clear();
        self.error_message.clear();
    }

    /// Add a console message
    pub fn add_console_message(&mut self, message: String) {
        self.console_output.push_str(&message);
        self.console_output.push('\n');

        // Keep only last 1000 lines to prevent memory bloat
        let lines: Vec<&str> = self.console_output.lines().collect();
        if lines.len() > 1000 {
            self.console_output = lines[lines.len() - 1000..].join("\n");
        }
    }

    /// Set error message
    pub fn set_error(&mut self, error: String) {
        self.error_message = error;
        log::error!("GUI Error: {}", self.error_message);
    }

    /// Clear error message
    pub fn clear_error(&mut self) {
        self.error_message.clear();
    }

    /// Check if any error is present
    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}
