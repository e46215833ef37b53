/// Session: wires process, communication, command interceptor, record
/// store and state machine together into the single-threaded cooperative
/// frame loop described for the GUI: one call to `frame()` drains pending
/// raw output into the Lexer/RecordStore, `drive_state_machine()` issues and
/// awaits the boot/attach chain one command at a time, and `refresh_step()`
/// works through the post-stop refresh queue in priority order.
use std::time::Instant;

use tokio::sync::mpsc;
use thiserror::Error;

use crate::commands::{CommandError, GdbCommands};
use crate::communication::{CommunicationError, GdbCommunication};
use crate::completion::CompletionEngine;
use crate::history::CommandHistory;
use crate::hover::HoverResolver;
use crate::interceptor::{CommandTable, InterceptResult};
use crate::lexer::{Lexer, LexerEvent};
use crate::models::{Local, RefreshKind, RefreshScheduler, RegisterValue, Watch};
use crate::process::{GdbProcess, ProcessError};
use crate::record_store::RecordStore;
use crate::register_alias::{RegisterAliasLayer, SvdSource};
use crate::source::{SourceFile, SourceModel};
use crate::state_machine::{State, StateMachine};
use crate::types::{AsyncClass, ClassifiedRecord, GdbEvent, GdbResult, RecordFlags, Value};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("process error: {0}")]
    Process(#[from] ProcessError),
    #[error("command error: {0}")]
    Command(#[from] CommandError),
    #[error("communication error: {0}")]
    Communication(#[from] CommunicationError),
    #[error("session already started")]
    AlreadyStarted,
    #[error("session not started")]
    NotStarted,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Everything the GUI (or any frontend) needs to observe after one frame.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub new_records: usize,
    pub hit_prompt: bool,
    pub state_advanced: bool,
}

/// What a console command did once submitted.
#[derive(Debug)]
pub enum ConsoleOutcome {
    /// Handled purely locally (help text, a swallowed `serial`/`semihosting`
    /// command, an invalid `trace` rejected before it reached GDB).
    Handled,
    /// Forwarded to GDB and its reply received.
    Sent(GdbResult),
    Error(SessionError),
}

/// MI command verbs that are native to the protocol and must be sent
/// unwrapped; anything else is CLI syntax and needs `interpreter-exec
/// console "..."` to reach GDB's command interpreter.
const MI_NATIVE_PREFIXES: &[&str] = &[
    "target-", "break-", "exec-", "data-", "var-", "stack-", "file-exec-and-symbols", "file-list-exec-source-files", "gdb-set",
];

fn as_mi_or_console(command: &str) -> String {
    if MI_NATIVE_PREFIXES.iter().any(|p| command.starts_with(p)) {
        command.to_string()
    } else {
        format!("interpreter-exec console \"{}\"", command.replace('"', "\\\""))
    }
}

pub struct Session {
    process: Option<GdbProcess>,
    commands: Option<GdbCommands>,
    lexer: Lexer,
    store: RecordStore,
    state_machine: StateMachine,
    refresh: RefreshScheduler,
    interceptor: CommandTable,
    history: CommandHistory,
    completion: CompletionEngine,
    hover: HoverResolver,
    sources: SourceModel,
    svd: Option<Box<dyn SvdSource + Send + Sync>>,
    elf_path: Option<String>,
    tpwr_active: bool,
    locals: Vec<Local>,
    watches: Vec<Watch>,
    registers: Vec<RegisterValue>,
    breakpoints: Vec<crate::models::Breakpoint>,
    disassembly: Vec<crate::models::AssemblyLine>,
    memory: Option<crate::models::MemoryDump>,
    memory_watch: Option<(String, u32)>,
    raw_line_receiver: Option<mpsc::UnboundedReceiver<String>>,
    event_receiver: Option<mpsc::UnboundedReceiver<GdbEvent>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            process: None,
            commands: None,
            lexer: Lexer::new(),
            store: RecordStore::new(),
            state_machine: StateMachine::new(false, 1),
            refresh: RefreshScheduler::new(),
            interceptor: CommandTable::new(),
            history: CommandHistory::new(),
            completion: CompletionEngine::new(),
            hover: HoverResolver::new(),
            sources: SourceModel::new(),
            svd: None,
            elf_path: None,
            tpwr_active: false,
            locals: Vec::new(),
            watches: Vec::new(),
            registers: Vec::new(),
            breakpoints: Vec::new(),
            disassembly: Vec::new(),
            memory: None,
            memory_watch: None,
            raw_line_receiver: None,
            event_receiver: None,
        }
    }

    /// Spawn GDB and wire the dual pipeline: token-correlated commands via
    /// `GdbCommunication`, passive records via the raw-line channel into
    /// this session's `Lexer`. The executable is loaded explicitly by the
    /// state machine's `LoadFile` step rather than as a `gdb` CLI argument,
    /// so the MI boot sequence matches the documented command order.
    pub async fn start(&mut self, gdb_path: &str, elf_path: Option<&str>, download_requested: bool, target_index: u32) -> Result<()> {
        if self.process.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let mut process = GdbProcess::start(gdb_path, None).await?;
        let stdin = process.take_stdin().ok_or(ProcessError::Terminated)?;
        let stdout = process.take_stdout().ok_or(ProcessError::Terminated)?;
        let stderr = process.take_stderr().ok_or(ProcessError::Terminated)?;

        let (event_sender, event_receiver) = mpsc::unbounded_channel::<GdbEvent>();
        let (raw_sender, raw_receiver) = mpsc::unbounded_channel::<String>();

        let mut comm = GdbCommunication::new(event_sender);
        comm.set_raw_line_sender(raw_sender);
        comm.setup(stdin, stdout, stderr).await;

        self.commands = Some(GdbCommands::new(comm));
        self.process = Some(process);
        self.raw_line_receiver = Some(raw_receiver);
        self.event_receiver = Some(event_receiver);
        self.elf_path = elf_path.map(str::to_string);
        self.state_machine = StateMachine::new(download_requested, target_index);

        Ok(())
    }

    /// One cooperative frame: drain every raw line currently buffered into
    /// the Lexer/RecordStore (single-writer, this call is the only writer),
    /// then fold in any async Stopped/Running notifications.
    pub fn frame(&mut self) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        if let Some(receiver) = &mut self.raw_line_receiver {
            while let Ok(line) = receiver.try_recv() {
                for event in self.lexer.feed(line.as_bytes()) {
                    match event {
                        LexerEvent::Record(record) => {
                            self.store.push(record);
                            outcome.new_records += 1;
                        }
                        LexerEvent::Prompt => outcome.hit_prompt = true,
                    }
                }
            }
        }

        outcome.state_advanced = self.poll_events() > 0;
        outcome
    }

    /// Drain every buffered async `GdbEvent`, folding Stopped/Running
    /// notifications into the state machine and scheduling a full refresh
    /// on a stop. Returns the number of events applied.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        let mut events = Vec::new();
        if let Some(receiver) = &mut self.event_receiver {
            while let Ok(event) = receiver.try_recv() {
                events.push(event);
            }
        }
        for event in events {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    fn apply_event(&mut self, event: GdbEvent) {
        if let GdbEvent::Async(async_record) = event {
            match async_record.class {
                AsyncClass::Stopped => {
                    self.state_machine.enter_stopped();
                    self.refresh.schedule_all();
                }
                AsyncClass::Running => {
                    self.state_machine.enter_running();
                }
                _ => {}
            }
        }
    }

    /// Drive the boot/attach chain one step: issue the current state's
    /// command (if it has one) through the token-correlated path, await its
    /// specific reply, then advance. Returns `true` if a transition
    /// happened. A no-op while the in-flight command's reply hasn't landed
    /// yet, or once the chain has reached `Running`/`Stopped`.
    pub async fn drive_state_machine(&mut self) -> Result<bool> {
        if self.state_machine.is_marked() {
            return Ok(false);
        }
        if self.state_machine.is_running_loop() || self.state_machine.is_stopped_loop() {
            return Ok(false);
        }

        let prior_state = self.state_machine.state();
        let command = if prior_state == State::LoadFile {
            self.elf_path.clone().map(|p| format!("file-exec-and-symbols \"{}\"", p))
        } else {
            self.state_machine.command_to_issue()
        };

        let Some(command) = command else {
            // Purely local state (no round trip needed), or LoadFile with no
            // ELF path configured yet.
            self.state_machine.advance();
            return Ok(true);
        };

        self.state_machine.mark_issued();
        let reply = self.commands_mut()?.communication_mut().send_command(&command).await?;
        self.store.mark_last_result_handled(false);

        if prior_state == State::GetSources {
            for entry in crate::models::extract_sources(&reply.results) {
                self.sources.insert(SourceFile::new(entry.fullname.unwrap_or(entry.file)));
            }
        }

        self.state_machine.advance();
        if prior_state == State::TpwrEnable {
            self.tpwr_active = true;
        }
        if self.state_machine.is_running_loop() {
            self.refresh.schedule_all();
        }
        Ok(true)
    }

    /// Work through one entry of the post-stop refresh queue, in the
    /// scheduler's fixed priority order (SWO, breakpoints, locals, watches,
    /// registers, memory).
    pub async fn refresh_step(&mut self) -> Result<Option<RefreshKind>> {
        let Some(kind) = self.refresh.next() else {
            return Ok(None);
        };

        match kind {
            RefreshKind::Swo => {
                // SWO trace capture is driven by an external collaborator
                // (the serial monitor); nothing to fetch here.
            }
            RefreshKind::Breakpoints => {
                let reply = self.commands_mut()?.communication_mut().send_command("break-list").await?;
                self.breakpoints = crate::models::extract_breakpoints(&reply.results);
                self.completion
                    .set_breakpoint_numbers(self.breakpoints.iter().map(|b| b.number.clone()).collect());
            }
            RefreshKind::Locals => {
                let reply = self
                    .commands_mut()?
                    .communication_mut()
                    .send_command("stack-list-variables --skip-unavailable --all-values")
                    .await?;
                crate::models::refresh_locals(&mut self.locals, &reply.results);
            }
            RefreshKind::Watches => {
                let changes = self.commands_mut()?.var_update_all().await?;
                for change in &changes {
                    if let Some(name) = change.get("name").and_then(Value::as_string) {
                        if let Some(watch) = self.watches.iter_mut().find(|w| w.gdb_name == name) {
                            watch.apply_change(change);
                        }
                    }
                }
            }
            RefreshKind::Registers => {
                let results = self.commands_mut()?.data_list_register_values("x").await?;
                self.registers = crate::models::extract_registers(&results);
            }
            RefreshKind::Memory => {
                if let Some((address, size)) = self.memory_watch.clone() {
                    let results = self.commands_mut()?.data_read_memory(&address, size).await?;
                    self.memory = crate::models::extract_memory(&results);
                }
            }
        }

        Ok(Some(kind))
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.state_machine
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn refresh_scheduler_mut(&mut self) -> &mut RefreshScheduler {
        &mut self.refresh
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    pub fn completion(&self) -> &CompletionEngine {
        &self.completion
    }

    pub fn completion_mut(&mut self) -> &mut CompletionEngine {
        &mut self.completion
    }

    pub fn hover(&self) -> &HoverResolver {
        &self.hover
    }

    pub fn hover_mut(&mut self) -> &mut HoverResolver {
        &mut self.hover
    }

    pub fn sources(&self) -> &SourceModel {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut SourceModel {
        &mut self.sources
    }

    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    pub fn watches(&self) -> &[Watch] {
        &self.watches
    }

    pub fn registers(&self) -> &[RegisterValue] {
        &self.registers
    }

    pub fn breakpoints(&self) -> &[crate::models::Breakpoint] {
        &self.breakpoints
    }

    pub fn disassembly(&self) -> &[crate::models::AssemblyLine] {
        &self.disassembly
    }

    pub fn memory(&self) -> Option<&crate::models::MemoryDump> {
        self.memory.as_ref()
    }

    pub fn elf_path(&self) -> Option<&str> {
        self.elf_path.as_deref()
    }

    pub fn commands_mut(&mut self) -> Result<&mut GdbCommands> {
        self.commands.as_mut().ok_or(SessionError::NotStarted)
    }

    /// Install the SVD-backed register-alias rewriter used by
    /// `submit_console_command`. The host application is responsible for
    /// parsing the SVD file and implementing `SvdSource`.
    pub fn set_svd_source(&mut self, svd: Box<dyn SvdSource + Send + Sync>) {
        self.svd = Some(svd);
    }

    /// Arm a repeating memory-watch refresh; `refresh_step` fills it in
    /// whenever `RefreshKind::Memory` comes due.
    pub fn set_memory_watch(&mut self, address: impl Into<String>, size: u32) {
        self.memory_watch = Some((address.into(), size));
        self.refresh.schedule(RefreshKind::Memory);
    }

    /// Create a new watch expression as a GDB variable object and track it.
    pub async fn create_watch(&mut self, expression: &str) -> Result<()> {
        let gdb_name = self.commands_mut()?.var_create(expression).await?;
        self.watches.push(Watch::new(expression, gdb_name));
        Ok(())
    }

    pub fn delete_watch(&mut self, expression: &str) {
        self.watches.retain(|w| w.expression != expression);
    }

    /// Resolve the symbol under the mouse cursor, if it differs from
    /// whatever `HoverResolver` already has cached.
    pub async fn hover_eval(&mut self, symbol: &str) -> Result<()> {
        if !self.hover.needs_query(symbol) {
            return Ok(());
        }
        let value = self.commands_mut()?.data_evaluate_expression(symbol).await?;
        self.hover.set_value(symbol, &value);
        Ok(())
    }

    /// Run a user-typed console command through the register-alias
    /// rewriter and the command interceptor before deciding whether (and
    /// what) to forward to GDB.
    pub async fn submit_console_command(&mut self, command: &str) -> ConsoleOutcome {
        self.history.push(command);
        self.history.reset_cursor();
        self.record_input(command);

        let rewritten = match &self.svd {
            Some(svd) => RegisterAliasLayer::new(svd.as_ref()).rewrite(command),
            None => command.to_string(),
        };

        let forward = match self.interceptor.dispatch(&rewritten) {
            InterceptResult::Handled => return ConsoleOutcome::Handled,
            InterceptResult::HandledAndForward(forward) => forward,
            InterceptResult::NotHandled => rewritten,
        };

        let commands = match self.commands_mut() {
            Ok(commands) => commands,
            Err(e) => return ConsoleOutcome::Error(e),
        };
        match commands.communication_mut().send_command(&as_mi_or_console(&forward)).await {
            Ok(result) => {
                self.store.mark_last_result_handled(false);
                ConsoleOutcome::Sent(result)
            }
            Err(e) => ConsoleOutcome::Error(SessionError::Communication(e)),
        }
    }

    /// Record a user command directly into the store as an `Input` record,
    /// bypassing the lexer, since it never arrives from GDB's stdout.
    pub fn record_input(&mut self, command: &str) {
        self.store.push(ClassifiedRecord::new(command, RecordFlags::INPUT));
    }

    /// Register a Ctrl+C press; escalates to a hard reset on a second press
    /// within the escalation window.
    pub fn interrupt(&mut self, now: Instant) -> bool {
        self.state_machine.register_ctrl_c(now)
    }

    /// Send an interrupt signal to the running GDB process, escalating to
    /// `hard_reset()` if this is the second press within the window.
    pub async fn send_interrupt(&mut self, now: Instant) -> Result<()> {
        let process = self.process.as_mut().ok_or(SessionError::NotStarted)?;
        process
            .interrupt()
            .map_err(|e| SessionError::Command(CommandError::GdbError(e.to_string())))?;
        if self.interrupt(now) {
            self.hard_reset().await?;
        }
        Ok(())
    }

    /// TPWR-aware hard reset: with target power enabled, disable it, wait
    /// for the rail to discharge, and re-enter `Init` to re-run the full
    /// attach chain; otherwise a plain `monitor reset` suffices.
    pub async fn hard_reset(&mut self) -> Result<()> {
        let commands = self.commands.as_mut().ok_or(SessionError::NotStarted)?;
        if self.tpwr_active {
            let _ = commands.monitor("tpwr disable").await;
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            self.tpwr_active = false;
            self.state_machine.reset_to_init();
        } else {
            let _ = commands.monitor("reset").await;
        }
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.process.is_some()
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut process) = self.process.take() {
            let _ = process.kill().await;
        }
        self.commands = None;
        self.raw_line_receiver = None;
        self.event_receiver = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_in_init_state() {
        let session = Session::new();
        assert_eq!(session.state_machine().state(), State::Init);
    }

    #[tokio::test]
    async fn submit_console_command_records_history() {
        let mut session = Session::new();
        session.submit_console_command("next").await;
        assert_eq!(session.history_mut().len(), 1);
    }

    #[test]
    fn record_input_is_visible_in_store() {
        let mut session = Session::new();
        session.record_input("next");
        assert_eq!(session.store().len(), 1);
    }

    #[tokio::test]
    async fn console_command_on_unstarted_session_errors_without_panicking() {
        let mut session = Session::new();
        match session.submit_console_command("print x").await {
            ConsoleOutcome::Error(SessionError::NotStarted) => {}
            other => panic!("expected NotStarted error, got {:?}", other),
        }
    }

    #[test]
    fn as_mi_or_console_wraps_cli_syntax_but_not_mi_verbs() {
        assert_eq!(as_mi_or_console("target-download"), "target-download");
        assert_eq!(as_mi_or_console("monitor reset"), "interpreter-exec console \"monitor reset\"");
    }
}
