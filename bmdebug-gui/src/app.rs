/// Main application logic and coordination
///
/// This module contains the main BmdebugApp struct and coordinates
/// between the debug session, UI components, and application state.

use eframe::egui;
use gdbadapter::Session;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use log::{info, error, debug};

use crate::commands::{GdbCommand, DebugEvent, TargetState};
use crate::state::AppState;
use crate::ui;

/// Placeholder `SvdSource` wired in until a real SVD-file reader exists:
/// resolves no peripherals, so `PERIPH->REG` console references pass through
/// unrewritten rather than the register-alias layer being unreachable.
struct StubSvdSource;

impl gdbadapter::SvdSource for StubSvdSource {
    fn peripheral_base(&self, _peripheral: &str) -> Option<u64> {
        None
    }

    fn register_offset(&self, _peripheral: &str, _register: &str) -> Option<u64> {
        None
    }

    fn register_width_bits(&self, _peripheral: &str, _register: &str) -> Option<u32> {
        None
    }
}

/// Main application struct that coordinates all components
pub struct BmdebugApp {
    /// Debug session, shared with the background command-processing and
    /// driver tasks
    session: Arc<Mutex<Session>>,

    /// Event communication
    event_receiver: std::sync::mpsc::Receiver<DebugEvent>,
    event_sender: std::sync::mpsc::Sender<DebugEvent>,

    /// Command channel for async GDB operations
    command_sender: std::sync::mpsc::Sender<GdbCommand>,

    /// Application state
    state: AppState,
}

impl BmdebugApp {
    /// Create a new BmdebugApp instance, pre-filling the start panel from
    /// CLI-supplied defaults.
    pub fn new(gdb_path: String, elf_path: Option<String>) -> Self {
        let session = Arc::new(Mutex::new(Session::new()));

        // Create event communication channels
        let (event_sender, event_receiver) = std::sync::mpsc::channel();
        let (command_sender, command_receiver) = std::sync::mpsc::channel();

        // Background task that services commands sent through `command_sender`.
        let session_clone = session.clone();
        let event_sender_clone = event_sender.clone();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                Self::command_processor(session_clone, command_receiver, event_sender_clone).await;
            });
        });

        // Background task that continuously drives the boot/attach state
        // machine and the post-stop refresh queue, independent of any
        // explicit command — this is what actually exercises the state
        // machine and refresh scheduler once a session is started.
        let session_clone = session.clone();
        let event_sender_clone = event_sender.clone();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                Self::driver_loop(session_clone, event_sender_clone).await;
            });
        });

        let mut state = AppState::new();
        state.gdb_path_input = gdb_path;
        if let Some(elf_path) = elf_path {
            state.elf_path_input = elf_path;
        }

        Self {
            session,
            event_receiver,
            event_sender,
            command_sender,
            state,
        }
    }

    /// Pin the target index used for the next `StartSession` (the `-t`/
    /// `--target` CLI option).
    pub fn with_target_index(mut self, target_index: u32) -> Self {
        self.state.target_index = target_index;
        self
    }

    /// Continuously ticks `frame()`/`drive_state_machine()`/`refresh_step()`
    /// on the shared session, translating boot-chain transitions and
    /// refresh-queue results into `DebugEvent`s for the GUI thread.
    async fn driver_loop(session: Arc<Mutex<Session>>, event_sender: std::sync::mpsc::Sender<DebugEvent>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_millis(50));
        loop {
            interval.tick().await;
            let mut guard = session.lock().await;
            if !guard.is_started() {
                continue;
            }

            guard.frame();

            match guard.drive_state_machine().await {
                Ok(true) => {
                    let state = guard.state_machine().state();
                    debug!("state machine advanced to {:?}", state);
                    let _ = event_sender.send(DebugEvent::TargetStateChanged(match state {
                        gdbadapter::state_machine::State::Running => TargetState::Running,
                        gdbadapter::state_machine::State::Stopped => TargetState::Stopped,
                        _ => TargetState::Detached,
                    }));
                }
                Ok(false) => {}
                Err(e) => error!("state machine step failed: {}", e),
            }

            match guard.refresh_step().await {
                Ok(Some(gdbadapter::RefreshKind::Breakpoints)) => {
                    let _ = event_sender.send(DebugEvent::BreakpointsUpdated(guard.breakpoints().to_vec()));
                }
                Ok(Some(gdbadapter::RefreshKind::Locals)) => {
                    let _ = event_sender.send(DebugEvent::LocalsUpdated(guard.locals().to_vec()));
                }
                Ok(Some(gdbadapter::RefreshKind::Watches)) => {
                    let _ = event_sender.send(DebugEvent::WatchesUpdated(guard.watches().to_vec()));
                }
                Ok(Some(gdbadapter::RefreshKind::Registers)) => {
                    let _ = event_sender.send(DebugEvent::RegistersUpdated(guard.registers().to_vec()));
                }
                Ok(Some(gdbadapter::RefreshKind::Memory)) => {
                    if let Some(dump) = guard.memory() {
                        let _ = event_sender.send(DebugEvent::MemoryUpdated(dump.clone()));
                    }
                }
                Ok(Some(gdbadapter::RefreshKind::Swo)) | Ok(None) => {}
                Err(e) => error!("refresh step failed: {}", e),
            }
        }
    }

    /// Background task that processes commands against the shared session
    async fn command_processor(
        session: Arc<Mutex<Session>>,
        command_receiver: std::sync::mpsc::Receiver<GdbCommand>,
        event_sender: std::sync::mpsc::Sender<DebugEvent>,
    ) {
        while let Ok(command) = command_receiver.recv() {
            match command {
                GdbCommand::StartSession { ref gdb_path, ref elf_path, target_index } => {
                    let mut guard = session.lock().await;
                    match guard.start(gdb_path, Some(elf_path.as_str()), false, target_index).await {
                        Ok(_) => {
                            guard.set_svd_source(Box::new(StubSvdSource));

                            let elf_cfg_path = gdbadapter::ElfConfig::path_for_elf(std::path::Path::new(elf_path));
                            match gdbadapter::ElfConfig::load(&elf_cfg_path) {
                                Ok(cfg) => {
                                    let _ = event_sender.send(DebugEvent::ConsoleMessage(format!(
                                        "loaded per-ELF config {} (target_id={:?})",
                                        elf_cfg_path.display(),
                                        cfg.target_id
                                    )));
                                }
                                Err(e) => error!("failed to load elf config: {}", e),
                            }

                            info!("GDB session started successfully");
                            let _ = event_sender.send(DebugEvent::SessionStarted);
                            let _ = event_sender.send(DebugEvent::ConsoleMessage(
                                "GDB session started successfully".to_string(),
                            ));
                        }
                        Err(e) => {
                            error!("Failed to start GDB session: {}", e);
                            let _ = event_sender.send(DebugEvent::SessionStartFailed(e.to_string()));
                            let _ = event_sender
                                .send(DebugEvent::ConsoleMessage(format!("Failed to start GDB: {}", e)));
                        }
                    }
                }
                GdbCommand::StopSession => {
                    let mut guard = session.lock().await;
                    if let Some(elf_path) = guard.elf_path().map(str::to_string) {
                        let elf_cfg_path = gdbadapter::ElfConfig::path_for_elf(std::path::Path::new(&elf_path));
                        match gdbadapter::ElfConfig::load(&elf_cfg_path) {
                            Ok(cfg) => {
                                if let Err(e) = cfg.save(&elf_cfg_path) {
                                    error!("failed to save elf config: {}", e);
                                }
                            }
                            Err(e) => error!("failed to load elf config on stop: {}", e),
                        }
                    }
                    match guard.stop().await {
                        Ok(_) => {
                            info!("GDB session stopped successfully");
                            let _ = event_sender.send(DebugEvent::SessionStopped);
                            let _ =
                                event_sender.send(DebugEvent::ConsoleMessage("GDB session stopped".to_string()));
                        }
                        Err(e) => {
                            error!("Failed to stop GDB session: {}", e);
                            let _ = event_sender.send(DebugEvent::CommandFailed(command, e.to_string()));
                        }
                    }
                }
                GdbCommand::Continue => {
                    let mut guard = session.lock().await;
                    let result = match guard.commands_mut() {
                        Ok(cmds) => cmds.exec_continue().await.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    match result {
                        Ok(_) => {
                            let _ = event_sender.send(DebugEvent::TargetStateChanged(TargetState::Running));
                            let _ = event_sender.send(DebugEvent::CommandCompleted(command));
                        }
                        Err(e) => {
                            let _ = event_sender.send(DebugEvent::CommandFailed(command, e));
                        }
                    }
                }
                GdbCommand::StepOver => {
                    let mut guard = session.lock().await;
                    let result = match guard.commands_mut() {
                        Ok(cmds) => cmds.exec_next().await.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    Self::report_step(result, command, &event_sender);
                }
                GdbCommand::StepInto => {
                    let mut guard = session.lock().await;
                    let result = match guard.commands_mut() {
                        Ok(cmds) => cmds.exec_step().await.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    Self::report_step(result, command, &event_sender);
                }
                GdbCommand::StepOut => {
                    // GDB/MI has no dedicated "step out"; `exec-finish` runs
                    // until the current frame returns.
                    let mut guard = session.lock().await;
                    let result = match guard.commands_mut() {
                        Ok(cmds) => cmds
                            .communication_mut()
                            .send_command("exec-finish")
                            .await
                            .map(|_| ())
                            .map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    Self::report_step(result, command, &event_sender);
                }
                GdbCommand::Interrupt => {
                    let mut guard = session.lock().await;
                    let result = guard.send_interrupt(Instant::now()).await.map_err(|e| e.to_string());
                    match result {
                        Ok(_) => {
                            let _ = event_sender.send(DebugEvent::TargetStateChanged(TargetState::Stopped));
                            let _ = event_sender.send(DebugEvent::CommandCompleted(command));
                        }
                        Err(e) => {
                            let _ = event_sender.send(DebugEvent::CommandFailed(command, e));
                        }
                    }
                }
                GdbCommand::SetBreakpoint(ref location) => {
                    let mut guard = session.lock().await;
                    let result = match guard.commands_mut() {
                        Ok(cmds) => cmds.break_insert(location).await.map(|_| ()).map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    match result {
                        Ok(_) => {
                            guard.refresh_scheduler_mut().schedule(gdbadapter::RefreshKind::Breakpoints);
                            let _ = event_sender.send(DebugEvent::CommandCompleted(command));
                        }
                        Err(e) => {
                            let _ = event_sender.send(DebugEvent::CommandFailed(command, e));
                        }
                    }
                }
                GdbCommand::ReadMemory(ref address, size) => {
                    let mut guard = session.lock().await;
                    // Arm the repeating watch so subsequent stops refresh it
                    // through the scheduler, and fetch the first reading now.
                    guard.set_memory_watch(address.clone(), size);
                    let result = match guard.commands_mut() {
                        Ok(cmds) => cmds.data_read_memory(address, size).await.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    match result {
                        Ok(results) => {
                            if let Some(dump) = gdbadapter::extract_memory(&results) {
                                let _ = event_sender.send(DebugEvent::MemoryUpdated(dump));
                            }
                            let _ = event_sender.send(DebugEvent::CommandCompleted(command));
                        }
                        Err(e) => {
                            let _ = event_sender.send(DebugEvent::CommandFailed(command, e));
                        }
                    }
                }
                GdbCommand::RefreshDebugInfo => {
                    let mut guard = session.lock().await;
                    guard.refresh_scheduler_mut().schedule_all();
                    match guard.commands_mut() {
                        Ok(cmds) => {
                            match cmds.stack_list_frames(None, None).await {
                                Ok(stack_frames) => {
                                    let _ = event_sender.send(DebugEvent::StackFramesUpdated(stack_frames));
                                }
                                Err(e) => error!("Failed to get stack frames: {}", e),
                            }

                            match cmds.data_disassemble("$pc", 20).await {
                                Ok(results) => {
                                    let assembly_lines = gdbadapter::extract_disassembly(&results, None);
                                    let _ = event_sender.send(DebugEvent::AssemblyUpdated(assembly_lines));
                                }
                                Err(e) => error!("Failed to get assembly: {}", e),
                            }
                        }
                        Err(e) => error!("Cannot refresh, session not started: {}", e),
                    }

                    let _ = event_sender.send(DebugEvent::CommandCompleted(command));
                    let _ = event_sender.send(DebugEvent::ConsoleMessage("Debug info refreshed".to_string()));
                }
                GdbCommand::SubmitConsole(ref line) => {
                    let mut guard = session.lock().await;
                    let echoed = format!("(gdb) {}", line);
                    match guard.submit_console_command(line).await {
                        gdbadapter::ConsoleOutcome::Handled => {
                            let _ = event_sender.send(DebugEvent::ConsoleMessage(echoed));
                        }
                        gdbadapter::ConsoleOutcome::Sent(result) => {
                            let _ = event_sender.send(DebugEvent::ConsoleMessage(echoed));
                            for (key, value) in &result.results {
                                let _ = event_sender.send(DebugEvent::ConsoleMessage(format!("{}={:?}", key, value)));
                            }
                        }
                        gdbadapter::ConsoleOutcome::Error(e) => {
                            let _ = event_sender.send(DebugEvent::ConsoleMessage(echoed));
                            let _ = event_sender.send(DebugEvent::CommandFailed(command, e.to_string()));
                        }
                    }
                }
                GdbCommand::HistoryPrev => {
                    let mut guard = session.lock().await;
                    let entry = guard.history_mut().previous().map(str::to_string);
                    let _ = event_sender.send(DebugEvent::HistoryEntry(entry));
                }
                GdbCommand::HistoryNext => {
                    let mut guard = session.lock().await;
                    let entry = guard.history_mut().next().map(str::to_string);
                    let _ = event_sender.send(DebugEvent::HistoryEntry(entry));
                }
                GdbCommand::RequestCompletion(ref line) => {
                    let guard = session.lock().await;
                    let suggestions = guard.completion().complete(line);
                    let _ = event_sender.send(DebugEvent::CompletionSuggestions(suggestions));
                }
                GdbCommand::HoverEval(ref symbol) => {
                    let mut guard = session.lock().await;
                    if let Err(e) = guard.hover_eval(symbol).await {
                        error!("hover eval failed: {}", e);
                    }
                    let value = guard.hover().current().cloned();
                    let _ = event_sender.send(DebugEvent::HoverResolved(value));
                }
                GdbCommand::AddWatch(ref expr) => {
                    let mut guard = session.lock().await;
                    match guard.create_watch(expr).await {
                        Ok(_) => {
                            let _ = event_sender.send(DebugEvent::WatchesUpdated(guard.watches().to_vec()));
                        }
                        Err(e) => {
                            let _ = event_sender.send(DebugEvent::CommandFailed(command, e.to_string()));
                        }
                    }
                }
            }
        }
    }

    fn report_step(
        result: Result<(), String>,
        command: GdbCommand,
        event_sender: &std::sync::mpsc::Sender<DebugEvent>,
    ) {
        match result {
            Ok(_) => {
                let _ = event_sender.send(DebugEvent::TargetStateChanged(TargetState::Stopped));
                let _ = event_sender.send(DebugEvent::CommandCompleted(command));
            }
            Err(e) => {
                let _ = event_sender.send(DebugEvent::CommandFailed(command, e));
            }
        }
    }

    /// Process events from the debug session
    fn process_events(&mut self, command_sender: &std::sync::mpsc::Sender<GdbCommand>) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                DebugEvent::RegistersUpdated(registers) => {
                    self.state.registers = registers;
                }
                DebugEvent::StackFramesUpdated(stack_frames) => {
                    self.state.stack_frames = stack_frames;
                }
                DebugEvent::AssemblyUpdated(assembly_lines) => {
                    self.state.assembly_lines = assembly_lines;
                }
                DebugEvent::BreakpointsUpdated(breakpoints) => {
                    self.state.model_breakpoints = breakpoints;
                }
                DebugEvent::LocalsUpdated(locals) => {
                    self.state.locals = locals;
                }
                DebugEvent::WatchesUpdated(watches) => {
                    self.state.watches = watches;
                }
                DebugEvent::MemoryUpdated(dump) => {
                    self.state.memory_address = format!("0x{:x}", dump.start_address);
                    self.state.memory_data = dump.bytes;
                }
                DebugEvent::CompletionSuggestions(suggestions) => {
                    self.state.completion_suggestions = suggestions;
                }
                DebugEvent::HistoryEntry(entry) => {
                    if let Some(entry) = entry {
                        self.state.console_input = entry;
                    }
                }
                DebugEvent::HoverResolved(value) => {
                    self.state.hover_value = value;
                }
                DebugEvent::ConsoleMessage(message) => {
                    self.state.add_console_message(message);
                }
                DebugEvent::SessionStarted => {
                    self.state.is_debugging = true;
                    self.state.target_state = TargetState::Stopped;
                    info!("Debug session started - GUI state updated");

                    if let Err(e) = command_sender.send(GdbCommand::RefreshDebugInfo) {
                        error!("Failed to send auto-refresh command: {}", e);
                    }
                }
                DebugEvent::SessionStartFailed(error) => {
                    self.state.set_error(format!("Failed to start GDB session: {}", error));
                    self.state.is_debugging = false;
                }
                DebugEvent::SessionStopped => {
                    self.state.reset_debug_state();
                    info!("Debug session stopped - GUI state reset");
                }
                DebugEvent::CommandCompleted(command) => {
                    debug!("Command completed: {:?}", command);
                    match command {
                        GdbCommand::StepOver | GdbCommand::StepInto | GdbCommand::StepOut | GdbCommand::Interrupt => {
                            if let Err(e) = command_sender.send(GdbCommand::RefreshDebugInfo) {
                                error!("Failed to send auto-refresh command: {}", e);
                            }
                        }
                        _ => {}
                    }
                }
                DebugEvent::CommandFailed(command, error) => {
                    self.state.set_error(format!("Command {:?} failed: {}", command, error));
                }
                DebugEvent::GdbConnectionLost => {
                    self.state.reset_debug_state();
                    self.state.set_error("Lost connection to GDB".to_string());
                }
                DebugEvent::TargetStateChanged(target_state) => {
                    self.state.target_state = target_state;
                }
            }
        }
    }
}

impl eframe::App for BmdebugApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process events from the debug session
        let command_sender = self.command_sender.clone();
        self.process_events(&command_sender);

        // Render error popup if needed
        ui::render_error_popup(ctx, &mut self.state);

        // Menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui::render_view_menu(ui, &mut self.state, &self.command_sender);
            });
        });

        // Main toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::render_toolbar(ui, &mut self.state, &self.command_sender);
        });

        // Start-session panel
        egui::TopBottomPanel::top("start_panel").show(ctx, |ui| {
            ui::render_start_panel(ui, &mut self.state, &self.command_sender);
        });

        // Breakpoint panel
        egui::TopBottomPanel::top("breakpoint_panel").show(ctx, |ui| {
            ui::render_breakpoint_panel(ui, &mut self.state, &self.command_sender);
        });

        // Error message panel
        if self.state.has_error() {
            egui::TopBottomPanel::top("error_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, &self.state.error_message);
                    if ui.button("✕").clicked() {
                        self.state.clear_error();
                    }
                });
            });
        }

        // Console panel (always at bottom when visible)
        if self.state.show_console {
            egui::TopBottomPanel::bottom("console").min_height(220.0).show(ctx, |ui| {
                ui::render_console_panel(ui, &mut self.state, &self.command_sender);
            });
        }

        // Main content area with side panels
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                // Main assembly panel (takes most of the space)
                ui.allocate_ui_with_layout(
                    egui::Vec2::new(ui.available_width() * 0.7, ui.available_height()),
                    egui::Layout::top_down(egui::Align::LEFT),
                    |ui| {
                        if self.state.show_assembly {
                            ui::render_assembly_panel(ui, &self.state);
                        } else {
                            ui.centered_and_justified(|ui| {
                                ui.label("Assembly view disabled");
                            });
                        }

                        if self.state.show_locals {
                            ui.separator();
                            ui::render_locals_panel(ui, &self.state);
                        }

                        if self.state.show_watches {
                            ui.separator();
                            ui::render_watches_panel(ui, &mut self.state, &self.command_sender);
                        }

                        ui.separator();
                        ui::render_hover_panel(ui, &mut self.state, &self.command_sender);
                    },
                );

                ui.separator();

                // Right sidebar for registers and stack (takes remaining space)
                ui.allocate_ui_with_layout(
                    egui::Vec2::new(ui.available_width(), ui.available_height()),
                    egui::Layout::top_down(egui::Align::LEFT),
                    |ui| {
                        // Registers panel (top half of sidebar)
                        if self.state.show_registers {
                            ui.allocate_ui_with_layout(
                                egui::Vec2::new(ui.available_width(), ui.available_height() * 0.5),
                                egui::Layout::top_down(egui::Align::LEFT),
                                |ui| {
                                    ui::render_registers_panel(ui, &self.state);
                                },
                            );
                        }

                        ui.separator();

                        // Stack frames panel (bottom half of sidebar)
                        if self.state.show_stack {
                            ui.allocate_ui_with_layout(
                                egui::Vec2::new(ui.available_width(), ui.available_height()),
                                egui::Layout::top_down(egui::Align::LEFT),
                                |ui| {
                                    ui::render_stack_panel(ui, &self.state);
                                },
                            );
                        }
                    },
                );
            });

            // Memory viewer (if enabled) - separate section at the bottom
            if self.state.show_memory {
                ui.separator();
                ui::render_memory_panel(ui, &mut self.state, &self.command_sender);
            }
        });

        // Request repaint to keep UI responsive
        ctx.request_repaint();
    }
}
