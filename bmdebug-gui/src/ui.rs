/// UI components for the debugging interface
///
/// This module contains reusable UI components for different debugging views.

use eframe::egui;
use crate::state::AppState;
use crate::commands::GdbCommand;

/// Render the main toolbar with debugging controls
pub fn render_toolbar(
    ui: &mut egui::Ui,
    state: &mut AppState,
    command_sender: &std::sync::mpsc::Sender<GdbCommand>,
) {
    ui.horizontal(|ui| {
        ui.add_enabled_ui(state.is_debugging, |ui| {
            if ui.button("▶ Continue").clicked() {
                let _ = command_sender.send(GdbCommand::Continue);
            }
            if ui.button("⏸ Break").clicked() {
                let _ = command_sender.send(GdbCommand::Interrupt);
            }
        });

        ui.separator();

        ui.add_enabled_ui(state.is_debugging, |ui| {
            if ui.button("⬇ Step Into").clicked() {
                let _ = command_sender.send(GdbCommand::StepInto);
            }
            if ui.button("➡ Step Over").clicked() {
                let _ = command_sender.send(GdbCommand::StepOver);
            }
            if ui.button("⬆ Step Out").clicked() {
                let _ = command_sender.send(GdbCommand::StepOut);
            }
        });

        ui.separator();

        ui.add_enabled_ui(state.is_debugging, |ui| {
            if ui.button("🔄 Refresh").clicked() {
                let _ = command_sender.send(GdbCommand::RefreshDebugInfo);
            }
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(if state.is_debugging {
                match state.target_state {
                    crate::commands::TargetState::Running => "🔴 Running",
                    crate::commands::TargetState::Stopped => "🔗 Stopped",
                    crate::commands::TargetState::Detached => "🟡 Connecting",
                }
            } else {
                "⭕ Ready"
            });
        });
    });
}

/// Render the panel for starting (or stopping) a debug session against the probe
pub fn render_start_panel(
    ui: &mut egui::Ui,
    state: &mut AppState,
    command_sender: &std::sync::mpsc::Sender<GdbCommand>,
) {
    ui.horizontal(|ui| {
        ui.label("GDB:");
        ui.add_enabled(!state.is_debugging, egui::TextEdit::singleline(&mut state.gdb_path_input));
        ui.label("ELF:");
        ui.add_enabled(!state.is_debugging, egui::TextEdit::singleline(&mut state.elf_path_input));
        ui.label("Target:");
        ui.add_enabled(
            !state.is_debugging,
            egui::DragValue::new(&mut state.target_index).clamp_range(1..=32),
        );

        if !state.is_debugging {
            if ui.button("🚀 Start Session").clicked() && !state.elf_path_input.is_empty() {
                let _ = command_sender.send(GdbCommand::StartSession {
                    gdb_path: state.gdb_path_input.clone(),
                    elf_path: state.elf_path_input.clone(),
                    target_index: state.target_index,
                });
            }
        } else if ui.button("🛑 Stop Session").clicked() {
            let _ = command_sender.send(GdbCommand::StopSession);
        }
    });
}

/// Render the breakpoint panel: the GDB-confirmed list (from `-break-list`,
/// wired through the refresh scheduler) plus the add-new-location input.
pub fn render_breakpoint_panel(
    ui: &mut egui::Ui,
    state: &mut AppState,
    command_sender: &std::sync::mpsc::Sender<GdbCommand>,
) {
    ui.horizontal(|ui| {
        ui.label("Breakpoint:");
        ui.text_edit_singleline(&mut state.breakpoint_input);
        if ui.button("Add").clicked() && !state.breakpoint_input.is_empty() {
            let _ = command_sender.send(GdbCommand::SetBreakpoint(state.breakpoint_input.clone()));
            state.breakpoint_input.clear();
        }

        ui.separator();
        ui.label("Breakpoints:");
        if state.model_breakpoints.is_empty() {
            for (i, bp) in state.breakpoints.iter().enumerate() {
                ui.label(format!("#{} {} (pending)", i + 1, bp));
            }
        } else {
            for bp in &state.model_breakpoints {
                let location = bp.function.as_deref().unwrap_or_else(|| bp.address.as_deref().unwrap_or("?"));
                ui.label(format!("#{} {} (hits={})", bp.number, location, bp.times_hit));
            }
        }
    });
}

/// Render the registers panel
pub fn render_registers_panel(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Registers");

    if state.registers.is_empty() {
        ui.label("No register data available");
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("registers_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Register");
                ui.label("Value");
                ui.end_row();

                for register in &state.registers {
                    ui.label(&register.name);
                    ui.label(&register.value);
                    ui.end_row();
                }
            });
    });
}

/// Render the assembly panel
pub fn render_assembly_panel(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Assembly");

    if state.assembly_lines.is_empty() {
        ui.label("No assembly data available");
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for line in &state.assembly_lines {
            ui.horizontal(|ui| {
                let marker = if line.is_current { "▶" } else { " " };
                ui.monospace(format!("{} 0x{:08x}", marker, line.address));
                if let Some(offset) = &line.function_offset {
                    ui.label(format!("<{}>", offset));
                }
                ui.label(&line.instruction);
            });
        }
    });
}

/// Render the stack frames panel
pub fn render_stack_panel(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Stack Frames");

    if state.stack_frames.is_empty() {
        ui.label("No stack frame data available");
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for frame in &state.stack_frames {
            ui.horizontal(|ui| {
                let display = if let Some(func) = &frame.func {
                    format!("#{} {} @ {}", frame.level, func, frame.addr)
                } else {
                    format!("#{} @ {}", frame.level, frame.addr)
                };
                ui.label(display);
            });
        }
    });
}

/// Render the locals panel, populated from the post-stop refresh queue.
pub fn render_locals_panel(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Locals");

    if state.locals.is_empty() {
        ui.label("No locals in scope");
        return;
    }

    egui::ScrollArea::vertical().id_source("locals_scroll").max_height(120.0).show(ui, |ui| {
        for local in &state.locals {
            ui.label(format!("{} = {}", local.name, local.value.as_deref().unwrap_or("<unavailable>")));
        }
    });
}

/// Render the watch-expression panel: existing watches plus an input to add
/// a new one via `Session::create_watch`.
pub fn render_watches_panel(
    ui: &mut egui::Ui,
    state: &mut AppState,
    command_sender: &std::sync::mpsc::Sender<GdbCommand>,
) {
    ui.heading("Watches");

    ui.horizontal(|ui| {
        ui.text_edit_singleline(&mut state.watch_input);
        if ui.button("Watch").clicked() && !state.watch_input.is_empty() {
            let _ = command_sender.send(GdbCommand::AddWatch(state.watch_input.clone()));
            state.watch_input.clear();
        }
    });

    egui::ScrollArea::vertical().id_source("watches_scroll").max_height(120.0).show(ui, |ui| {
        for watch in &state.watches {
            let scope = if watch.in_scope { "" } else { " (out of scope)" };
            ui.label(format!(
                "{} = {}{}",
                watch.expression,
                watch.value.as_deref().unwrap_or("?"),
                scope
            ));
        }
    });
}

/// Render the hover/evaluate-expression widget backed by `Session::hover_eval`.
pub fn render_hover_panel(
    ui: &mut egui::Ui,
    state: &mut AppState,
    command_sender: &std::sync::mpsc::Sender<GdbCommand>,
) {
    ui.horizontal(|ui| {
        ui.label("Evaluate:");
        ui.text_edit_singleline(&mut state.hover_symbol_input);
        if ui.button("Evaluate").clicked() && !state.hover_symbol_input.is_empty() {
            let _ = command_sender.send(GdbCommand::HoverEval(state.hover_symbol_input.clone()));
        }
        if let Some(value) = &state.hover_value {
            ui.label(format!("{} = {} ({})", value.symbol, value.decimal, value.hex));
        }
    });
}

/// Render the memory viewer panel
pub fn render_memory_panel(
    ui: &mut egui::Ui,
    state: &mut AppState,
    command_sender: &std::sync::mpsc::Sender<GdbCommand>,
) {
    ui.heading("Memory Viewer");

    ui.horizontal(|ui| {
        ui.label("Address:");
        ui.text_edit_singleline(&mut state.memory_address);
        ui.label("Size:");
        ui.add(egui::DragValue::new(&mut state.memory_size).clamp_range(1..=4096));

        if ui.button("Read").clicked() {
            let _ = command_sender.send(GdbCommand::ReadMemory(
                state.memory_address.clone(),
                state.memory_size,
            ));
        }
    });

    if state.memory_data.is_empty() {
        ui.label("No memory data available");
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        // Display memory as hex dump
        for (i, chunk) in state.memory_data.chunks(16).enumerate() {
            ui.horizontal(|ui| {
                // Address
                ui.label(format!("{:08x}", i * 16));

                // Hex bytes
                for byte in chunk {
                    ui.label(format!("{:02x}", byte));
                }

                // ASCII representation
                let ascii: String = chunk
                    .iter()
                    .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                    .collect();
                ui.label(ascii);
            });
        }
    });
}

/// Render the console panel: scrollback plus a command-input line with
/// history navigation (Up/Down) and tab completion.
pub fn render_console_panel(
    ui: &mut egui::Ui,
    state: &mut AppState,
    command_sender: &std::sync::mpsc::Sender<GdbCommand>,
) {
    ui.label("Console Output:");
    egui::ScrollArea::vertical()
        .id_source("console_scroll")
        .max_height(140.0)
        .stick_to_bottom(true)
        .show(ui, |ui| {
            ui.monospace(&state.console_output);
        });

    ui.separator();

    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.console_input)
                .hint_text("type a GDB/MI or console command, Enter to submit")
                .desired_width(f32::INFINITY),
        );

        if response.changed() {
            let _ = command_sender.send(GdbCommand::RequestCompletion(state.console_input.clone()));
        }

        if response.has_focus() {
            if ui.input(|i| i.key_pressed(egui::Key::ArrowUp)) {
                let _ = command_sender.send(GdbCommand::HistoryPrev);
            } else if ui.input(|i| i.key_pressed(egui::Key::ArrowDown)) {
                let _ = command_sender.send(GdbCommand::HistoryNext);
            }
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) && !state.console_input.is_empty() {
            let _ = command_sender.send(GdbCommand::SubmitConsole(state.console_input.clone()));
            state.console_input.clear();
            state.completion_suggestions.clear();
        }
    });

    if !state.completion_suggestions.is_empty() {
        ui.horizontal_wrapped(|ui| {
            for suggestion in state.completion_suggestions.clone() {
                if ui.small_button(&suggestion).clicked() {
                    let prefix_len = state.console_input.rsplit(' ').next().map(str::len).unwrap_or(0);
                    state.console_input.truncate(state.console_input.len() - prefix_len);
                    state.console_input.push_str(&suggestion);
                }
            }
        });
    }
}

/// Render the panel visibility controls
pub fn render_view_menu(ui: &mut egui::Ui, state: &mut AppState, command_sender: &std::sync::mpsc::Sender<GdbCommand>) {
    ui.menu_button("File", |ui| {
        if ui.button("Exit").clicked() {
            std::process::exit(0);
        }
    });

    ui.menu_button("Debug", |ui| {
        if !state.is_debugging {
            if ui.button("Start Session").clicked() && !state.elf_path_input.is_empty() {
                let _ = command_sender.send(GdbCommand::StartSession {
                    gdb_path: state.gdb_path_input.clone(),
                    elf_path: state.elf_path_input.clone(),
                    target_index: state.target_index,
                });
                ui.close_menu();
            }
        } else if ui.button("Stop Session").clicked() {
            let _ = command_sender.send(GdbCommand::StopSession);
            ui.close_menu();
        }
    });

    ui.menu_button("View", |ui| {
        ui.checkbox(&mut state.show_registers, "Registers");
        ui.checkbox(&mut state.show_assembly, "Assembly");
        ui.checkbox(&mut state.show_stack, "Stack Frames");
        ui.checkbox(&mut state.show_locals, "Locals");
        ui.checkbox(&mut state.show_watches, "Watches");
        ui.checkbox(&mut state.show_memory, "Memory");
        ui.checkbox(&mut state.show_console, "Console");
    });
}

/// Render error messages if any
pub fn render_error_popup(ctx: &egui::Context, state: &mut AppState) {
    if state.has_error() {
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&state.error_message);

                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        state.clear_error();
                    }
                });
            });
    }
}
