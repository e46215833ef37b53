/// Bmdebug GUI - A modern GDB frontend
///
/// This crate provides a GUI interface for debugging applications using GDB.
/// It uses the eframe/egui toolkit for the UI and communicates with GDB through
/// the gdbadapter crate.
use eframe::egui;

// Re-export the main application
pub use app::BmdebugApp;

// Module declarations
mod app;
mod commands;
mod state;
mod ui;

/// Apply a `-f/--font` override of the form `SIZE[,STD[,MONO]]` to every text
/// style egui uses. The family names are accepted for compatibility with the
/// option's documented syntax but are not applied: swapping in a custom font
/// family requires registering font data, which is out of scope here.
fn apply_font_override(ctx: &egui::Context, spec: &str) {
    let size_part = spec.split(',').next().unwrap_or(spec).trim();
    let Ok(size) = size_part.parse::<f32>() else {
        log::warn!("ignoring malformed font spec: {}", spec);
        return;
    };

    let mut style = (*ctx.style()).clone();
    for font_id in style.text_styles.values_mut() {
        font_id.size = size;
    }
    ctx.set_style(style);
}

/// Entry point for the GUI application. `gdb_path` and `elf_path` come from
/// the CLI's `-g`/positional-argument parsing and pre-fill the start panel;
/// `target_index` is the `-t`/`--target` scan index and `font` the `-f`/
/// `--font` override.
pub fn run_gui(gdb_path: String, elf_path: Option<String>, target_index: u32, font: Option<String>) -> i32 {
    // Create a tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let _guard = rt.enter();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Bmdebug - GDB Frontend"),
        ..Default::default()
    };

    match eframe::run_native(
        "Bmdebug",
        options,
        Box::new(move |cc| {
            if let Some(font) = &font {
                apply_font_override(&cc.egui_ctx, font);
            }
            Box::new(BmdebugApp::new(gdb_path, elf_path).with_target_index(target_index))
        }),
    ) {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("Error running GUI: {}", e);
            1
        }
    }
}
