use clap::Parser;

/// Black Magic Probe front-end for GDB/MI.
#[derive(Parser, Debug)]
#[command(name = "bmdebug", version, about = "GDB/MI front-end for Black Magic Probe", long_about = None)]
struct Cli {
    /// ELF file to load and debug
    elf_file: Option<String>,

    /// Font point size and optional font family names: SIZE[,STD[,MONO]]
    #[arg(short = 'f', long = "font")]
    font: Option<String>,

    /// Path to the GDB executable
    #[arg(short = 'g', long = "gdb", default_value = "arm-none-eabi-gdb")]
    gdb: String,

    /// Target index on multi-device scans
    #[arg(short = 't', long = "target", default_value_t = 1)]
    target: u32,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .with_module_level("egui_extras", log::LevelFilter::Debug)
        .with_module_level("syntect", log::LevelFilter::Debug)
        .with_module_level("eframe", log::LevelFilter::Warn)
        .with_module_level("egui_glow", log::LevelFilter::Warn)
        .with_module_level("gdbadapter", log::LevelFilter::Trace)
        .init()
        .unwrap();

    log::info!("bmdebug - GDB frontend starting (gdb={}, target index={})...", cli.gdb, cli.target);
    if let Some(font) = &cli.font {
        log::debug!("font override requested: {}", font);
    }

    let mut global_config = gdbadapter::GlobalConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load global config: {}", e);
        gdbadapter::GlobalConfig::default()
    });
    let gdb_path = if cli.gdb == "arm-none-eabi-gdb" {
        global_config
            .gdb_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or(cli.gdb.clone())
    } else {
        cli.gdb.clone()
    };

    let exit_code = bmdebug_gui::run_gui(gdb_path.clone(), cli.elf_file.clone(), cli.target, cli.font);

    global_config.gdb_path = Some(std::path::PathBuf::from(&gdb_path));
    if let Some(elf) = &cli.elf_file {
        global_config.push_recent(std::path::PathBuf::from(elf));
    }
    if let Err(e) = global_config.save() {
        log::warn!("failed to save global config: {}", e);
    }

    log::info!("Application exited with code: {exit_code}");
    std::process::exit(exit_code);
}
