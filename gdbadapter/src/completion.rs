/// Command-line completion for the console: classifies the token under the
/// cursor and proposes candidates from the relevant namespace (MI/CLI
/// command names, breakpoint numbers, register names, or symbols).
use crate::models::CORTEX_M_REGISTER_NAMES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamClass {
    Command,
    BreakpointNumber,
    RegisterName,
    Symbol,
}

const COMMANDS: &[&str] = &[
    "break", "tbreak", "watch", "delete", "continue", "step", "next", "finish", "run", "reset", "hard reset",
    "print", "info", "monitor", "help", "trace",
];

pub struct CompletionEngine {
    symbols: Vec<String>,
    breakpoint_numbers: Vec<String>,
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionEngine {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            breakpoint_numbers: Vec::new(),
        }
    }

    pub fn set_symbols(&mut self, symbols: Vec<String>) {
        self.symbols = symbols;
    }

    pub fn set_breakpoint_numbers(&mut self, numbers: Vec<String>) {
        self.breakpoint_numbers = numbers;
    }

    /// Decide which namespace a partial command line is completing against.
    pub fn classify(line: &str) -> ParamClass {
        let trimmed = line.trim_start();
        if !trimmed.contains(' ') {
            return ParamClass::Command;
        }
        if trimmed.starts_with("delete") || trimmed.starts_with("enable") || trimmed.starts_with("disable") {
            ParamClass::BreakpointNumber
        } else if trimmed.starts_with("info registers") || trimmed.starts_with("print $") {
            ParamClass::RegisterName
        } else {
            ParamClass::Symbol
        }
    }

    /// Candidates matching `prefix` in the namespace implied by the full
    /// line.
    pub fn complete(&self, line: &str) -> Vec<String> {
        let prefix = line.rsplit(' ').next().unwrap_or(line);
        match Self::classify(line) {
            ParamClass::Command => COMMANDS
                .iter()
                .filter(|c| c.starts_with(prefix))
                .map(|c| c.to_string())
                .collect(),
            ParamClass::BreakpointNumber => self
                .breakpoint_numbers
                .iter()
                .filter(|n| n.starts_with(prefix))
                .cloned()
                .collect(),
            ParamClass::RegisterName => CORTEX_M_REGISTER_NAMES
                .iter()
                .filter(|r| r.starts_with(prefix.trim_start_matches('$')))
                .map(|r| r.to_string())
                .collect(),
            ParamClass::Symbol => self.symbols.iter().filter(|s| s.starts_with(prefix)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_word_completes_against_command_table() {
        assert_eq!(CompletionEngine::classify("bre"), ParamClass::Command);
    }

    #[test]
    fn delete_arg_completes_breakpoint_numbers() {
        assert_eq!(CompletionEngine::classify("delete 1"), ParamClass::BreakpointNumber);
    }

    #[test]
    fn register_reference_completes_register_names() {
        assert_eq!(CompletionEngine::classify("print $p"), ParamClass::RegisterName);
        let engine = CompletionEngine::new();
        let candidates = engine.complete("print $p");
        assert!(candidates.contains(&"pc".to_string()));
    }

    #[test]
    fn symbol_completion_uses_known_symbol_list() {
        let mut engine = CompletionEngine::new();
        engine.set_symbols(vec!["main".into(), "main_loop".into(), "other".into()]);
        let candidates = engine.complete("break ma");
        assert_eq!(candidates, vec!["main".to_string(), "main_loop".to_string()]);
    }
}
