/// Debug-info models extracted from MI result records: breakpoints,
/// watches, locals, registers, memory dumps, plus the refresh scheduler
/// that decides what to re-query after a stop.
use std::collections::HashMap;

use crate::types::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    pub number: String,
    pub enabled: bool,
    pub kind: String,
    pub address: Option<String>,
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub times_hit: u32,
    pub condition: Option<String>,
}

impl Breakpoint {
    /// Build from one `bkpt` tuple inside a `-break-list`/`-break-insert` reply.
    pub fn from_value(v: &Value) -> Option<Self> {
        let tuple = v.as_tuple()?;
        let get = |k: &str| tuple.get(k).and_then(Value::as_string).map(str::to_string);
        Some(Self {
            number: get("number")?,
            enabled: tuple.get("enabled").and_then(Value::as_string).map(|s| s == "y").unwrap_or(true),
            kind: get("type").unwrap_or_else(|| "breakpoint".into()),
            address: get("addr"),
            function: get("func"),
            file: get("file"),
            line: tuple.get("line").and_then(Value::as_string).and_then(|s| s.parse().ok()),
            times_hit: tuple.get("times").and_then(Value::as_string).and_then(|s| s.parse().ok()).unwrap_or(0),
            condition: get("cond"),
        })
    }
}

/// Extract every breakpoint from a `-break-list` reply's `BreakpointTable.body`.
pub fn extract_breakpoints(results: &HashMap<String, Value>) -> Vec<Breakpoint> {
    let Some(table) = results.get("BreakpointTable").and_then(Value::as_tuple) else {
        return Vec::new();
    };
    let Some(body) = table.get("body").and_then(Value::as_list) else {
        return Vec::new();
    };
    body.iter()
        .filter_map(|entry| entry.as_tuple().and_then(|t| t.get("bkpt")).or(Some(entry)))
        .filter_map(Breakpoint::from_value)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFileEntry {
    pub file: String,
    pub fullname: Option<String>,
}

/// Extract `files=[{file=...,fullname=...}, ...]` from a `-file-list-exec-source-files` reply.
pub fn extract_sources(results: &HashMap<String, Value>) -> Vec<SourceFileEntry> {
    let Some(files) = results.get("files").and_then(Value::as_list) else {
        return Vec::new();
    };
    files
        .iter()
        .filter_map(Value::as_tuple)
        .filter_map(|t| {
            Some(SourceFileEntry {
                file: t.get("file").and_then(Value::as_string)?.to_string(),
                fullname: t.get("fullname").and_then(Value::as_string).map(str::to_string),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: String,
    pub value: Option<String>,
    pub in_scope: bool,
}

/// Extract locals from `-stack-list-variables --skip-unavailable --all-values`,
/// applying the scope-clear/re-mark/delete-if-still-out-of-scope pattern:
/// entries already present keep their `in_scope` flag updated rather than
/// being replaced wholesale, so a caller can detect the difference between
/// "briefly out of scope" and "gone".
pub fn refresh_locals(existing: &mut Vec<Local>, results: &HashMap<String, Value>) {
    for local in existing.iter_mut() {
        local.in_scope = false;
    }

    if let Some(vars) = results.get("variables").and_then(Value::as_list) {
        for entry in vars.iter().filter_map(Value::as_tuple) {
            let Some(name) = entry.get("name").and_then(Value::as_string) else {
                continue;
            };
            let value = entry.get("value").and_then(Value::as_string).map(str::to_string);
            if let Some(found) = existing.iter_mut().find(|l| l.name == name) {
                found.value = value;
                found.in_scope = true;
            } else {
                existing.push(Local {
                    name: name.to_string(),
                    value,
                    in_scope: true,
                });
            }
        }
    }

    existing.retain(|l| l.in_scope);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Watch {
    pub expression: String,
    pub gdb_name: String,
    pub value: Option<String>,
    pub in_scope: bool,
    pub watchpoint_number: Option<String>,
}

impl Watch {
    pub fn new(expression: impl Into<String>, gdb_name: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            gdb_name: gdb_name.into(),
            value: None,
            in_scope: true,
            watchpoint_number: None,
        }
    }

    /// Apply one entry of a `-var-update`'s `changelist`.
    pub fn apply_change(&mut self, change: &HashMap<String, Value>) {
        if let Some(v) = change.get("in_scope").and_then(Value::as_string) {
            self.in_scope = v == "true";
        }
        if let Some(v) = change.get("value").and_then(Value::as_string) {
            self.value = Some(v.to_string());
        }
    }
}

/// ARM Cortex-M core register file, in the fixed order GDB reports them for
/// the M-profile register set.
pub const CORTEX_M_REGISTER_NAMES: [&str; 17] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "sp", "lr", "pc", "xpsr",
];

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterValue {
    pub number: u32,
    pub name: String,
    pub value: String,
}

/// Alias matching the GUI's naming for a single register entry.
pub type Register = RegisterValue;

/// One disassembled instruction, as shown in the assembly panel.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyLine {
    pub address: u64,
    pub function_offset: Option<String>,
    pub instruction: String,
    pub is_current: bool,
}

/// Extract `asm_insns=[{address=...,func-name=...,offset=...,inst=...}]`
/// from a `-data-disassemble` reply.
pub fn extract_disassembly(results: &HashMap<String, Value>, current_address: Option<u64>) -> Vec<AssemblyLine> {
    let Some(list) = results.get("asm_insns").and_then(Value::as_list) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(Value::as_tuple)
        .filter_map(|t| {
            let addr_str = t.get("address").and_then(Value::as_string)?;
            let address = u64::from_str_radix(addr_str.trim_start_matches("0x"), 16).ok()?;
            let instruction = t.get("inst").and_then(Value::as_string)?.to_string();
            let function_offset = match (t.get("func-name").and_then(Value::as_string), t.get("offset").and_then(Value::as_string)) {
                (Some(func), Some(offset)) => Some(format!("{}+{}", func, offset)),
                (Some(func), None) => Some(func.to_string()),
                _ => None,
            };
            Some(AssemblyLine {
                address,
                function_offset,
                instruction,
                is_current: current_address == Some(address),
            })
        })
        .collect()
}

/// Extract `register-values=[{number=...,value=...}, ...]` from
/// `-data-list-register-values`, naming each by position in
/// `CORTEX_M_REGISTER_NAMES`.
pub fn extract_registers(results: &HashMap<String, Value>) -> Vec<RegisterValue> {
    let Some(list) = results.get("register-values").and_then(Value::as_list) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(Value::as_tuple)
        .filter_map(|t| {
            let number: u32 = t.get("number").and_then(Value::as_string)?.parse().ok()?;
            let value = t.get("value").and_then(Value::as_string)?.to_string();
            let name = CORTEX_M_REGISTER_NAMES
                .get(number as usize)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("r{}", number));
            Some(RegisterValue { number, name, value })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDump {
    pub start_address: u64,
    pub bytes: Vec<u8>,
}

/// Extract a `-data-read-memory` reply's hex-nibble `memory` rows into raw
/// bytes.
pub fn extract_memory(results: &HashMap<String, Value>) -> Option<MemoryDump> {
    let rows = results.get("memory").and_then(Value::as_list)?;
    let mut start_address = None;
    let mut bytes = Vec::new();

    for row in rows.iter().filter_map(Value::as_tuple) {
        let addr = row.get("addr").and_then(Value::as_string)?;
        let addr_val = u64::from_str_radix(addr.trim_start_matches("0x"), 16).ok()?;
        if start_address.is_none() {
            start_address = Some(addr_val);
        }
        let data = row.get("data").and_then(Value::as_list)?;
        for byte_str in data.iter().filter_map(Value::as_string) {
            let byte = u8::from_str_radix(byte_str.trim_start_matches("0x"), 16).ok()?;
            bytes.push(byte);
        }
    }

    Some(MemoryDump {
        start_address: start_address?,
        bytes,
    })
}

/// What the running/stopped loop refreshes after a stop, in priority order:
/// SWO first (cheapest, always wanted live), then breakpoints (may have
/// changed across the stop), then locals/watches/registers/memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Swo,
    Breakpoints,
    Locals,
    Watches,
    Registers,
    Memory,
}

pub struct RefreshScheduler {
    pending: Vec<RefreshKind>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler {
    const ORDER: [RefreshKind; 6] = [
        RefreshKind::Swo,
        RefreshKind::Breakpoints,
        RefreshKind::Locals,
        RefreshKind::Watches,
        RefreshKind::Registers,
        RefreshKind::Memory,
    ];

    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Schedule every refresh kind, e.g. right after a stop.
    pub fn schedule_all(&mut self) {
        self.pending = Self::ORDER.to_vec();
    }

    pub fn schedule(&mut self, kind: RefreshKind) {
        if !self.pending.contains(&kind) {
            self.pending.push(kind);
        }
    }

    /// Pop the highest-priority pending refresh, if any.
    pub fn next(&mut self) -> Option<RefreshKind> {
        if self.pending.is_empty() {
            return None;
        }
        let idx = Self::ORDER
            .iter()
            .position(|k| self.pending.contains(k))?;
        let kind = Self::ORDER[idx];
        self.pending.retain(|k| *k != kind);
        Some(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(pairs: &[(&str, Value)]) -> Value {
        Value::Tuple(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn breakpoint_from_value_reads_core_fields() {
        let v = tuple(&[
            ("number", Value::String("1".into())),
            ("type", Value::String("breakpoint".into())),
            ("enabled", Value::String("y".into())),
            ("func", Value::String("main".into())),
            ("file", Value::String("main.c".into())),
            ("line", Value::String("42".into())),
            ("times", Value::String("3".into())),
        ]);
        let bp = Breakpoint::from_value(&v).unwrap();
        assert_eq!(bp.number, "1");
        assert_eq!(bp.function.as_deref(), Some("main"));
        assert_eq!(bp.line, Some(42));
        assert_eq!(bp.times_hit, 3);
    }

    #[test]
    fn refresh_scheduler_respects_priority_order() {
        let mut sched = RefreshScheduler::new();
        sched.schedule(RefreshKind::Registers);
        sched.schedule(RefreshKind::Swo);
        sched.schedule(RefreshKind::Locals);

        assert_eq!(sched.next(), Some(RefreshKind::Swo));
        assert_eq!(sched.next(), Some(RefreshKind::Locals));
        assert_eq!(sched.next(), Some(RefreshKind::Registers));
        assert_eq!(sched.next(), None);
    }

    #[test]
    fn refresh_locals_drops_out_of_scope_entries() {
        let mut locals = vec![Local {
            name: "x".into(),
            value: Some("1".into()),
            in_scope: true,
        }];
        let results: HashMap<String, Value> = HashMap::from([("variables".to_string(), Value::List(vec![]))]);
        refresh_locals(&mut locals, &results);
        assert!(locals.is_empty());
    }

    #[test]
    fn extract_registers_names_by_position() {
        let results: HashMap<String, Value> = HashMap::from([(
            "register-values".to_string(),
            Value::List(vec![tuple(&[
                ("number", Value::String("15".into())),
                ("value", Value::String("0x08000100".into())),
            ])]),
        )]);
        let regs = extract_registers(&results);
        assert_eq!(regs[0].name, "pc");
    }
}
