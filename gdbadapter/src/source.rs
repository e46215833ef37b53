/// Source model: three coordinate systems over one compilation unit —
/// source line (as authored), physical line (as currently displayed, after
/// hidden lines are collapsed), and address (as mapped by DWARF line info
/// or disassembly) — plus the four mapping operations between them.
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub source_line: u32,
    pub text: String,
    pub address: Option<u64>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub path: String,
    lines: Vec<SourceLine>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
        }
    }

    pub fn push_line(&mut self, source_line: u32, text: impl Into<String>) {
        self.lines.push(SourceLine {
            source_line,
            text: text.into(),
            address: None,
            hidden: false,
        });
    }

    /// Attach an address to the line matching `source_line`, e.g. from
    /// DWARF line-table lookup or disassembly interleave.
    pub fn set_address(&mut self, source_line: u32, address: u64) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.source_line == source_line) {
            line.address = Some(address);
        }
    }

    /// Toggle a line hidden instead of deleting it, so physical-line
    /// indices stay meaningful for lines added later by disassembly
    /// interleave.
    pub fn set_hidden(&mut self, source_line: u32, hidden: bool) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.source_line == source_line) {
            line.hidden = hidden;
        }
    }

    fn visible_lines(&self) -> impl Iterator<Item = &SourceLine> {
        self.lines.iter().filter(|l| !l.hidden)
    }

    /// Source line -> physical line (1-based position among visible lines).
    pub fn source_to_physical(&self, source_line: u32) -> Option<u32> {
        self.visible_lines()
            .position(|l| l.source_line == source_line)
            .map(|idx| idx as u32 + 1)
    }

    /// Physical line -> source line.
    pub fn physical_to_source(&self, physical_line: u32) -> Option<u32> {
        if physical_line == 0 {
            return None;
        }
        self.visible_lines().nth(physical_line as usize - 1).map(|l| l.source_line)
    }

    /// Address -> physical line, via the nearest line whose mapped address
    /// does not exceed `address`.
    pub fn address_to_physical(&self, address: u64) -> Option<u32> {
        let mut best: Option<(u32, u64)> = None;
        for (idx, line) in self.visible_lines().enumerate() {
            if let Some(addr) = line.address {
                if addr <= address && best.map(|(_, best_addr)| addr >= best_addr).unwrap_or(true) {
                    best = Some((idx as u32 + 1, addr));
                }
            }
        }
        best.map(|(physical, _)| physical)
    }

    /// Physical line -> address.
    pub fn physical_to_address(&self, physical_line: u32) -> Option<u64> {
        if physical_line == 0 {
            return None;
        }
        self.visible_lines().nth(physical_line as usize - 1).and_then(|l| l.address)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn visible_line_count(&self) -> usize {
        self.visible_lines().count()
    }
}

/// Holds every source file opened during a session, keyed by path, in the
/// order first encountered.
#[derive(Debug, Clone, Default)]
pub struct SourceModel {
    files: IndexMap<String, SourceFile>,
}

impl SourceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: SourceFile) {
        self.files.insert(file.path.clone(), file);
    }

    pub fn get(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut SourceFile> {
        self.files.get_mut(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SourceFile {
        let mut f = SourceFile::new("main.c");
        f.push_line(1, "int main() {");
        f.push_line(2, "    return 0;");
        f.push_line(3, "}");
        f.set_address(1, 0x1000);
        f.set_address(2, 0x1004);
        f.set_address(3, 0x1008);
        f
    }

    #[test]
    fn source_to_physical_is_identity_with_nothing_hidden() {
        let f = sample();
        assert_eq!(f.source_to_physical(2), Some(2));
    }

    #[test]
    fn hidden_line_shifts_physical_indices() {
        let mut f = sample();
        f.set_hidden(1, true);
        assert_eq!(f.source_to_physical(2), Some(1));
        assert_eq!(f.physical_to_source(1), Some(2));
    }

    #[test]
    fn address_to_physical_finds_nearest_not_exceeding() {
        let f = sample();
        assert_eq!(f.address_to_physical(0x1005), Some(2));
        assert_eq!(f.address_to_physical(0x1000), Some(1));
    }

    #[test]
    fn physical_to_address_round_trips() {
        let f = sample();
        let physical = f.source_to_physical(3).unwrap();
        assert_eq!(f.physical_to_address(physical), Some(0x1008));
    }
}
