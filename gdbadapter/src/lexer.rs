/// MI Lexer: raw bytes from GDB's stdout -> classified records.
///
/// Unlike `parser::parse_gdb_output`, which assumes a complete line is
/// already in hand, `Lexer::feed` accepts whatever bytes just arrived from a
/// non-blocking read and is responsible for buffering a partial line across
/// calls, splitting on `\n`/`\r\n`, and stitching `NoEol`-continued lines
/// together (see the specification's continuation rule).
use crate::types::{ClassifiedRecord, RecordFlags};

/// Rewrites record flags at classification time. Used to retag
/// script-echoed `Log` records as `Script` so they can be hidden by
/// default while a multi-line probe script is running.
pub type ReplaceMap = Vec<(RecordFlags, RecordFlags)>;

/// Maximum bytes a NoEol-continued record may accumulate before the lexer
/// forcibly terminates it. The specification calls out that the
/// continuation rule is unbounded in the original and recommends a cap.
const MAX_CONTINUATION_LEN: usize = 64 * 1024;

pub struct Lexer {
    buffer: Vec<u8>,
    /// Set when the previous record emitted had `NO_EOL` and is eligible to
    /// be continued by the next one of identical (non-NoEol) class.
    pending_noeol: Option<ClassifiedRecord>,
    replace_map: ReplaceMap,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            pending_noeol: None,
            replace_map: Vec::new(),
        }
    }

    /// Install a replace map that rewrites flags at classification time.
    pub fn set_replace_map(&mut self, map: ReplaceMap) {
        self.replace_map = map;
    }

    pub fn clear_replace_map(&mut self) {
        self.replace_map.clear();
    }

    /// Feed newly-arrived bytes. Returns the records completed by this call
    /// (zero or more), plus a flag telling the caller whether a `(gdb)`
    /// prompt was seen, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<LexerEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();

        loop {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n');
            let Some(pos) = newline_pos else { break };

            let mut line_bytes = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            line_bytes.pop(); // remove '\n'
            if line_bytes.last() == Some(&b'\r') {
                line_bytes.pop();
            }
            let line = String::from_utf8_lossy(&line_bytes).into_owned();

            if let Some(event) = self.classify_line(&line) {
                out.push(event);
            }
        }

        out
    }

    fn classify_line(&mut self, line: &str) -> Option<LexerEvent> {
        if line.trim().is_empty() {
            return None;
        }
        if line.trim().len() <= 6 && line.trim() == "(gdb)" {
            return Some(LexerEvent::Prompt);
        }

        let mut record = match line.chars().next() {
            Some('^') => ClassifiedRecord::new(&line[1..], RecordFlags::RESULT),
            Some('*') => ClassifiedRecord::new(&line[1..], RecordFlags::EXEC),
            Some('+') => ClassifiedRecord::new(&line[1..], RecordFlags::STATUS),
            Some('=') => ClassifiedRecord::new(&line[1..], RecordFlags::NOTICE),
            Some('~') => ClassifiedRecord::new(unescape(&line[1..]), RecordFlags::LOG),
            Some('-') => ClassifiedRecord::new(unescape(&line[1..]), RecordFlags::MI_INPUT),
            Some('&') => ClassifiedRecord::new(unescape(&line[1..]), RecordFlags::LOG),
            Some('@') => ClassifiedRecord::new(unescape(&line[1..]), RecordFlags::TARGET),
            _ => ClassifiedRecord::new(line, RecordFlags::NONE),
        };

        if record.flags.contains(RecordFlags::RESULT) && record.text.contains("^error") {
            record.flags.insert(RecordFlags::ERROR);
        }
        if record.text.starts_with("error") || record.text.contains(",msg=") {
            // ^error,... already carried as RESULT above; nothing further.
        }

        for (from, to) in &self.replace_map {
            if record.flags.contains(*from) {
                record.flags.remove(*from);
                record.flags.insert(*to);
            }
        }

        // Continuation stitching: the previous record had NoEol set and
        // ended up being completed by this line's arrival without its own
        // terminator (i.e. this call received the tail of a line that was
        // itself split across reads and never got an explicit flag). In
        // practice `feed` already waits for a full `\n`-terminated line
        // before calling `classify_line`, so NoEol here models a GDB target
        // stream that emits partial console text with no trailing newline
        // followed immediately by more of the same stream class.
        if let Some(mut pending) = self.pending_noeol.take() {
            if pending.flags.class() == record.flags.class() {
                pending.text.push_str(&record.text);
                if pending.text.len() > MAX_CONTINUATION_LEN {
                    return Some(LexerEvent::Record(pending));
                }
                self.pending_noeol = Some(pending);
                return None;
            } else {
                // Different class: flush the pending record untouched and
                // fall through to classify the new one normally.
                let flushed = pending;
                self.pending_noeol = Some(record);
                return Some(LexerEvent::Record(flushed));
            }
        }

        if record.flags.contains(RecordFlags::NO_EOL) {
            self.pending_noeol = Some(record);
            None
        } else {
            Some(LexerEvent::Record(record))
        }
    }

    /// Flush any pending (never-continued) NoEol record, e.g. on session
    /// teardown.
    pub fn flush(&mut self) -> Option<ClassifiedRecord> {
        self.pending_noeol.take()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexerEvent {
    Record(ClassifiedRecord),
    Prompt,
}

/// Unescape a C-style quoted-string body (quotes already stripped by the
/// caller's slice offset, or still present — both are tolerated).
pub fn unescape(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('x') => {
                let hex: String = chars.by_ref().take_while_ref(|c| c.is_ascii_hexdigit(), 2);
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    out.push(byte as char);
                } else {
                    out.push('x');
                }
            }
            Some(c) if c.is_digit(8) => {
                let mut octal = String::new();
                octal.push(c);
                for _ in 0..2 {
                    if let Some(&next) = chars.peek() {
                        if next.is_digit(8) {
                            octal.push(next);
                            chars.next();
                            continue;
                        }
                    }
                    break;
                }
                if let Ok(byte) = u8::from_str_radix(&octal, 8) {
                    out.push(byte as char);
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Small helper so `unescape` can bound how many hex digits it grabs
/// without pulling in an iterator-adapter crate for one call site.
trait TakeWhileRefExt: Iterator<Item = char> + Sized {
    fn take_while_ref(&mut self, pred: impl Fn(&char) -> bool, max: usize) -> String {
        let mut s = String::new();
        for _ in 0..max {
            match self.next() {
                Some(c) if pred(&c) => s.push(c),
                Some(_) | None => break,
            }
        }
        s
    }
}
impl<I: Iterator<Item = char>> TakeWhileRefExt for I {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_zero_bytes_produces_no_record() {
        let mut lexer = Lexer::new();
        assert!(lexer.feed(b"").is_empty());
    }

    #[test]
    fn bare_newline_flushes_nothing_with_no_class_pending() {
        let mut lexer = Lexer::new();
        assert!(lexer.feed(b"\n").is_empty());
    }

    #[test]
    fn prompt_is_not_stored() {
        let mut lexer = Lexer::new();
        let events = lexer.feed(b"(gdb) \n");
        assert_eq!(events, vec![LexerEvent::Prompt]);
    }

    #[test]
    fn result_record_classified() {
        let mut lexer = Lexer::new();
        let events = lexer.feed(b"^done\n");
        match &events[0] {
            LexerEvent::Record(r) => {
                assert_eq!(r.flags.class(), RecordFlags::RESULT);
                assert_eq!(r.text, "done");
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn console_record_unescaped() {
        let mut lexer = Lexer::new();
        let events = lexer.feed(b"~\"Hello\\nWorld\"\n");
        match &events[0] {
            LexerEvent::Record(r) => {
                assert_eq!(r.flags.class(), RecordFlags::LOG);
                assert_eq!(r.text, "Hello\nWorld");
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn split_across_two_feeds_still_classified() {
        let mut lexer = Lexer::new();
        assert!(lexer.feed(b"^do").is_empty());
        let events = lexer.feed(b"ne\n");
        match &events[0] {
            LexerEvent::Record(r) => assert_eq!(r.text, "done"),
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn replace_map_retags_log_as_script() {
        let mut lexer = Lexer::new();
        lexer.set_replace_map(vec![(RecordFlags::LOG, RecordFlags::SCRIPT)]);
        let events = lexer.feed(b"&\"echoed\"\n");
        match &events[0] {
            LexerEvent::Record(r) => assert_eq!(r.flags.class(), RecordFlags::SCRIPT),
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn error_result_gets_error_bit() {
        let mut lexer = Lexer::new();
        let events = lexer.feed(b"^error,msg=\"boom\"\n");
        match &events[0] {
            LexerEvent::Record(r) => {
                assert!(r.flags.contains(RecordFlags::RESULT));
                assert!(r.flags.contains(RecordFlags::ERROR));
            }
            _ => panic!("expected record"),
        }
    }
}
