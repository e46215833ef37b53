/// Register-alias layer: rewrites SVD peripheral/register references
/// (`PERIPH->REG` or `PERIPH.REG`) typed at the console into expressions
/// GDB can evaluate directly against memory-mapped addresses.
///
/// SVD parsing itself lives outside this crate; `SvdSource` is the seam a
/// host application implements to supply peripheral/register addresses.
pub trait SvdSource {
    /// Base address of a peripheral, by name (case-sensitive, as in the SVD).
    fn peripheral_base(&self, peripheral: &str) -> Option<u64>;
    /// Offset of a register within its peripheral, by name.
    fn register_offset(&self, peripheral: &str, register: &str) -> Option<u64>;
    /// Bit width of a register, used to pick the right GDB memory-access size.
    fn register_width_bits(&self, peripheral: &str, register: &str) -> Option<u32>;
}

pub struct RegisterAliasLayer<'a> {
    svd: &'a dyn SvdSource,
}

impl<'a> RegisterAliasLayer<'a> {
    pub fn new(svd: &'a dyn SvdSource) -> Self {
        Self { svd }
    }

    /// Rewrite every `PERIPH->REG` / `PERIPH.REG` occurrence in `expr` into
    /// a `*(type *)address` GDB expression. References that don't resolve
    /// against the SVD are left untouched, so a plain C expression with an
    /// unrelated `->` still works.
    pub fn rewrite(&self, expr: &str) -> String {
        let mut out = String::with_capacity(expr.len());
        let mut rest = expr;

        while let Some((before, reference, after, sep_len)) = find_next_reference(rest) {
            out.push_str(before);
            if let Some((peripheral, register)) = reference.split_once(if sep_len == 2 { "->" } else { "." }) {
                if let Some(replacement) = self.resolve(peripheral, register) {
                    out.push_str(&replacement);
                } else {
                    out.push_str(reference);
                }
            } else {
                out.push_str(reference);
            }
            rest = after;
        }
        out.push_str(rest);
        out
    }

    fn resolve(&self, peripheral: &str, register: &str) -> Option<String> {
        let base = self.svd.peripheral_base(peripheral)?;
        let offset = self.svd.register_offset(peripheral, register)?;
        let width = self.svd.register_width_bits(peripheral, register).unwrap_or(32);
        let address = base + offset;
        let cast = match width {
            8 => "unsigned char",
            16 => "unsigned short",
            64 => "unsigned long long",
            _ => "unsigned int",
        };
        Some(format!("*({} *)0x{:x}", cast, address))
    }
}

/// Find the next `IDENT->IDENT` or `IDENT.IDENT` reference in `s`. Returns
/// (prefix before the match, the matched reference, the remainder after
/// it, separator length).
fn find_next_reference(s: &str) -> Option<(&str, &str, &str, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
            let ident_start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let sep_len = if s[i..].starts_with("->") {
                2
            } else if s[i..].starts_with('.') {
                1
            } else {
                continue;
            };
            let after_sep = i + sep_len;
            let field_start = after_sep;
            let mut j = field_start;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            if j == field_start {
                continue;
            }
            return Some((&s[..ident_start], &s[ident_start..j], &s[j..], sep_len));
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSvd;
    impl SvdSource for FakeSvd {
        fn peripheral_base(&self, peripheral: &str) -> Option<u64> {
            match peripheral {
                "GPIOA" => Some(0x4800_0000),
                _ => None,
            }
        }
        fn register_offset(&self, peripheral: &str, register: &str) -> Option<u64> {
            match (peripheral, register) {
                ("GPIOA", "ODR") => Some(0x14),
                ("GPIOA", "IDR") => Some(0x10),
                _ => None,
            }
        }
        fn register_width_bits(&self, _: &str, _: &str) -> Option<u32> {
            Some(32)
        }
    }

    #[test]
    fn arrow_reference_rewritten_to_memory_cast() {
        let svd = FakeSvd;
        let layer = RegisterAliasLayer::new(&svd);
        assert_eq!(layer.rewrite("GPIOA->ODR"), "*(unsigned int *)0x48000014");
    }

    #[test]
    fn dot_reference_rewritten_too() {
        let svd = FakeSvd;
        let layer = RegisterAliasLayer::new(&svd);
        assert_eq!(layer.rewrite("GPIOA.IDR"), "*(unsigned int *)0x48000010");
    }

    #[test]
    fn unresolvable_reference_left_untouched() {
        let svd = FakeSvd;
        let layer = RegisterAliasLayer::new(&svd);
        assert_eq!(layer.rewrite("foo->bar"), "foo->bar");
    }

    #[test]
    fn unrelated_expression_passes_through() {
        let svd = FakeSvd;
        let layer = RegisterAliasLayer::new(&svd);
        assert_eq!(layer.rewrite("x + 1"), "x + 1");
    }

    #[test]
    fn rewrite_within_larger_expression_keeps_surrounding_text() {
        let svd = FakeSvd;
        let layer = RegisterAliasLayer::new(&svd);
        assert_eq!(
            layer.rewrite("(GPIOA->ODR & 0x1) != 0"),
            "(*(unsigned int *)0x48000014 & 0x1) != 0"
        );
    }
}
