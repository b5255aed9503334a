//! Process-wide symbol interning.
//!
//! Mirrors the intern table in `parcadei-ouros`'s `intern.rs` (a central table mapping
//! strings to small indices so that identity comparison is a pointer/index
//! compare instead of a string compare) but scaled down to what the spec
//! requires: one flat table, no static-string fast path, no bytecode-operand
//! packing.

use std::sync::{Mutex, OnceLock};

/// A canonical, interned identifier. Two symbols with the same spelling
/// compare equal in O(1) and share the same `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        interner().resolve(self)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Interner {
    table: Mutex<InternTable>,
}

#[derive(Default)]
struct InternTable {
    strings: Vec<&'static str>,
    lookup: ahash::AHashMap<&'static str, u32>,
}

impl Interner {
    fn intern(&self, s: &str) -> Symbol {
        let mut table = self.table.lock().expect("intern table poisoned");
        if let Some(&id) = table.lookup.get(s) {
            return Symbol(id);
        }
        // Leaked once per distinct spelling; bounded by the number of unique
        // identifiers/symbols a template and its expressions can name.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = u32::try_from(table.strings.len()).expect("too many interned symbols");
        table.strings.push(leaked);
        table.lookup.insert(leaked, id);
        Symbol(id)
    }

    fn resolve(&self, sym: Symbol) -> &'static str {
        let table = self.table.lock().expect("intern table poisoned");
        table.strings[sym.index()]
    }
}

fn interner() -> &'static Interner {
    static INTERNER: OnceLock<Interner> = OnceLock::new();
    INTERNER.get_or_init(|| Interner {
        table: Mutex::new(InternTable::default()),
    })
}

/// Intern a string, returning its canonical `Symbol`.
#[must_use]
pub fn intern(s: &str) -> Symbol {
    interner().intern(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_spelling_is_identical() {
        let a = intern("each");
        let b = intern("each");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "each");
    }

    #[test]
    fn different_spelling_differs() {
        assert_ne!(intern("foo"), intern("bar"));
    }
}
