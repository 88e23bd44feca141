use std::sync::{LazyLock, Mutex, PoisonError};

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static STRING_INTERNER: LazyLock<Mutex<StringInterner<DefaultBackend>>> =
    LazyLock::new(|| Mutex::new(StringInterner::default()));

/// An interned name used for parameters, members, methods and record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(DefaultSymbol);

impl Ident {
    pub fn new(s: &str) -> Self {
        Self(
            STRING_INTERNER
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get_or_intern(s),
        )
    }

    pub fn as_str(&self) -> String {
        self.resolve_with(str::to_string)
    }

    pub fn resolve_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = STRING_INTERNER.lock().unwrap_or_else(PoisonError::into_inner);
        f(interner.resolve(self.0).unwrap_or_default())
    }
}

impl Default for Ident {
    fn default() -> Self {
        Ident::new("")
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.resolve_with(|s| write!(f, "{}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_new_and_as_str() {
        let ident = Ident::new("counter");
        assert_eq!(ident.as_str(), "counter");
    }

    #[test]
    fn test_ident_interning_is_stable() {
        let ident1: Ident = "x".into();
        let ident2: Ident = String::from("x").into();
        assert_eq!(ident1, ident2);
        assert_ne!(ident1, Ident::new("y"));
    }

    #[test]
    fn test_ident_display_trait() {
        let ident = Ident::new("op_Addition");
        assert_eq!(format!("{}", ident), "op_Addition");
    }
}
