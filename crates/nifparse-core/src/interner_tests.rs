use crate::{Interner, Symbol};

#[test]
fn intern_deduplicates() {
    let mut interner = Interner::new();

    let a = interner.intern("Header");
    let b = interner.intern("Header");
    let c = interner.intern("Footer");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.len(), 2);
}

#[test]
fn resolve_roundtrip() {
    let mut interner = Interner::new();

    let sym = interner.intern("Num Blocks");
    assert_eq!(interner.resolve(sym), "Num Blocks");
}

#[test]
fn symbols_are_dense_in_insertion_order() {
    let mut interner = Interner::new();

    let a = interner.intern("Version");
    let b = interner.intern("User Version");

    assert_eq!((a.as_u32(), b.as_u32()), (0, 1));
    assert_eq!(interner.len(), 2);
    assert!(!interner.is_empty());
}

#[test]
fn get_finds_only_interned_strings() {
    let mut interner = Interner::new();
    let sym = interner.intern("Block Size");

    assert_eq!(interner.get("Block Size"), Some(sym));
    assert_eq!(interner.get("Block Types"), None);
}

#[test]
fn symbol_ordering_is_insertion_order() {
    let mut interner = Interner::new();

    let z = interner.intern("z");
    let a = interner.intern("a");

    // z was inserted first, so z < a by insertion order
    assert!(z < a);
}

#[test]
fn null_symbol_does_not_resolve() {
    let mut interner = Interner::new();
    interner.intern("x");

    assert!(Symbol::NULL.is_null());
    assert!(!Symbol::from_raw(0).is_null());
    assert_eq!(Symbol::default(), Symbol::NULL);
    assert_eq!(interner.try_resolve(Symbol::NULL), None);
    assert_eq!(format!("{:?}", Symbol::NULL), "Symbol(NULL)");
    assert_eq!(format!("{:?}", Symbol::from_raw(3)), "Symbol(3)");
}

#[test]
fn iter_yields_insertion_order() {
    let mut interner = Interner::new();
    interner.intern("first");
    interner.intern("second");

    let items: Vec<_> = interner.iter().map(|(s, t)| (s.as_u32(), t)).collect();
    assert_eq!(items, vec![(0, "first"), (1, "second")]);
}

#[test]
fn to_asciiz_blob_terminates_each_string() {
    let mut interner = Interner::new();
    interner.intern("id");
    interner.intern("foo");

    assert_eq!(interner.to_asciiz_blob(), b"id\0foo\0");
}

#[test]
fn to_asciiz_blob_empty() {
    let interner = Interner::new();
    assert!(interner.is_empty());
    assert!(interner.to_asciiz_blob().is_empty());
}
