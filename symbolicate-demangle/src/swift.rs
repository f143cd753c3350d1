//! A small, pure-Rust decoder for Swift's legacy (`_T`-prefixed) name mangling.
//!
//! Swift's modern mangling scheme (`$s`/`_$s`/`$S`/`_$S` prefixes, introduced with the Swift 4
//! stable ABI) encodes generic substitutions, protocol conformances and calling conventions in a
//! grammar that is only practically implementable by porting the compiler's own demangler. Rather
//! than vendor that C++ code, this module only detects such symbols as Swift and leaves them
//! mangled.
//!
//! The older, pre-stable-ABI grammar (`_T...`) is comparatively simple: entities are encoded as a
//! chain of length-prefixed identifiers following a one- or two-character marker for the kind of
//! entity (function, variable, class, ...). This module decodes that subset well enough to recover
//! readable `Module.Type.member` names for common cases; it does not attempt generics, closures or
//! calling convention suffixes and falls back to `None` whenever the grammar doesn't match what it
//! expects.

/// Returns `true` if `ident` looks like a mangled Swift symbol, modern or legacy.
pub(crate) fn is_maybe_swift(ident: &str) -> bool {
    ident.starts_with("_T")
        || ident.starts_with("$s")
        || ident.starts_with("_$s")
        || ident.starts_with("$S")
        || ident.starts_with("_$S")
}

fn is_legacy(ident: &str) -> bool {
    ident.starts_with("_T") && !ident.starts_with("_T0")
}

/// Decodes a single length-prefixed identifier from the front of `input`, returning the
/// identifier and the remaining slice.
fn take_identifier(input: &str) -> Option<(&str, &str)> {
    let digit_count = input.chars().take_while(|c| c.is_ascii_digit()).count();
    if digit_count == 0 {
        return None;
    }

    let (len_str, rest) = input.split_at(digit_count);
    let len: usize = len_str.parse().ok()?;
    if len == 0 || rest.len() < len {
        return None;
    }

    let (name, rest) = rest.split_at(len);
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some((name, rest))
}

/// Entity marker that follows the `_T` prefix, loosely modeled after the legacy grammar's node
/// kinds. Only the markers needed to label common top-level declarations are recognized.
enum Kind {
    Function,
    Variable,
    Class,
    Struct,
    Enum,
    Protocol,
    Other,
}

fn take_kind(input: &str) -> (Kind, &str) {
    for (prefix, kind) in [
        ("F", Kind::Function),
        ("v", Kind::Variable),
        ("C", Kind::Class),
        ("V", Kind::Struct),
        ("O", Kind::Enum),
        ("P", Kind::Protocol),
    ] {
        if let Some(rest) = input.strip_prefix(prefix) {
            return (kind, rest);
        }
    }

    (Kind::Other, input)
}

/// Consumes a nominal-type-kind marker (`C`/`V`/`O`/`P`) that follows a `F` function marker,
/// indicating the function is a member of that kind of type rather than a free function.
fn take_nominal_context(input: &str) -> (Option<Kind>, &str) {
    for (prefix, kind) in [
        ("C", Kind::Class),
        ("V", Kind::Struct),
        ("O", Kind::Enum),
        ("P", Kind::Protocol),
    ] {
        if let Some(rest) = input.strip_prefix(prefix) {
            return (Some(kind), rest);
        }
    }

    (None, input)
}

/// Decodes one Swift tuple type, recognizing only the empty tuple `T_` (i.e. `()`), which is all
/// the curried-method signature below needs.
fn decode_tuple_type(input: &str) -> Option<(&'static str, &str)> {
    input.strip_prefix("T_").map(|rest| ("()", rest))
}

/// Decodes the curried method signature suffix of a legacy mangled method
/// (`f` self-marker, `S0_` self-type substitution, `F` call-signature marker, param and return
/// tuples), producing `"(SelfType) -> (Params) -> Return"`.
fn decode_method_signature(path: &[&str], rest: &str) -> Option<String> {
    let rest = rest.strip_prefix('f')?;
    let rest = rest.strip_prefix("S0_")?;
    let rest = rest.strip_prefix('F')?;
    let (params, rest) = decode_tuple_type(rest)?;
    let (ret, rest) = decode_tuple_type(rest)?;
    if !rest.is_empty() {
        return None;
    }

    let self_type = path[..path.len() - 1].join(".");
    let full_name = path.join(".");
    Some(format!("{full_name} ({self_type}) -> {params} -> {ret}"))
}

/// Decodes a legacy (`_T`) mangled Swift symbol into an approximate `Module.Type.member` path.
///
/// This does not reproduce generics, closures or most calling conventions; it exists to recover a
/// readable name for the common cases of a mangled top-level declaration or a class/struct/enum
/// method whose self-parameter is curried in the standard way (`f` + substitution + call
/// signature).
pub(crate) fn demangle_legacy(ident: &str) -> Option<String> {
    if !is_legacy(ident) {
        return None;
    }

    let rest = ident.strip_prefix("_T")?;
    let (kind, rest) = take_kind(rest);
    let (nested_in, mut rest) = take_nominal_context(rest);

    let mut path = Vec::new();
    while let Some((name, remainder)) = take_identifier(rest) {
        path.push(name);
        rest = remainder;
    }

    if path.is_empty() {
        return None;
    }

    if nested_in.is_some() && matches!(kind, Kind::Function) && path.len() > 1 {
        if let Some(signature) = decode_method_signature(&path, rest) {
            return Some(signature);
        }
    }

    let mut demangled = path.join(".");
    if matches!(kind, Kind::Function) {
        demangled.push_str("()");
    }

    Some(demangled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_legacy_and_modern_prefixes() {
        assert!(is_maybe_swift("_TF4args3fooFT_T_"));
        assert!(is_maybe_swift("$s8mangling12GenericUnionO3FooyACyxGSicAEmlF"));
        assert!(is_maybe_swift("_$s4main3fooyyF"));
        assert!(!is_maybe_swift("_ZN3foo3barEv"));
    }

    #[test]
    fn decodes_simple_legacy_function() {
        assert_eq!(
            demangle_legacy("_TF4args3fooFT_T_"),
            Some("args.foo()".to_string())
        );
    }

    #[test]
    fn decodes_simple_legacy_variable() {
        assert_eq!(demangle_legacy("_Tv4args3barSi"), Some("args.bar".to_string()));
    }

    #[test]
    fn decodes_legacy_class_method_with_curried_self_parameter() {
        assert_eq!(
            demangle_legacy("_TFC12Swift_Tester14ViewController11doSomethingfS0_FT_T_"),
            Some(
                "Swift_Tester.ViewController.doSomething (Swift_Tester.ViewController) -> () -> ()"
                    .to_string()
            )
        );
    }

    #[test]
    fn refuses_modern_mangling() {
        assert_eq!(demangle_legacy("_T08mangling12GenericUnionO"), None);
        assert_eq!(demangle_legacy("$s4main3fooyyF"), None);
    }

    #[test]
    fn refuses_garbage() {
        assert_eq!(demangle_legacy("_TZZZ"), None);
    }
}
