//! Snake_case -> camelCase path conversion used by the router's optional fallback lookup.

/// Converts `segment` (e.g. `b"get_hello_world"`) to camelCase (`b"getHelloWorld"`).
///
/// Underscores are dropped; the byte following one is upper-cased. A leading
/// underscore has no preceding letter to merge into, so it is simply dropped
/// (`_foo` -> `Foo`), matching how `str::to_case` based implementations behave.
pub(super) fn to_camel(name: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len());
    let mut upper_next = false;

    for &b in name {
        if b == b'_' {
            upper_next = true;
        } else if upper_next {
            out.push(b.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(b);
        }
    }

    out
}

/// Upper-cases the first byte of `name`, leaving the rest untouched.
pub(super) fn to_pascal(name: &[u8]) -> Vec<u8> {
    let mut out = name.to_vec();
    if let Some(first) = out.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    out
}

/// Converts an entire request path (e.g. `b"/api/get_user"`) to camelCase,
/// treating `/` as a segment boundary so an underscore never merges across it.
///
/// Returns `None` if `path` contains no `_`, so callers can skip the fallback
/// lookup entirely when it would be a no-op.
pub(super) fn camelize_path(path: &[u8]) -> Option<Vec<u8>> {
    if !path.contains(&b'_') {
        return None;
    }

    let mut out = Vec::with_capacity(path.len());
    let mut upper_next = false;

    for &b in path {
        match b {
            b'/' => {
                out.push(b);
                upper_next = false;
            }
            b'_' => upper_next = true,
            _ if upper_next => {
                out.push(b.to_ascii_uppercase());
                upper_next = false;
            }
            _ => out.push(b),
        }
    }

    Some(out)
}
