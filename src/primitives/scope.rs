//! Scope strings and the widening check applied on refresh.
//!
//! Scopes travel as comma-separated token lists, the format consumed and
//! produced by this server. A grant fulfills a request if the requested
//! list introduces no token absent from the granted one; a refresh request
//! is never allowed to widen the originally granted scope.
use std::collections::HashSet;

/// Iterate over the individual tokens of a scope string.
///
/// Empty segments, as produced by leading, trailing or doubled commas, are
/// dropped.
pub fn tokens(scope: &str) -> impl Iterator<Item = &str> {
    scope.split(',').filter(|token| !token.is_empty())
}

/// Whether `requested` asks for any token not present in `granted`.
///
/// The refresh handler uses this to reject scope widening: a `true` result
/// means the request must be denied.
pub fn has_extra(granted: &str, requested: &str) -> bool {
    let granted: HashSet<&str> = tokens(granted).collect();
    tokens(requested).any(|token| !granted.contains(token))
}
