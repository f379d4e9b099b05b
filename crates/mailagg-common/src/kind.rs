/// Coarse error classification shared by every crate's error type.
///
/// Each crate-local error implements `kind()` returning one of these so the
/// web crate can map any propagated error to the right HTTP status without
/// knowing the concrete error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced entity does not exist.
    NotFound,
    /// Operation would violate a uniqueness or state invariant.
    Conflict,
    /// Caller-supplied input failed validation.
    Invalid,
    /// Failure is expected to be transient (network, upstream 5xx/429, timeout).
    Transient,
    /// Caller is not authenticated or not authorized.
    AuthFailure,
    /// Unexpected internal failure; should not normally reach a caller.
    Fatal,
}
