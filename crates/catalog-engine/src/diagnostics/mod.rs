// Diagnostics module - Invariant checking over a loaded catalog
// Pure: reports conditions the partition engine tolerates but upstream should fix

pub mod validator;

pub use validator::{Diagnostic, DiagnosticKind, Severity, count_by_kind, validate};
