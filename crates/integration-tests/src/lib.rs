//! Cross-crate tests live in `tests/`; shared fixtures in `tests/common`.
