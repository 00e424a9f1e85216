//! # System Interaction Layer
//!
//! The boundary between resolution logic and the operating system.
//!
//! - **`executor`**: runs rendered commands through the platform shell, raw programs and
//!   the platform opener, in the foreground or detached, or only prints them in dry-run
//!   mode.

pub mod executor;
