//! HDF5 library error taxonomy.
//!
//! Every failure reported by the native library belongs to one major error family
//! ([ErrorKind]). A [LibraryError] carries that kind together with the diagnostic message, and,
//! for errors raised by [native] calls, the native error stack they were classified from.
//!
//! # Reference
//! HDF5 Reference Manual, Error Handling (H5E) Interface.
//!
mod classify;
mod error;
mod kind;
mod library;

pub mod config;
pub mod native;

pub use classify::*;
pub use error::*;
pub use kind::*;
pub use library::*;
