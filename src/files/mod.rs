// src/files/mod.rs

//! Reading source trees into buffers and writing buffers back out.
//!
//! - [`resolver`] expands glob patterns into ordered [`FileBuffer`]s.
//! - [`writer`] persists buffers under a destination directory and
//!   implements `clean`.
//!
//! [`FileBuffer`]: crate::types::FileBuffer

pub mod resolver;
pub mod writer;

pub use resolver::{glob_base, normalize_pattern, resolve};
pub use writer::{clean, write};
