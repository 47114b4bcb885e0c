// src/document/mod.rs
pub mod assembly;
pub mod html;
pub mod layout;
pub mod typst;

pub use assembly::{DocumentAssembly, DocumentRenderer, GeneratedDocument, TypstRenderer};
