//! # Briefbot Tools
//!
//! External adapter implementations for Briefbot.
//! Provides SerpAPI web search and genpdf report rendering.

pub mod pdf_generate;
pub mod web;

pub use pdf_generate::GenPdfRenderer;
pub use web::SerpApiSearch;
