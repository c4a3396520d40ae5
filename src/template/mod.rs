// file: src/template/mod.rs
// version: 1.0.0
// guid: 79609da1-00c5-42d4-bbf3-463ef7b37509

//! Template rendering for provisioning artifacts and shell directives

pub mod renderer;

pub use renderer::TemplateRenderer;
