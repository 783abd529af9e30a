pub mod document;
pub mod matrix;
pub mod record;
