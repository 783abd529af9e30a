pub mod corpus;
pub mod embedding;
pub mod grouping;
pub mod matrix;
pub mod openai;
pub mod query;
