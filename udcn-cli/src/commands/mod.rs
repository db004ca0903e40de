pub mod demo;
pub mod interest;
pub mod publish;
