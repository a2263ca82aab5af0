pub mod request_assembler;
pub mod sample_generator;
pub mod spec_loader;
