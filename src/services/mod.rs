pub mod assignment_generator;
pub mod publication;
pub mod question_merger;
pub mod result_writer;
pub mod session_assembler;

pub use assignment_generator::AssignmentGenerator;
pub use publication::PublicationClient;
pub use question_merger::{synthesize, MergeOmission, Synthesis};
pub use result_writer::ResultWriter;
pub use session_assembler::SessionAssembler;
