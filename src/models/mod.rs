pub mod assignment;
pub mod form;
pub mod loaders;
pub mod question;

pub use assignment::{AssignmentSet, Permutation, SessionizedAssignment};
pub use form::{Form, FormKind};
pub use loaders::{load_catalog, load_or_empty};
pub use question::{CompositeQuestionList, Question, QuestionAttributes};
