pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod macro_expansion;
pub mod methods;
pub mod object;

pub use builtins::Builtins;
pub use environment::Environment;
pub use error::{ErrorKind, EvaluationError, Location, RunError};
pub use evaluator::Evaluator;
pub use loader::{MemoryLoader, NoLoader, SourceLoader};
pub use object::Object;
