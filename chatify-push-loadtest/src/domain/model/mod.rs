//! 领域模型

mod identifier;
mod outcome;
mod phrase_corpus;
mod push_request;

pub use identifier::{ALPHANUMERIC, DIGITS, IdentifierFormat};
pub use outcome::{Outcome, OutcomeError, OutcomeErrorKind};
pub use phrase_corpus::{DEFAULT_PHRASES, PhraseCorpus};
pub use push_request::{PushRequest, PushType};
