pub mod lexicon;
pub mod narrator;
pub mod prompt;
pub mod validator;

pub use narrator::{Narration, Narrator};
pub use validator::{StoryValidator, ValidationFailure};
