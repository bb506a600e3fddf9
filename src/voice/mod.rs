//! Voice description and prompt interpretation
//!
//! Natural-language voice descriptions are normalized into a
//! `VoiceSpec` whose fields always carry defined values, with preset
//! designs resolvable by name.

pub mod prompt;
pub mod spec;

pub use prompt::PromptInterpreter;
pub use spec::{Accent, AgeRange, Gender, Pace, PersonalityTag, Timbre, VoicePresets, VoiceSpec};
