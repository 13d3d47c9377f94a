//! Inclusion and exclusion rules applied while walking catalogs.
//!
//! - [`patterns`]: select/skip regular expressions on dataset names, IDs and catalogRef titles
//! - [`dates`]: `before`/`after` bounds on a dataset's modified date
//!
//! Patterns use unanchored search semantics: a pattern matches when it matches anywhere in
//! the candidate string. Anchor explicitly (`^...$`) for whole-string matches.

pub mod dates;
pub mod patterns;
