// Rules module - loading the rule tables and running the checks
// - ruleset.rs: typed rule tables and compiled patterns
// - loader.rs: workbook sheets → RuleSet, with row rejections
// - extractor.rs: form section → FormValues
// - format_check.rs, catch_common.rs, spell_check.rs, version_check.rs: the checks
// - engine.rs: CheckEngine, runs the checks in order over one form

pub mod catch_common;
pub mod engine;
pub mod extractor;
pub mod format_check;
pub mod loader;
pub mod ruleset;
pub mod spell_check;
pub mod version_check;

pub use catch_common::catch_common;
pub use engine::{extract_sections, CheckEngine, RunStage, SectionValues};
pub use extractor::{extract_values, split_lines};
pub use format_check::{escape_value, regex_check};
pub use loader::{rule_entry_from_row, RuleSetLoader};
pub use ruleset::{
    CatchPattern, FieldPattern, OverlookPattern, RejectReason, RowRejection, RuleEntry, RuleSet,
    RuleTable, SenderRater,
};
pub use spell_check::{spell_check, tokenize};
pub use version_check::version_check;
