pub mod item;
pub mod judgment;
pub mod loaders;
pub mod policy;
pub mod record;
pub mod survey_kind;

pub use item::{CandidateItem, ItemKey, NaturalKey, Provenance};
pub use judgment::Judgment;
pub use loaders::{load_all_seed_files, load_seed_file};
pub use policy::{ClaimPolicy, SamplingPolicy};
pub use record::EvaluationRecord;
pub use survey_kind::SurveyKind;
