pub mod session;
pub mod survey_flow;

pub use session::{Response, Session};
pub use survey_flow::{SubmissionReceipt, SurveyFlow};
