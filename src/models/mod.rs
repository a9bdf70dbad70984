pub mod applicant;
pub mod enums;
pub mod fields;
pub mod report;

pub use applicant::*;
pub use enums::*;
pub use fields::*;
pub use report::*;
