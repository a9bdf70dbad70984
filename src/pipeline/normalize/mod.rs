pub mod dates;
pub mod experience;
pub mod issues;
pub mod noise;
pub mod qualifications;

pub use dates::*;
pub use experience::*;
pub use issues::*;
pub use noise::*;
pub use qualifications::*;
