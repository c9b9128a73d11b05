pub mod administration;
pub mod alert;
pub mod assessment;
pub mod enums;
pub mod medication;

pub use administration::*;
pub use alert::*;
pub use assessment::*;
pub use medication::*;
