// Data models module
// Plain data shared by the generation services and the site

pub mod generation;
pub mod inquiry;
pub mod site;

pub use generation::*;
pub use inquiry::{Budget, InquiryField, InquiryForm};
pub use site::Page;
