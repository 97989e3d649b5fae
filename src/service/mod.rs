pub mod audit_service;
pub mod disclosure;
pub mod engagement_service;
pub mod error;
pub mod escrow_service;
pub mod matching_service;
pub mod notification_service;
pub mod verification_service;
