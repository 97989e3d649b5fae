pub mod providermodel;
pub mod taskmodel;
pub mod usermodel;
pub mod verificationmodels;
