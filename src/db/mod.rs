pub mod db;
pub mod providerdb;
pub mod taskdb;
pub mod userdb;
pub mod verificationdb;
