pub mod otp;
pub mod pricing;
pub mod ranking;
