use rand::Rng;

/// Code the passenger reads out to start a ride, `1000`..=`9999`
pub fn generate_ride_otp() -> String {
    rand::thread_rng().gen_range(1000..10000).to_string()
}

/// Demo login code for phone verification, six digits
pub fn generate_login_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}
