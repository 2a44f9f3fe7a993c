// OTP delivery seam. SMTP/templating is intentionally out of scope; the
// shipped transport writes the outgoing message to the log so the flows stay
// observable in development. The issuing endpoints also return their token,
// which keeps every flow drivable without a mailbox.

pub fn send_otp_email(to: &str, subject: &str, otp: &str) {
    log::info!("📧 Mail to {} - {} - OTP: {}", to, subject, otp);
}
