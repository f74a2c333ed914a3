/// Notification channel for the composed report message.
pub trait ReportSender {
    fn send_raw(
        &self,
        sender: &str,
        recipients: &[String],
        raw_message: &[u8],
    ) -> Result<(), String>;
}
