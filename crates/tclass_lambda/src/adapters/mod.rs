pub mod credentials;
pub mod mailer;
pub mod results;
