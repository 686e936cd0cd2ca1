mod errors;
mod mailer;
mod receipt;
mod sender;

pub use errors::EmailError;
pub use mailer::{
    ReceiptMailer, SendReceiptPayload, SendReceiptResponse, send_product_email_endpoint,
};
pub use receipt::{
    Branding, ReceiptProduct, escape_html, receipt_subject, render_receipt, transaction_reference,
};
pub use sender::{EmailSender, OutgoingEmail, ResendClient, SendOutcome, SharedEmailSender};

#[cfg(test)]
pub use sender::testing;
