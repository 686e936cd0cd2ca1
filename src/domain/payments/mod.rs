mod errors;
mod gateway;
mod processor;

pub use errors::PaymentError;
pub use gateway::{
    Charge, ChargeRequest, CulqiGateway, PaymentGateway, SUCCESSFUL_SALE, SharedGateway,
    minor_units,
};
pub use processor::{
    PaymentProcessor, PaymentReceipt, ProcessPaymentRequest, ProcessPaymentResponse,
    process_payment_endpoint,
};

#[cfg(test)]
pub use gateway::testing;
