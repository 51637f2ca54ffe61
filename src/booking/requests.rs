//! Request DTOs for booking endpoints.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::WalletProvider;

fn default_guests() -> i32 {
    1
}

/// Request to price a stay without booking it
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: i32,
}

/// Request to book a property
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: i32,
    pub payment: PaymentRequest,
}

/// Payment input, tagged by `method`
#[derive(Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentRequest {
    CreditCard {
        card_number: String,
        cardholder_name: String,
        expiry_month: i32,
        expiry_year: i32,
        cvv: String,
    },
    DigitalWallet {
        provider: WalletProvider,
        wallet_id: String,
    },
}

/// Review of a completed stay
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub comment: String,
}

// Card data must never reach the logs.
impl std::fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentRequest::CreditCard { cardholder_name, .. } => f
                .debug_struct("CreditCard")
                .field("cardholder_name", cardholder_name)
                .finish_non_exhaustive(),
            PaymentRequest::DigitalWallet { provider, .. } => f
                .debug_struct("DigitalWallet")
                .field("provider", provider)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card_booking() {
        let request: CreateBookingRequest = serde_json::from_str(
            r#"{
                "check_in": "2030-05-01",
                "check_out": "2030-05-04",
                "guests": 2,
                "payment": {
                    "method": "credit_card",
                    "card_number": "4242424242424242",
                    "cardholder_name": "Ana Reyes",
                    "expiry_month": 8,
                    "expiry_year": 2031,
                    "cvv": "123"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(request.guests, 2);
        assert!(matches!(request.payment, PaymentRequest::CreditCard { .. }));
    }

    #[test]
    fn test_parse_wallet_and_default_guests() {
        let request: CreateBookingRequest = serde_json::from_str(
            r#"{
                "check_in": "2030-05-01",
                "check_out": "2030-05-04",
                "payment": { "method": "digital_wallet", "provider": "apple_pay", "wallet_id": "a@b.c" }
            }"#,
        )
        .unwrap();

        assert_eq!(request.guests, 1);
        assert!(matches!(
            request.payment,
            PaymentRequest::DigitalWallet {
                provider: WalletProvider::ApplePay,
                ..
            }
        ));
    }

    #[test]
    fn test_debug_redacts_card() {
        let payment = PaymentRequest::CreditCard {
            card_number: "4242424242424242".to_string(),
            cardholder_name: "Ana Reyes".to_string(),
            expiry_month: 8,
            expiry_year: 2031,
            cvv: "987".to_string(),
        };
        let debug = format!("{:?}", payment);
        assert!(!debug.contains("4242"));
        assert!(!debug.contains("987"));
        assert!(debug.contains("Ana Reyes"));
    }
}
