//! Mock payment models
//!
//! Payments are recorded, never settled. Only the last four card digits are
//! persisted; the full number and CVV are validated and dropped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DigitalWallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletProvider {
    Paypal,
    ApplePay,
    Gcash,
}

impl WalletProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            WalletProvider::Paypal => "paypal",
            WalletProvider::ApplePay => "apple_pay",
            WalletProvider::Gcash => "gcash",
        }
    }
}

/// Payment from the payments table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored card sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardDetails {
    pub cardholder_name: String,
    pub last_four: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
}

/// Stored wallet sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletDetails {
    pub provider: WalletProvider,
    pub wallet_id: String,
}

/// Method-specific payment sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentDetails {
    CreditCard(CardDetails),
    DigitalWallet(WalletDetails),
}

impl PaymentDetails {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::CreditCard(_) => PaymentMethod::CreditCard,
            PaymentDetails::DigitalWallet(_) => PaymentMethod::DigitalWallet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    pub currency: String,
    pub details: PaymentDetails,
}
