//! Domain models shared by the store, services and routes

pub mod booking;
pub mod dashboard;
pub mod payment;
pub mod property;
pub mod review;

pub use booking::{Booking, BookingStatus, NewBooking, Reservation};
pub use dashboard::{BookingCounts, Dashboard, GuestDashboard, HostDashboard};
pub use payment::{
    CardDetails, NewPayment, Payment, PaymentDetails, PaymentMethod, PaymentStatus,
    WalletDetails, WalletProvider,
};
pub use property::{NewProperty, Property, PropertyChanges, PropertyListing, PropertySearch};
pub use review::{NewReview, Review};
