//! Typed lifecycle statuses and the order transition table.
//!
//! The database stores statuses as TEXT (constrained by CHECKs); everything
//! above the storage layer goes through these enums so that no call site
//! compares raw strings or invents a transition of its own.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Reserved,
    Paid,
    PickedUp,
    Cancelled,
}

/// Operations that move an order between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Pay,
    Pickup,
    Cancel,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("transition {event:?} is not defined from status {from:?}")]
pub struct UndefinedTransition {
    pub from: OrderStatus,
    pub event: OrderEvent,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Reserved => "RESERVED",
            OrderStatus::Paid => "PAID",
            OrderStatus::PickedUp => "PICKED_UP",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// The complete transition table. Every (status, event) pair not listed
    /// here is rejected.
    pub fn apply(self, event: OrderEvent) -> Result<OrderStatus, UndefinedTransition> {
        use OrderEvent::*;
        use OrderStatus::*;

        match (self, event) {
            (Reserved, Pay) => Ok(Paid),
            (Reserved, Pickup) | (Paid, Pickup) => Ok(PickedUp),
            (Reserved, Cancel) | (Paid, Cancel) => Ok(Cancelled),
            (from, event) => Err(UndefinedTransition { from, event }),
        }
    }

    /// Picked-up and cancelled orders accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::PickedUp | OrderStatus::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVED" => Ok(OrderStatus::Reserved),
            "PAID" => Ok(OrderStatus::Paid),
            "PICKED_UP" => Ok(OrderStatus::PickedUp),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferStatus {
    Active,
    Paused,
    SoldOut,
}

impl OfferStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OfferStatus::Active => "ACTIVE",
            OfferStatus::Paused => "PAUSED",
            OfferStatus::SoldOut => "SOLD_OUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Approved,
    Refused,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Refused => "REFUSED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}
