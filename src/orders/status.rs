//! Order Status
//!
//! The delivery lifecycle and the delays used to simulate it.

use std::{fmt, str::FromStr};

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an order is in its delivery lifecycle.
///
/// Variants are declared in lifecycle order, so `<` means "earlier".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed and acknowledged
    #[serde(rename = "Order Confirmed", alias = "Confirmed")]
    Confirmed,

    /// Being prepared for shipment
    Processing,

    /// Shipped
    #[serde(rename = "In Transit", alias = "InTransit")]
    InTransit,

    /// Handed to the customer
    Delivered,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Confirmed,
        Self::Processing,
        Self::InTransit,
        Self::Delivered,
    ];

    /// The persisted, human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "Order Confirmed",
            Self::Processing => "Processing",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
        }
    }

    /// The history description recorded when an order reaches this status.
    pub fn description(self) -> &'static str {
        match self {
            Self::Confirmed => "Your order has been confirmed and is being prepared",
            Self::Processing => "Your order is being processed and prepared for shipment",
            Self::InTransit => "Your order has been shipped and is on its way",
            Self::Delivered => "Your order has been delivered successfully",
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        self == Self::Delivered
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a status label is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalised.as_str() {
            "confirmed" | "orderconfirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "intransit" | "shipped" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// One entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Status reached
    pub status: OrderStatus,

    /// When it was reached
    #[serde(rename = "date", alias = "timestamp")]
    pub at: Timestamp,

    /// Human-readable description
    pub description: String,
}

impl StatusEntry {
    /// An entry carrying the status's standard description.
    pub fn standard(status: OrderStatus, at: Timestamp) -> Self {
        Self {
            status,
            at,
            description: status.description().to_string(),
        }
    }
}

/// Delays, relative to order creation, after which each later status is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSchedule {
    steps: Vec<(OrderStatus, SignedDuration)>,
}

impl StatusSchedule {
    /// Creates a schedule from `(status, delay)` steps.
    ///
    /// Steps are kept in delay order; ties keep their given order.
    pub fn new(steps: impl Into<Vec<(OrderStatus, SignedDuration)>>) -> Self {
        let mut steps = steps.into();

        steps.sort_by_key(|&(_, delay)| delay);

        Self { steps }
    }

    /// Steps in delay order.
    pub fn steps(&self) -> &[(OrderStatus, SignedDuration)] {
        &self.steps
    }
}

impl Default for StatusSchedule {
    /// Processing after two minutes, in transit after five, delivered after ten.
    fn default() -> Self {
        Self::new([
            (OrderStatus::Processing, SignedDuration::from_mins(2)),
            (OrderStatus::InTransit, SignedDuration::from_mins(5)),
            (OrderStatus::Delivered, SignedDuration::from_mins(10)),
        ])
    }
}
