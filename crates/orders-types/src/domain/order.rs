use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_ADDRESS_LEN: usize = 300;
pub const MAX_COMMENTS_LEN: usize = 500;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("order must contain at least one item")]
    NoItems,
    #[error("item {index}: main_colours must not be empty")]
    NoColours { index: usize },
    #[error("item {index}: colour labels must not be blank")]
    BlankColour { index: usize },
    #[error("item {index}: comments exceed {MAX_COMMENTS_LEN} characters")]
    CommentsTooLong { index: usize },
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("buyer_email is not a valid address")]
    InvalidEmail,
    #[error("amount must be a positive number of minor units")]
    NonPositiveAmount,
    #[error("currency must be a three-letter ISO code, got {0:?}")]
    InvalidCurrency(String),
    #[error("unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Settlement state reported by the payment processor. `Completed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Incomplete,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Incomplete => "Incomplete",
            PaymentStatus::Completed => "Completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Incomplete" => Ok(PaymentStatus::Incomplete),
            "Completed" => Ok(PaymentStatus::Completed),
            other => Err(ValidationError::UnknownVariant {
                kind: "payment_status",
                value: other.to_string(),
            }),
        }
    }
}

/// Fulfilment progress, driven by staff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrderStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::NotStarted => "Not Started",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
        }
    }

    /// True when moving from `self` to `target` goes backwards in the fulfilment flow.
    pub fn is_regression_to(&self, target: OrderStatus) -> bool {
        target < *self
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Started" => Ok(OrderStatus::NotStarted),
            "In Progress" => Ok(OrderStatus::InProgress),
            "Completed" => Ok(OrderStatus::Completed),
            other => Err(ValidationError::UnknownVariant {
                kind: "order_status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ItemSize {
    S,
    M,
    L,
}

/// Item as submitted by a client, before ids and timestamps are assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewItem {
    pub main_colours: Vec<String>,
    pub size: ItemSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub item_id: Uuid,
    pub main_colours: Vec<String>,
    pub size: ItemSize,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client-supplied order contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<NewItem>,
    pub buyer_full_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub delivery_address: String,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.main_colours.is_empty() {
                return Err(ValidationError::NoColours { index });
            }
            if item.main_colours.iter().any(|c| c.trim().is_empty()) {
                return Err(ValidationError::BlankColour { index });
            }
            if let Some(comments) = &item.comments {
                if comments.chars().count() > MAX_COMMENTS_LEN {
                    return Err(ValidationError::CommentsTooLong { index });
                }
            }
        }
        check_len("buyer_full_name", &self.buyer_full_name, 1, MAX_NAME_LEN)?;
        check_len("buyer_email", &self.buyer_email, 3, MAX_EMAIL_LEN)?;
        if !self.buyer_email.contains('@') {
            return Err(ValidationError::InvalidEmail);
        }
        check_len("buyer_phone", &self.buyer_phone, 1, MAX_PHONE_LEN)?;
        check_len("delivery_address", &self.delivery_address, 1, MAX_ADDRESS_LEN)?;
        Ok(())
    }
}

fn check_len(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub order_id: Uuid,
    pub items: Vec<Item>,
    pub buyer_full_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub delivery_address: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validates the submission and builds a fresh order with generated ids.
    pub fn new(input: NewOrder) -> Result<Self, ValidationError> {
        input.validate()?;
        let now = Utc::now();
        let items = input
            .items
            .into_iter()
            .map(|it| Item {
                item_id: Uuid::new_v4(),
                main_colours: it.main_colours,
                size: it.size,
                comments: it.comments,
                created_at: now,
            })
            .collect();
        Ok(Self {
            order_id: Uuid::new_v4(),
            items,
            buyer_full_name: input.buyer_full_name.trim().to_string(),
            buyer_email: input.buyer_email.trim().to_string(),
            buyer_phone: input.buyer_phone.trim().to_string(),
            delivery_address: input.delivery_address.trim().to_string(),
            payment_status: PaymentStatus::Incomplete,
            order_status: OrderStatus::NotStarted,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
        self.updated_at = Utc::now();
    }

    pub fn set_order_status(&mut self, status: OrderStatus) {
        self.order_status = status;
        self.updated_at = Utc::now();
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }
}
