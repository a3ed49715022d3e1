//! Records as stored in / read from the database.
//!
//! Each record maps onto the snapshot types of `raffle_rules` where a rule
//! needs to see it.

use chrono::{DateTime, Utc};
use raffle_rules::{
    Currency, PurchaseSnapshot, PurchaseStatus, RaffleStatus, Role, Settings, TicketSnapshot,
    TicketStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::db::{decimal, optional_timestamp, text_enum, timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raffle {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub currency: Currency,
    /// Size of the ticket universe; tickets are numbered `1..=min_tickets`.
    pub min_tickets: i64,
    pub status: RaffleStatus,
    pub winning_ticket_number: Option<i64>,
    pub limit_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for Raffle {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Raffle {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            price: decimal(row, "price")?,
            currency: text_enum(row, "currency")?,
            min_tickets: row.try_get("min_tickets")?,
            status: text_enum(row, "status")?,
            winning_ticket_number: row.try_get("winning_ticket_number")?,
            limit_date: optional_timestamp(row, "limit_date")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub raffle_id: i64,
    pub number: i64,
    pub status: TicketStatus,
    pub reserved_until: Option<DateTime<Utc>>,
    pub purchase_id: Option<i64>,
    /// Only the buyer who made the reservation knows this.
    #[serde(skip_serializing, default)]
    pub reservation_token: Option<String>,
}

impl Ticket {
    pub fn snapshot(&self) -> TicketSnapshot {
        TicketSnapshot {
            number: self.number,
            status: self.status,
            reserved_until: self.reserved_until,
        }
    }
}

impl FromRow<'_, SqliteRow> for Ticket {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Ticket {
            id: row.try_get("id")?,
            raffle_id: row.try_get("raffle_id")?,
            number: row.try_get("number")?,
            status: text_enum(row, "status")?,
            reserved_until: optional_timestamp(row, "reserved_until")?,
            purchase_id: row.try_get("purchase_id")?,
            reservation_token: row.try_get("reservation_token")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub raffle_id: i64,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub buyer_id_number: Option<String>,
    pub payment_method_id: Option<i64>,
    pub payment_reference: Option<String>,
    pub payment_proof_url: Option<String>,
    pub ticket_count: u32,
    pub amount: Decimal,
    pub status: PurchaseStatus,
    pub rejection_reason: Option<String>,
    pub rejection_comment: Option<String>,
    pub referral_code: Option<String>,
    pub referral_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn snapshot(&self) -> PurchaseSnapshot {
        PurchaseSnapshot {
            status: self.status,
            referral_code: self.referral_code.clone(),
            referral_name: self.referral_name.clone(),
            buyer_email: self.buyer_email.clone(),
            ticket_count: self.ticket_count,
            amount: self.amount,
        }
    }
}

impl FromRow<'_, SqliteRow> for Purchase {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Purchase {
            id: row.try_get("id")?,
            raffle_id: row.try_get("raffle_id")?,
            buyer_name: row.try_get("buyer_name")?,
            buyer_email: row.try_get("buyer_email")?,
            buyer_phone: row.try_get("buyer_phone")?,
            buyer_id_number: row.try_get("buyer_id_number")?,
            payment_method_id: row.try_get("payment_method_id")?,
            payment_reference: row.try_get("payment_reference")?,
            payment_proof_url: row.try_get("payment_proof_url")?,
            ticket_count: row.try_get("ticket_count")?,
            amount: decimal(row, "amount")?,
            status: text_enum(row, "status")?,
            rejection_reason: row.try_get("rejection_reason")?,
            rejection_comment: row.try_get("rejection_comment")?,
            referral_code: row.try_get("referral_code")?,
            referral_name: row.try_get("referral_name")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralLink {
    pub id: i64,
    /// Campaign or seller name shown on reports.
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for ReferralLink {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ReferralLink {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            created_at: timestamp(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    pub details: String,
    pub currency: Currency,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for PaymentMethod {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(PaymentMethod {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            details: row.try_get("details")?,
            currency: text_enum(row, "currency")?,
            active: row.try_get("active")?,
            created_at: timestamp(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl raffle_rules::HasRole for User {
    fn role(&self) -> Role {
        self.role
    }
}

impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: text_enum(row, "role")?,
            created_at: timestamp(row, "created_at")?,
        })
    }
}

/// Reads the single settings row into the rules' configuration snapshot.
pub struct SettingsRow(pub Settings);

impl FromRow<'_, SqliteRow> for SettingsRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SettingsRow(Settings {
            commission_rate: decimal(row, "commission_rate")?,
            exchange_rate: decimal(row, "exchange_rate")?,
        }))
    }
}
