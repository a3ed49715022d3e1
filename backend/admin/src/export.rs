//! CSV export of a raffle's customers.

use raffle_rules::availability;

use crate::errors::{AdminError, Result};
use crate::models::{Purchase, Raffle, Ticket};

const CUSTOMER_HEADER: [&str; 10] = [
    "purchase_id",
    "buyer_name",
    "buyer_email",
    "buyer_phone",
    "buyer_id_number",
    "status",
    "ticket_count",
    "amount",
    "referral",
    "tickets",
];

/// Encode rows of fields with RFC 4180 quoting and CRLF line endings.
///
/// Only fields containing a separator, quote, CR or LF are quoted.
pub fn write_rows<R, F>(rows: impl IntoIterator<Item = R>) -> Result<Vec<u8>>
where
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut out = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    for row in rows {
        out.write_record(row)?;
    }
    out.into_inner()
        .map_err(|e| AdminError::Csv(e.into_error().into()))
}

/// One row per purchase with its ticket numbers space-separated.
///
/// `tickets` may hold tickets of any purchase; rows pick theirs by id.
pub fn customers_csv(raffle: &Raffle, purchases: &[Purchase], tickets: &[Ticket]) -> Result<Vec<u8>> {
    let header = CUSTOMER_HEADER.map(String::from);
    let rows = purchases.iter().map(|purchase| {
        let numbers: Vec<String> = tickets
            .iter()
            .filter(|t| t.purchase_id == Some(purchase.id))
            .map(|t| availability::display_number(t.number, raffle.min_tickets))
            .collect();
        [
            purchase.id.to_string(),
            purchase.buyer_name.clone(),
            purchase.buyer_email.clone(),
            purchase.buyer_phone.clone(),
            purchase.buyer_id_number.clone().unwrap_or_default(),
            purchase.status.to_string(),
            purchase.ticket_count.to_string(),
            purchase.amount.to_string(),
            purchase.referral_code.clone().unwrap_or_default(),
            numbers.join(" "),
        ]
    });
    write_rows(std::iter::once(header).chain(rows))
}
