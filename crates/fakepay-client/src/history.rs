//! Day grouping and labels for the history screen.

use chrono::{DateTime, NaiveDate, TimeZone};

use fakepay_core::{format_minor_units, TxnStatus};

use crate::session::Session;
use crate::types::TransactionView;

/// Which way the money moved, from the session's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The session paid.
    Sent,
    /// The session was paid.
    Received,
}

/// One history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Transaction ID.
    pub txn_id: String,
    /// Sent or received.
    pub direction: Direction,
    /// The other side's address.
    pub counterparty: String,
    /// Signed rupee amount, e.g. `-₹50.00`.
    pub amount: String,
    /// Transaction status.
    pub status: TxnStatus,
    /// e.g. `Today, 02:05 pm` or `12 Mar 2026, 09:30 am`.
    pub time_label: String,
}

/// Rows that share a calendar day, newest day first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    /// The day in the display time zone.
    pub date: NaiveDate,
    /// `Today`, `Yesterday` or e.g. `12 Mar 2026`.
    pub label: String,
    /// Rows in the order received.
    pub entries: Vec<HistoryEntry>,
}

/// Group newest-first `transactions` by day in the time zone of `now`.
pub fn group_by_day<Tz: TimeZone>(
    transactions: &[TransactionView],
    session: &Session,
    now: &DateTime<Tz>,
) -> Vec<DayGroup> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut groups: Vec<DayGroup> = Vec::new();

    for txn in transactions {
        let local = txn.created_at.with_timezone(&tz);
        let date = local.date_naive();
        let day = day_label(date, today);
        let entry = HistoryEntry {
            txn_id: txn.txn_id.clone(),
            direction: direction(txn, session),
            counterparty: counterparty(txn, session).to_string(),
            amount: signed_amount(txn, session),
            status: txn.status,
            time_label: format!("{day}, {}", local.naive_local().format("%I:%M %P")),
        };

        match groups.last_mut() {
            Some(group) if group.date == date => group.entries.push(entry),
            _ => groups.push(DayGroup {
                date,
                label: day,
                entries: vec![entry],
            }),
        }
    }

    groups
}

fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%-d %b %Y").to_string()
    }
}

fn direction(txn: &TransactionView, session: &Session) -> Direction {
    if session.owns(&txn.payer_vpa) {
        Direction::Sent
    } else {
        Direction::Received
    }
}

fn counterparty<'a>(txn: &'a TransactionView, session: &Session) -> &'a str {
    match direction(txn, session) {
        Direction::Sent => &txn.payee_vpa,
        Direction::Received => &txn.payer_vpa,
    }
}

fn signed_amount(txn: &TransactionView, session: &Session) -> String {
    let sign = match direction(txn, session) {
        Direction::Sent => '-',
        Direction::Received => '+',
    };
    format!("{sign}₹{}", format_minor_units(txn.amount))
}
