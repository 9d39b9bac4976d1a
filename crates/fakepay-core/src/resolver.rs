//! Payment link resolution.
//!
//! Turns a scanned or typed string into a payment intent identifier. Two shapes are
//! recognised:
//!
//! - payment links containing `/pay/<id>` (e.g. `https://shop.example/pay/abc123?src=qr`)
//! - UPI intents (`upi://pay?pa=merchant@fakepay&tr=<id>`), where `tr` carries the id
//!
//! Resolution is pure and total: every input yields either an id or a `ResolveError`.

use crate::PaymentId;

const PAY_SEGMENT: &str = "/pay/";
const UPI_INTENT_PREFIX: &str = "upi://pay";
const TRANSACTION_REF_PARAM: &str = "tr";

/// Reasons a string does not resolve to a payment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Neither a payment link nor a UPI intent.
    #[error("unrecognized payment code")]
    UnrecognizedFormat,

    /// A UPI intent without a `tr` parameter.
    #[error("UPI intent has no transaction reference")]
    MissingTransactionRef,

    /// A payment link with nothing after `/pay/`.
    #[error("payment link has no payment id")]
    MissingPaymentId,

    /// The extracted id contains characters payment ids never use.
    #[error("invalid payment id: {0}")]
    InvalidPaymentId(String),
}

/// Resolve a decoded QR payload or typed link to a payment id.
///
/// # Errors
///
/// See [`ResolveError`].
pub fn resolve_payment_id(input: &str) -> Result<PaymentId, ResolveError> {
    let input = input.trim();

    if let Some(idx) = input.rfind(PAY_SEGMENT) {
        let tail = &input[idx + PAY_SEGMENT.len()..];
        let id = tail.split('?').next().unwrap_or_default();
        return to_payment_id(id, ResolveError::MissingPaymentId);
    }

    if is_upi_intent(input) {
        let url = url::Url::parse(input).map_err(|_| ResolveError::UnrecognizedFormat)?;
        let reference = url
            .query_pairs()
            .find(|(name, _)| name == TRANSACTION_REF_PARAM)
            .map(|(_, value)| value.into_owned())
            .ok_or(ResolveError::MissingTransactionRef)?;
        return to_payment_id(&reference, ResolveError::MissingTransactionRef);
    }

    Err(ResolveError::UnrecognizedFormat)
}

fn is_upi_intent(input: &str) -> bool {
    input
        .get(..UPI_INTENT_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(UPI_INTENT_PREFIX))
}

fn to_payment_id(raw: &str, when_empty: ResolveError) -> Result<PaymentId, ResolveError> {
    if raw.is_empty() {
        return Err(when_empty);
    }
    raw.parse()
        .map_err(|_| ResolveError::InvalidPaymentId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(input: &str) -> String {
        resolve_payment_id(input).unwrap().to_string()
    }

    #[test]
    fn payment_link_with_query() {
        assert_eq!(resolved("https://x/pay/abc123?foo=1"), "abc123");
    }

    #[test]
    fn payment_link_uses_last_pay_segment() {
        assert_eq!(resolved("https://x/pay/old/pay/new_1"), "new_1");
        assert_eq!(resolved("/pay/abc123"), "abc123");
    }

    #[test]
    fn upi_intent_reads_tr() {
        assert_eq!(
            resolved("upi://pay?pa=merchant@fakepay&tr=xyz789"),
            "xyz789"
        );
        assert_eq!(resolved("UPI://pay?tr=xyz789&am=10.00"), "xyz789");
    }

    #[test]
    fn upi_intent_decodes_tr() {
        assert_eq!(resolved("upi://pay?tr=pay%5Fabc"), "pay_abc");
    }

    #[test]
    fn upi_intent_without_tr() {
        assert_eq!(
            resolve_payment_id("upi://pay?pa=merchant@fakepay&am=100"),
            Err(ResolveError::MissingTransactionRef)
        );
        assert_eq!(
            resolve_payment_id("upi://pay?tr="),
            Err(ResolveError::MissingTransactionRef)
        );
    }

    #[test]
    fn unrecognized_input() {
        assert_eq!(
            resolve_payment_id("not a payment string"),
            Err(ResolveError::UnrecognizedFormat)
        );
        assert_eq!(resolve_payment_id(""), Err(ResolveError::UnrecognizedFormat));
    }

    #[test]
    fn empty_or_invalid_link_ids() {
        assert_eq!(
            resolve_payment_id("https://x/pay/?a=1"),
            Err(ResolveError::MissingPaymentId)
        );
        assert!(matches!(
            resolve_payment_id("https://x/pay/a b"),
            Err(ResolveError::InvalidPaymentId(_))
        ));
    }

    #[test]
    fn never_panics_on_odd_input() {
        for input in ["\u{0}", "/pay/", "upi://pay", "upi://pay?", "💸/pay/💸", "upi://pay\u{7f}?tr=a"] {
            let _ = resolve_payment_id(input);
        }
    }
}
