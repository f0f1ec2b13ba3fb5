//! Consistency checks on a merged invoice.

use rust_decimal::Decimal;

use super::amounts::parse_amount;
use crate::models::invoice::{fields, MergedInvoice};

/// Difference tolerated between a stated total and the computed one.
const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Validate a merged invoice and return any issues found.
///
/// Issues are warnings: an invoice with issues is still a usable result.
pub fn validate(invoice: &MergedInvoice) -> Vec<String> {
    let mut issues = Vec::new();

    if invoice.text(fields::INVOICE_NUMBER).is_none() {
        issues.push("Missing invoice number".to_string());
    }

    if invoice.text(fields::COMPANY_NAME).is_none() {
        issues.push("Missing seller name".to_string());
    }

    if invoice.text(fields::BUYER_NAME).is_none() {
        issues.push("Missing buyer name".to_string());
    }

    if invoice.items().is_empty() {
        issues.push("No line items".to_string());
    }

    if amount(invoice, fields::TOTAL_AMOUNT_AFTER_GST).is_none() {
        issues.push("Missing total amount after GST".to_string());
    }

    // Validate line item totals
    if let Some(subtotal) = amount(invoice, fields::SUBTOTAL_BEFORE_GST) {
        let item_amounts: Vec<Decimal> = invoice
            .items()
            .iter()
            .filter_map(|item| item.get(fields::item::AMOUNT).and_then(parse_amount))
            .collect();

        if !item_amounts.is_empty() {
            let calculated = item_amounts
                .iter()
                .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(*a));
            match calculated.and_then(|c| exceeds_tolerance(c, subtotal).map(|d| (c, d))) {
                Some((_, false)) => {}
                Some((calculated, true)) => issues.push(format!(
                    "Line item total ({}) differs from subtotal before GST ({})",
                    calculated, subtotal
                )),
                None => issues.push("Line item amounts too large to check".to_string()),
            }
        }
    }

    if let (Some(cgst), Some(sgst), Some(total_gst)) = (
        amount(invoice, fields::CGST),
        amount(invoice, fields::SGST),
        amount(invoice, fields::TOTAL_GST),
    ) {
        let sum = cgst.checked_add(sgst);
        match sum.and_then(|sum| exceeds_tolerance(sum, total_gst).map(|d| (sum, d))) {
            Some((_, false)) => {}
            Some((sum, true)) => issues.push(format!(
                "CGST + SGST ({}) differs from total GST ({})",
                sum, total_gst
            )),
            None => issues.push("GST amounts too large to check".to_string()),
        }
    }

    issues
}

/// Whether `a` and `b` differ by more than the tolerance; `None` on overflow.
fn exceeds_tolerance(a: Decimal, b: Decimal) -> Option<bool> {
    Some(a.checked_sub(b)?.abs() > TOLERANCE)
}

fn amount(invoice: &MergedInvoice, key: &str) -> Option<Decimal> {
    invoice.get(key).and_then(parse_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn invoice(value: Value) -> MergedInvoice {
        let Value::Object(map) = value else {
            panic!("test invoice must be an object");
        };
        MergedInvoice::from_map(map)
    }

    #[test]
    fn test_consistent_invoice_has_no_issues() {
        let inv = invoice(json!({
            "invoice_number": "GST/24/001",
            "company_name": "Acme Traders",
            "buyer_name": "Globex",
            "items": [{"amount": "1,000.00"}, {"amount": 500}],
            "subtotal_before_gst": 1500,
            "cgst": 135,
            "sgst": "135.00",
            "total_gst": 270,
            "total_amount_after_gst": "1,770.00"
        }));
        assert_eq!(validate(&inv), Vec::<String>::new());
    }

    #[test]
    fn test_missing_fields_reported() {
        let inv = invoice(json!({"items": []}));
        assert_eq!(
            validate(&inv),
            vec![
                "Missing invoice number",
                "Missing seller name",
                "Missing buyer name",
                "No line items",
                "Missing total amount after GST",
            ]
        );
    }

    #[test]
    fn test_mismatched_totals_reported() {
        let inv = invoice(json!({
            "invoice_number": "1",
            "company_name": "A",
            "buyer_name": "B",
            "items": [{"amount": 100}],
            "subtotal_before_gst": 150,
            "cgst": 9,
            "sgst": 9,
            "total_gst": 20,
            "total_amount_after_gst": 170
        }));
        let issues = validate(&inv);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].starts_with("Line item total (100)"));
        assert!(issues[1].starts_with("CGST + SGST (18)"));
    }

    #[test]
    fn test_rounding_within_tolerance() {
        let inv = invoice(json!({
            "invoice_number": "1",
            "company_name": "A",
            "buyer_name": "B",
            "items": [{"amount": 33.33}, {"amount": 33.33}, {"amount": 33.33}],
            "subtotal_before_gst": 100,
            "total_amount_after_gst": 118
        }));
        assert!(validate(&inv).is_empty());
    }

    #[test]
    fn test_huge_amounts_reported_not_panicking() {
        let max = "79228162514264337593543950335";
        let inv = invoice(json!({
            "invoice_number": "1",
            "company_name": "A",
            "buyer_name": "B",
            "items": [{"amount": max}, {"amount": max}],
            "subtotal_before_gst": 1,
            "cgst": max,
            "sgst": max,
            "total_gst": 1,
            "total_amount_after_gst": 1
        }));
        assert_eq!(
            validate(&inv),
            vec!["Line item amounts too large to check", "GST amounts too large to check"]
        );
    }

    #[test]
    fn test_annotated_total_is_not_missing() {
        let inv = invoice(json!({
            "invoice_number": "1",
            "company_name": "A",
            "buyer_name": "B",
            "items": [{"amount": 1500}],
            "subtotal_before_gst": 1500,
            "cgst": "9% = 135.00",
            "sgst": "9% = 135.00",
            "total_gst": 270,
            "total_amount_after_gst": "Rs. 1,770.00 only."
        }));
        assert!(validate(&inv).is_empty());
    }
}
