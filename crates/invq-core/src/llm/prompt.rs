//! Prompt templates for field extraction and invoice questions.

use crate::models::invoice::fields::{self, item};

/// Build the prompt that turns one page of invoice text into JSON fields.
pub fn extraction_prompt(page_text: &str) -> String {
    let scalar_fields = [
        (fields::INVOICE_NUMBER, ""),
        (fields::COMPANY_NAME, " (seller)"),
        (fields::SELLER_ADDRESS, ""),
        (fields::SELLER_GSTIN, ""),
        (fields::BUYER_NAME, ""),
        (fields::BUYER_ADDRESS, ""),
        (fields::BUYER_GSTIN, ""),
        (fields::ITEMS, " (list of line items, see below)"),
        (fields::SUBTOTAL_BEFORE_GST, ""),
        (fields::CGST, ""),
        (fields::SGST, ""),
        (fields::TOTAL_GST, " (sum of CGST and SGST, or IGST)"),
        (fields::TOTAL_AMOUNT_AFTER_GST, ""),
        (fields::BANK_DETAILS, ""),
    ];
    let item_fields = [
        item::SERIAL,
        item::DESCRIPTION,
        item::HSN_CODE,
        item::QUANTITY,
        item::UNIT,
        item::LIST_PRICE,
        item::DISCOUNT,
        item::PRICE,
        item::AMOUNT,
    ];

    let mut prompt = String::new();
    prompt.push_str("You are a financial document assistant.\n");
    prompt.push_str("Below is the raw text of one page of an invoice document:\n\n");
    prompt.push_str(page_text.trim());
    prompt.push_str("\n\nExtract the following fields:\n");
    for (name, hint) in scalar_fields {
        prompt.push_str(&format!("- {}{}\n", name, hint));
    }
    prompt.push_str("\nEach line item is an object with the keys: ");
    prompt.push_str(
        &item_fields
            .iter()
            .map(|k| format!("\"{}\"", k))
            .collect::<Vec<_>>()
            .join(", "),
    );
    prompt.push_str(".\n\n");
    prompt.push_str(
        "Leave out any field that does not appear on this page instead of returning null.\n\
         If the page only continues a table of line items, return a JSON array of those items.\n\
         Otherwise return a single JSON object.\n\
         Reply with exactly one ```json fenced block and nothing else.\n",
    );
    prompt
}

/// Persona used when answering questions about an invoice.
pub const ACCOUNTANT_PERSONA: &str = "You are an expert Chartered Accountant with deep knowledge of Indian tax laws. \
You will receive invoice data from different firms, companies and organizations. \
Analyze the provided JSON data and answer user questions accurately, as per Indian financial and tax rules.\n\
Treat 'date', 'dated', 'dates', 'Date' and 'Dated' as the same word.";

/// Build the prompt that answers `question` about the invoice in `invoice_json`.
pub fn question_prompt(invoice_json: &str, question: &str) -> String {
    format!(
        "{persona}\n\n\
         You are provided with JSON invoice data delimited by triple backticks.\n\
         ```{invoice}```\n\n\
         Answer the following question:\n\
         ```{question}```\n\n\
         Your answer should be plain readable text, not JSON.\n",
        persona = ACCOUNTANT_PERSONA,
        invoice = invoice_json,
        question = question.trim(),
    )
}
