//! Invoice and payment receipt PDFs.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ COMPANY NAME                 FACTURA          │
//! │ RNC · address · phone        No. FAC-000042   │
//! ├───────────────────────────────────────────────┤
//! │ Fecha · Cliente · RNC · Vendedor              │
//! ├──────┬──────────────────┬─────┬───────┬───────┤
//! │ Cod. │ Descripcion      │ Cant│ P.Unit│ Valor │   invoices
//! ├──────┴──────────────────┴─────┴───────┴───────┤
//! │                           Subtotal     200.00 │
//! │                  ITBIS 18% (agregado)   36.00 │
//! │                           Total        236.00 │
//! │                           Pendiente    236.00 │
//! ├───────────────────────────────────────────────┤
//! │ Factura │ Efectivo │ Tarjeta │ ... │ Total    │   receipts
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Fonts are read from disk on every render; a missing family is reported
//! as [`ApiError::Unavailable`].

use std::path::PathBuf;

use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Alignment, Document, Element, Margins, SimplePageDecorator};
use tracing::warn;

use orderdesk_core::{
    Client, Money, PaymentMethod, PaymentReference, Settings, TaxMode, Transaction,
    TransactionDetail, TransactionKind,
};

use crate::error::ApiError;

/// Everything printed on one document.
#[derive(Debug, Clone)]
pub struct DocumentData {
    pub settings: Settings,
    pub detail: TransactionDetail,
    pub client: Client,
    pub vendor_name: String,
    /// Control numbers of the invoices a receipt pays, parallel to
    /// `detail.references`.
    pub invoice_numbers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PdfRenderer {
    fonts_dir: PathBuf,
    family: String,
}

impl PdfRenderer {
    pub fn new(fonts_dir: impl Into<PathBuf>, family: impl Into<String>) -> Self {
        PdfRenderer {
            fonts_dir: fonts_dir.into(),
            family: family.into(),
        }
    }

    pub fn render(&self, data: &DocumentData) -> Result<Vec<u8>, ApiError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.family, None)
            .map_err(|e| {
                warn!(
                    fonts_dir = %self.fonts_dir.display(),
                    family = %self.family,
                    error = %e,
                    "PDF fonts not available"
                );
                ApiError::Unavailable("PDF fonts are not installed on the server".to_string())
            })?;

        let transaction = &data.detail.transaction;
        let mut doc = Document::new(font_family);
        doc.set_title(format!("{} {}", document_title(transaction.kind), transaction.control_number));

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(Margins::trbl(15, 15, 15, 15));
        doc.set_page_decorator(decorator);

        doc.push(header(data)?);
        doc.push(Break::new(1.0));
        doc.push(party_block(data)?);
        doc.push(Break::new(1.0));

        match transaction.kind {
            TransactionKind::Invoice => {
                doc.push(line_table(data)?);
                doc.push(Break::new(1.0));
                doc.push(totals_block(&data.settings, transaction)?);
            }
            TransactionKind::Payment => {
                doc.push(allocation_table(data)?);
                doc.push(Break::new(1.0));
                doc.push(paragraph_right(
                    &format!("Total recibido: {}", amount(&data.settings, transaction.total())),
                    bold(),
                ));
            }
        }

        if let Some(notes) = transaction.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            doc.push(Break::new(1.0));
            doc.push(Paragraph::new(format!("Notas: {notes}")).styled(small()));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| ApiError::Internal(format!("Failed to render PDF: {}", e)))?;

        Ok(buffer)
    }
}

// =============================================================================
// Sections
// =============================================================================

fn header(data: &DocumentData) -> Result<TableLayout, ApiError> {
    let settings = &data.settings;
    let transaction = &data.detail.transaction;

    let mut company = LinearLayout::vertical();
    company.push(Paragraph::new(settings.company_name.as_str()).styled(title()));
    if let Some(rnc) = non_empty(&settings.rnc) {
        company.push(Paragraph::new(format!("RNC: {rnc}")).styled(normal()));
    }
    if let Some(address) = non_empty(&settings.address) {
        company.push(Paragraph::new(address).styled(normal()));
    }
    if let Some(phone) = non_empty(&settings.phone) {
        company.push(Paragraph::new(format!("Tel: {phone}")).styled(normal()));
    }

    let mut document = LinearLayout::vertical();
    document.push(
        Paragraph::new(document_title(transaction.kind))
            .aligned(Alignment::Right)
            .styled(title()),
    );
    document.push(paragraph_right(&format!("No. {}", transaction.control_number), bold()));

    let mut table = TableLayout::new(vec![3, 2]);
    table
        .row()
        .element(company.padded(Margins::trbl(2, 3, 2, 3)))
        .element(document.padded(Margins::trbl(2, 3, 2, 3)))
        .push()
        .map_err(table_error)?;

    Ok(table)
}

fn party_block(data: &DocumentData) -> Result<TableLayout, ApiError> {
    let transaction = &data.detail.transaction;

    let mut table = TableLayout::new(vec![1, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    table
        .row()
        .element(cell(&format!("Fecha: {}", transaction.created_at.format("%d/%m/%Y %H:%M")), normal()))
        .element(cell(&format!("Vendedor: {}", data.vendor_name), normal()))
        .push()
        .map_err(table_error)?;
    table
        .row()
        .element(cell(&format!("Cliente: {}", data.client.name), bold()))
        .element(cell(
            &format!("RNC: {}", non_empty(&data.client.rnc).unwrap_or("-")),
            normal(),
        ))
        .push()
        .map_err(table_error)?;

    Ok(table)
}

fn line_table(data: &DocumentData) -> Result<TableLayout, ApiError> {
    let settings = &data.settings;

    let mut table = TableLayout::new(vec![2, 6, 1, 2, 2]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    table
        .row()
        .element(cell("Codigo", small_bold()))
        .element(cell("Descripcion", small_bold()))
        .element(cell_right("Cant.", small_bold()))
        .element(cell_right("P. Unit.", small_bold()))
        .element(cell_right("Valor", small_bold()))
        .push()
        .map_err(table_error)?;

    for line in &data.detail.lines {
        table
            .row()
            .element(cell(&line.code_snapshot, small()))
            .element(cell(&line.name_snapshot, small()))
            .element(cell_right(&line.quantity.to_string(), small()))
            .element(cell_right(&amount(settings, line.unit_price()), small()))
            .element(cell_right(&amount(settings, line.line_total()), small()))
            .push()
            .map_err(table_error)?;
    }

    Ok(table)
}

fn totals_block(settings: &Settings, transaction: &Transaction) -> Result<TableLayout, ApiError> {
    let config = transaction.tax_config();
    let tax_label = format!("ITBIS {} ({})", config.rate, mode_label(config.mode));

    let rows = [
        ("Subtotal".to_string(), transaction.subtotal_cents, normal()),
        (tax_label, transaction.tax_cents, normal()),
        ("Total".to_string(), transaction.total_cents, bold()),
        ("Pendiente".to_string(), transaction.pending_cents, normal()),
    ];

    let mut table = TableLayout::new(vec![6, 2, 2]);
    for (label, cents, style) in rows {
        table
            .row()
            .element(Paragraph::new(""))
            .element(cell(&label, style))
            .element(cell_right(&amount(settings, Money::from_cents(cents)), style))
            .push()
            .map_err(table_error)?;
    }

    Ok(table)
}

fn allocation_table(data: &DocumentData) -> Result<TableLayout, ApiError> {
    let settings = &data.settings;

    let mut widths = vec![3];
    widths.extend(PaymentMethod::ALL.iter().map(|_| 2));
    widths.push(2);

    let mut table = TableLayout::new(widths);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut head = table.row().element(cell("Factura", small_bold()));
    for method in PaymentMethod::ALL {
        head = head.element(cell_right(method_label(method), small_bold()));
    }
    head.element(cell_right("Total", small_bold()))
        .push()
        .map_err(table_error)?;

    for (index, reference) in data.detail.references.iter().enumerate() {
        let invoice = data
            .invoice_numbers
            .get(index)
            .map(String::as_str)
            .unwrap_or(reference.invoice_id.as_str());
        allocation_row(&mut table, settings, invoice, reference)?;
    }

    Ok(table)
}

fn allocation_row(
    table: &mut TableLayout,
    settings: &Settings,
    invoice: &str,
    reference: &PaymentReference,
) -> Result<(), ApiError> {
    let allocation = reference.allocation();

    let mut row = table.row().element(cell(invoice, small()));
    for method in PaymentMethod::ALL {
        row = row.element(cell_right(&amount(settings, allocation.amount(method)), small()));
    }
    row.element(cell_right(&amount(settings, allocation.total()), small_bold()))
        .push()
        .map_err(table_error)
}

// =============================================================================
// Formatting helpers
// =============================================================================

pub fn document_title(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Invoice => "FACTURA",
        TransactionKind::Payment => "RECIBO DE PAGO",
    }
}

fn mode_label(mode: TaxMode) -> &'static str {
    match mode {
        TaxMode::Additive => "agregado",
        TaxMode::Inclusive => "incluido",
    }
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Efectivo",
        PaymentMethod::Card => "Tarjeta",
        PaymentMethod::Transfer => "Transferencia",
        PaymentMethod::Check => "Cheque",
    }
}

/// `RD$ 1234.50` style amount with the configured symbol.
pub fn amount(settings: &Settings, money: Money) -> String {
    let symbol = settings.currency_symbol.trim();
    if symbol.is_empty() {
        money.to_string()
    } else {
        format!("{symbol} {money}")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn table_error(e: genpdf::error::Error) -> ApiError {
    ApiError::Internal(format!("Failed to lay out PDF table: {}", e))
}

fn cell(text: &str, style: Style) -> impl Element {
    Paragraph::new(text).styled(style).padded(Margins::trbl(1, 1, 1, 2))
}

fn cell_right(text: &str, style: Style) -> impl Element {
    Paragraph::new(text)
        .aligned(Alignment::Right)
        .styled(style)
        .padded(Margins::trbl(1, 2, 1, 1))
}

fn paragraph_right(text: &str, style: Style) -> impl Element {
    Paragraph::new(text).aligned(Alignment::Right).styled(style)
}

fn title() -> Style {
    Style::new().with_font_size(14).bold()
}

fn bold() -> Style {
    Style::new().with_font_size(10).bold()
}

fn normal() -> Style {
    Style::new().with_font_size(9)
}

fn small() -> Style {
    Style::new().with_font_size(8)
}

fn small_bold() -> Style {
    Style::new().with_font_size(8).bold()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk_core::{TaxMode, TransactionStatus};

    fn data() -> DocumentData {
        let now = Utc::now();
        DocumentData {
            settings: Settings::default(),
            detail: TransactionDetail {
                transaction: Transaction {
                    id: "t1".to_string(),
                    control_number: "FAC-000001".to_string(),
                    kind: TransactionKind::Invoice,
                    client_id: "c1".to_string(),
                    vendor_id: "V001".to_string(),
                    subtotal_cents: 20_000,
                    tax_cents: 3_600,
                    total_cents: 23_600,
                    pending_cents: 23_600,
                    status: TransactionStatus::Pending,
                    tax_mode: TaxMode::Additive,
                    tax_rate_bps: 1_800,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                },
                lines: Vec::new(),
                references: Vec::new(),
            },
            client: Client {
                id: "c1".to_string(),
                name: "Colmado Don Pedro".to_string(),
                rnc: None,
                address: None,
                phone: None,
                credit_cents: 0,
                debit_cents: 23_600,
                created_at: now,
                updated_at: now,
            },
            vendor_name: "Juan Perez".to_string(),
            invoice_numbers: Vec::new(),
        }
    }

    #[test]
    fn test_missing_fonts_is_unavailable() {
        let renderer = PdfRenderer::new("/nonexistent/fonts", "LiberationSans");
        assert!(matches!(renderer.render(&data()), Err(ApiError::Unavailable(_))));
    }

    #[test]
    fn test_amount_uses_currency_symbol() {
        let mut settings = Settings::default();
        assert_eq!(amount(&settings, Money::from_cents(11_000)), "RD$ 110.00");

        settings.currency_symbol = String::new();
        assert_eq!(amount(&settings, Money::from_cents(11_000)), "110.00");
    }

    #[test]
    fn test_document_titles() {
        assert_eq!(document_title(TransactionKind::Invoice), "FACTURA");
        assert_eq!(document_title(TransactionKind::Payment), "RECIBO DE PAGO");
    }
}
