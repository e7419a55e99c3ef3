// src/services/pdf_export.rs
//! PDF export. `build_report` lays out the tables as plain strings so the
//! content can be checked without parsing PDF; `render` only places text.

use log::info;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::calculator::{CalculatorRequest, TickerOutcome};
use super::view::{format_money, format_number, format_percent};
use crate::models::YearRecord;
use crate::BoxError;

pub const FILENAME: &str = "dividend_calculator_results.pdf";

pub const TABLE_HEADERS: [&str; 8] = [
    "Year",
    "Shares Owned (Start)",
    "Stock Price (Start)",
    "Annual Div Per Share",
    "Dividends Received (Year)",
    "Reinvested Shares (Year)",
    "Shares Owned (End)",
    "Portfolio Value (End)",
];

pub type TableRow = [String; 8];

#[derive(Debug, Clone)]
pub enum Section {
    Table { title: String, rows: Vec<TableRow> },
    Notice(String),
}

#[derive(Debug, Clone)]
pub struct PdfReport {
    pub title: String,
    pub summary: Vec<String>,
    pub sections: Vec<Section>,
}

fn year_row(r: &YearRecord) -> TableRow {
    [
        r.year.to_string(),
        format_number(r.shares_start),
        format_money(r.stock_price_start),
        format_money(r.annual_dividend_per_share),
        format_money(r.dividends_received),
        format_number(r.shares_reinvested),
        format_number(r.shares_end),
        format_money(r.portfolio_value_end),
    ]
}

/// Starting position before any growth, built from the form inputs rather than the engine.
fn year_zero_row(request: &CalculatorRequest, effective_price: f64) -> TableRow {
    let p = &request.params;
    let shares = if p.initial_share_price > 0.0 {
        p.initial_investment / p.initial_share_price
    } else {
        0.0
    };
    [
        "0".to_string(),
        format_number(shares),
        format_money(p.initial_share_price),
        format_money(effective_price * (p.dividend_yield_percent / 100.0)),
        format_money(0.0),
        format_number(0.0),
        format_number(shares),
        format_money(p.initial_investment),
    ]
}

pub fn build_report(request: &CalculatorRequest, outcomes: &[TickerOutcome]) -> PdfReport {
    let p = &request.params;
    let summary = vec![
        format!("Initial Investment: {}", format_money(p.initial_investment)),
        format!("Investment Duration: {} Years", p.investment_years),
        format!("DRIP Enabled: {}", if p.drip_enabled { "Yes" } else { "No" }),
        format!("Default Initial Share Price (if API fails): {}", format_money(p.initial_share_price)),
        format!("Default Dividend Yield (if API fails): {}", format_percent(p.dividend_yield_percent)),
        format!(
            "Default Annual Dividend Growth Rate (if API fails): {}",
            format_percent(p.dividend_growth_rate_percent)
        ),
        format!("Annual Stock Price Growth Rate: {}", format_percent(p.stock_growth_rate_percent)),
        format!("Payout Frequency: {}", p.payout_frequency.label()),
    ];

    let sections = outcomes
        .iter()
        .map(|outcome| match outcome {
            TickerOutcome::Simulated(result) => {
                let mut rows = Vec::with_capacity(result.yearly_breakdown.len() + 1);
                rows.push(year_zero_row(request, result.inputs.price.value));
                rows.extend(result.yearly_breakdown.iter().map(year_row));
                Section::Table {
                    title: format!("Results for {}", result.ticker),
                    rows,
                }
            }
            TickerOutcome::Failed { ticker, error, .. } => Section::Notice(format!("Error for {}: {}", ticker, error)),
        })
        .collect();

    PdfReport {
        title: "Dividend Reinvestment Plan (DRIP) Calculator Results".to_string(),
        summary,
        sections,
    }
}

// Landscape US letter.
const PAGE_WIDTH: f32 = 279.4;
const PAGE_HEIGHT: f32 = 215.9;
const MARGIN: f32 = 12.7;
const ROW_HEIGHT: f32 = 5.0;

fn pdf_error(e: printpdf::Error) -> BoxError {
    format!("PDF generation failed: {:?}", e).into()
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl<'a> Cursor<'a> {
    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages += 1;
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", self.pages));
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        let height = size * 0.55;
        self.ensure_space(height);
        self.y -= height;
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
    }

    fn table_row(&mut self, cells: &[String], font: &IndirectFontRef) {
        let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / cells.len() as f32;
        self.ensure_space(ROW_HEIGHT);
        self.y -= ROW_HEIGHT;
        for (i, cell) in cells.iter().enumerate() {
            self.layer
                .use_text(cell.as_str(), 7.0, Mm(MARGIN + i as f32 * col_width + 1.0), Mm(self.y), font);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }
}

pub fn render(report: &PdfReport) -> Result<Vec<u8>, BoxError> {
    let (doc, page, layer) = PdfDocument::new(&report.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    let mut cursor = Cursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
        pages: 1,
    };

    cursor.line(&report.title, 18.0, &fonts.bold);
    cursor.gap(5.0);
    for line in &report.summary {
        cursor.line(line, 10.0, &fonts.regular);
    }
    cursor.gap(5.0);

    let headers: Vec<String> = TABLE_HEADERS.iter().map(|h| h.to_string()).collect();
    for section in &report.sections {
        match section {
            Section::Table { title, rows } => {
                cursor.line(title, 14.0, &fonts.bold);
                cursor.gap(2.0);
                cursor.table_row(&headers, &fonts.bold);
                for row in rows {
                    cursor.table_row(row, &fonts.regular);
                }
                cursor.gap(8.0);
            }
            Section::Notice(text) => {
                cursor.line(text, 11.0, &fonts.bold);
                cursor.gap(3.0);
            }
        }
    }

    let pages = cursor.pages;
    drop(cursor);
    let bytes = doc.save_to_bytes().map_err(pdf_error)?;
    info!("Rendered PDF export: {} sections, {} pages, {} bytes", report.sections.len(), pages, bytes.len());
    Ok(bytes)
}
