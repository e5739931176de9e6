//! Excel report generation.
//!
//! Renders a ledger snapshot plus the owner's profile into a styled
//! workbook, embedding a scaled copy of each receipt image that still
//! resolves. Per-image failures are contained as an inline marker; any
//! other failure aborts the report without leaving a partial file at the
//! target path.

use anyhow::Context;
use chrono::Local;
use log::{error, info, warn};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::domain::errors::{AppError, Result};
use crate::backend::domain::models::{ExpenseRecord, UserAccount};

/// Longest edge of an embedded receipt image, in pixels.
const MAX_RECEIPT_DIMENSION: f64 = 150.0;

/// Pixel-to-point factor for growing a row under an embedded image.
const PIXELS_TO_POINTS: f64 = 0.75;

const COLUMN_WIDTHS: [f64; 8] = [15.0, 25.0, 25.0, 15.0, 18.0, 12.0, 30.0, 20.0];

const HEADERS: [&str; 8] = [
    "Date",
    "From",
    "To",
    "Transport",
    "Payment Method",
    "Amount (EGP)",
    "Notes",
    "Receipt",
];

const RECEIPT_COLUMN: u16 = 7;

#[derive(Clone, Default)]
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    /// Write the full report to `path`.
    ///
    /// The workbook is staged next to the target and renamed into place on
    /// success, so the caller either gets a complete file or an error and
    /// no file.
    pub fn generate(
        &self,
        path: &Path,
        username: &str,
        account: &UserAccount,
        records: &[ExpenseRecord],
    ) -> Result<()> {
        if records.is_empty() {
            return Err(AppError::validation("there are no expenses to report"));
        }

        info!(
            "📄 REPORT: Writing {} expenses for '{}' to {:?}",
            records.len(),
            username,
            path
        );

        let staging = staging_path(path);
        match self.write_workbook(&staging, account, records) {
            Ok(embedded) => match fs::rename(&staging, path) {
                Ok(()) => {
                    info!(
                        "✅ REPORT: Wrote {:?} ({} of {} receipts embedded)",
                        path,
                        embedded,
                        records.iter().filter(|r| r.has_receipt()).count()
                    );
                    Ok(())
                }
                Err(rename_error) => {
                    let _ = fs::remove_file(&staging);
                    error!("❌ REPORT: Could not move finished report to {:?}", path);
                    Err(AppError::Report(
                        anyhow::Error::new(rename_error)
                            .context("failed to move the finished report into place"),
                    ))
                }
            },
            Err(build_error) => {
                let _ = fs::remove_file(&staging);
                error!("❌ REPORT: Failed to build {:?}: {:#}", path, build_error);
                Err(AppError::Report(build_error))
            }
        }
    }

    fn write_workbook(
        &self,
        path: &Path,
        account: &UserAccount,
        records: &[ExpenseRecord],
    ) -> anyhow::Result<usize> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Expense Report")?;

        for (column, width) in COLUMN_WIDTHS.iter().enumerate() {
            worksheet.set_column_width(column as u16, *width)?;
        }

        // Title band across the whole table.
        let title_format = Format::new()
            .set_bold()
            .set_font_size(16)
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x1F4E78))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.merge_range(0, 0, 0, 7, "Transportation Expense Report", &title_format)?;
        worksheet.set_row_height(0, 30)?;

        // Profile metadata rows.
        let info_label_format = Format::new().set_bold();
        let profile_rows = [
            ("Employee name:", account.name.clone()),
            ("Employee id:", account.employee_id.clone()),
            ("Company:", account.company_name.clone()),
            ("Department:", account.department.clone()),
            (
                "Default payment method:",
                account.payment_method.label().to_string(),
            ),
            (
                "Report generated:",
                Local::now().format("%Y-%m-%d %H:%M").to_string(),
            ),
        ];
        let mut row: u32 = 2;
        for (label, value) in profile_rows {
            worksheet.write_string_with_format(row, 0, label, &info_label_format)?;
            worksheet.write_string(row, 1, value)?;
            row += 1;
        }

        // Header row.
        row += 1;
        let header_format = Format::new()
            .set_bold()
            .set_font_size(11)
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x4472C4))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);
        for (column, header) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(row, column as u16, *header, &header_format)?;
        }
        worksheet.set_row_height(row, 25)?;

        // Data rows, in ledger order, with alternating shading.
        let body_format = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin);
        let shaded_format = body_format
            .clone()
            .set_background_color(Color::RGB(0xE7E6E6));

        let data_start = row + 1;
        let mut current = data_start;
        let mut embedded = 0usize;
        for record in records {
            let format = if (current - data_start) % 2 == 0 {
                &shaded_format
            } else {
                &body_format
            };

            worksheet.write_string_with_format(
                current,
                0,
                record.date.format("%Y-%m-%d").to_string(),
                format,
            )?;
            worksheet.write_string_with_format(current, 1, record.from_location.as_str(), format)?;
            worksheet.write_string_with_format(current, 2, record.to_location.as_str(), format)?;
            worksheet.write_string_with_format(current, 3, record.transport_type.label(), format)?;
            worksheet.write_string_with_format(current, 4, record.payment_method.label(), format)?;
            worksheet.write_number_with_format(current, 5, record.amount, format)?;
            worksheet.write_string_with_format(current, 6, record.notes.as_str(), format)?;

            let marker = match record.receipt_path.as_deref() {
                None => "none",
                Some(receipt) if !receipt.exists() => {
                    warn!(
                        "Receipt for expense {} no longer resolves: {:?}",
                        record.id, receipt
                    );
                    "none"
                }
                Some(receipt) => match self.insert_receipt_image(worksheet, current, receipt) {
                    Ok(scaled_height) => {
                        let row_height = (scaled_height * PIXELS_TO_POINTS + 10.0).max(115.0);
                        worksheet.set_row_height(current, row_height)?;
                        embedded += 1;
                        "attached"
                    }
                    Err(image_error) => {
                        warn!(
                            "Failed to embed receipt {:?} for expense {}: {:#}",
                            receipt, record.id, image_error
                        );
                        "image error"
                    }
                },
            };
            worksheet.write_string_with_format(current, RECEIPT_COLUMN, marker, format)?;

            current += 1;
        }

        // Total band plus signature lines.
        let total_row = current + 1;
        let total_format = Format::new()
            .set_bold()
            .set_font_size(12)
            .set_background_color(Color::RGB(0xFFC000))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);
        worksheet.merge_range(total_row, 0, total_row, 4, "Grand Total", &total_format)?;
        let total: f64 = records.iter().map(|record| record.amount).sum();
        worksheet.write_number_with_format(total_row, 5, total, &total_format)?;

        let signature_row = total_row + 3;
        worksheet.write_string(signature_row, 0, "Employee signature: _____________")?;
        worksheet.write_string(signature_row, 4, "Manager signature: _____________")?;

        workbook
            .save(path)
            .with_context(|| format!("failed to write workbook to {:?}", path))?;
        Ok(embedded)
    }

    /// Embed one receipt image scaled to the pixel cap, anchored at the
    /// row's receipt column. Returns the scaled height in pixels so the
    /// caller can grow the row.
    fn insert_receipt_image(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        path: &Path,
    ) -> anyhow::Result<f64> {
        let image = Image::new(path)
            .with_context(|| format!("could not read image {:?}", path))?;
        let (width, height) = (image.width(), image.height());
        let scale = if width > MAX_RECEIPT_DIMENSION || height > MAX_RECEIPT_DIMENSION {
            (MAX_RECEIPT_DIMENSION / width).min(MAX_RECEIPT_DIMENSION / height)
        } else {
            1.0
        };
        let image = image.set_scale_width(scale).set_scale_height(scale);
        worksheet.insert_image(row, RECEIPT_COLUMN, &image)?;
        Ok(height * scale)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "report.xlsx".into());
    file_name.push(".tmp");
    path.with_file_name(file_name)
}
