//! Pagination loop and the end-to-end export run
use crate::config::ExportConfig;
use crate::error::Result;
use crate::output::CsvExport;
use audittrail_api::{AuditEvent, AuditEventQuery, AuditTrailClient, PageResult};
use log::{debug, info};
use std::path::PathBuf;

/// Totals of one pagination run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationSummary {
    /// Requests issued
    pub pages: usize,
    /// Events received across all pages
    pub events: usize,
}

/// Result of a completed export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Where the CSV was written
    pub path: PathBuf,
    pub pages: usize,
    pub events: usize,
}

/// Fetch every page of `query`, handing each one to `on_page` in server order.
///
/// Starts at offset 0 and stops after the first page that is empty or shorter
/// than the page size. Pages are requested one at a time.
///
/// # Errors
///
/// Returns the first request error, or the first error returned by `on_page`.
/// No further pages are requested after an error.
pub async fn paginate<F>(
    client: &AuditTrailClient,
    query: &AuditEventQuery,
    mut on_page: F,
) -> Result<PaginationSummary>
where
    F: FnMut(PageResult) -> Result<()>,
{
    let limit = client.config().page_size;
    let mut summary = PaginationSummary::default();
    let mut offset = 0;

    loop {
        debug!("Requesting audit events at offset {offset}");
        let page = client.fetch_page(query, offset).await?;
        summary.pages += 1;
        summary.events += page.events.len();

        info!(
            "Offset: {}, Limit: {}, Events received: {}",
            page.offset,
            limit,
            page.events.len()
        );

        let next_offset = page.next_offset;
        let last = page.is_last();
        on_page(page)?;

        match next_offset {
            Some(next) if !last => offset = next,
            _ => break,
        }
    }

    Ok(summary)
}

/// Fetch every matching event into memory, in server order
///
/// # Errors
///
/// Returns the first request error.
pub async fn collect_events(
    client: &AuditTrailClient,
    query: &AuditEventQuery,
) -> Result<Vec<AuditEvent>> {
    let mut events = Vec::new();
    paginate(client, query, |page| {
        events.extend(page.events);
        Ok(())
    })
    .await?;
    Ok(events)
}

/// Run one export: query every page and write the rows to the configured CSV.
///
/// Rows are streamed to a temporary file page by page; the destination only
/// appears once the last page has been written.
///
/// # Errors
///
/// Returns `ExportError::Request` if any page fails, `ExportError::Io` or
/// `ExportError::Csv` if the file cannot be written.
pub async fn run_export(config: ExportConfig) -> Result<ExportSummary> {
    let (client_config, query, output) = config.into_client_config()?;
    let client = AuditTrailClient::new(client_config)?;
    info!("Querying {}", client.endpoint());

    let mut csv = CsvExport::create(&output)?;
    let totals = paginate(&client, &query, |page| csv.write_events(&page.events)).await?;
    let path = csv.finish()?;

    info!(
        "Export complete: {} events in {} page(s)",
        totals.events, totals.pages
    );

    Ok(ExportSummary {
        path,
        pages: totals.pages,
        events: totals.events,
    })
}
