use std::io::Write;

use crate::cli::OutputFormat;
use crate::core::dataset::Dataset;

/// Render datasets in the requested format
///
/// # Errors
///
/// Returns an error if writing fails or JSON serialization fails.
pub fn write_datasets(
    out: &mut dyn Write,
    datasets: &[Dataset],
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => write_text(out, datasets, verbose)?,
        OutputFormat::Json => write_json(out, datasets)?,
        OutputFormat::Tsv => write_tsv(out, datasets)?,
    }
    out.flush()?;
    Ok(())
}

fn format_size(size_mb: Option<f64>) -> String {
    size_mb.map_or_else(|| "unknown".to_string(), |mb| format!("{mb:.3} MB"))
}

fn write_text(out: &mut dyn Write, datasets: &[Dataset], verbose: bool) -> std::io::Result<()> {
    for dataset in datasets {
        writeln!(out, "{} ({})", dataset.id, dataset.name)?;
        writeln!(out, "  Catalog:  {}", dataset.catalog_url)?;
        writeln!(out, "  Size:     {}", format_size(dataset.size_mb))?;
        if let Some(modified) = dataset.modified {
            writeln!(out, "  Modified: {}", modified.to_rfc3339())?;
        }
        if verbose {
            if let Some(declared) = dataset.declared_size_mb {
                writeln!(out, "  Declared: {declared:.3} MB")?;
            }
        }
        for service in &dataset.services {
            writeln!(
                out,
                "  {:<12} {:<8} {}",
                service.service_type, service.name, service.url
            )?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{} dataset(s)", datasets.len())
}

fn write_json(out: &mut dyn Write, datasets: &[Dataset]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, datasets)?;
    writeln!(out)?;
    Ok(())
}

/// One row per service; datasets without services get a single row with empty
/// service columns
fn write_tsv(out: &mut dyn Write, datasets: &[Dataset]) -> std::io::Result<()> {
    writeln!(
        out,
        "id\tname\tcatalog_url\tsize_mb\tmodified\tservice_name\tservice_type\turl"
    )?;
    for dataset in datasets {
        let size = dataset
            .size_mb
            .map(|mb| format!("{mb:.6}"))
            .unwrap_or_default();
        let modified = dataset
            .modified
            .map(|m| m.to_rfc3339())
            .unwrap_or_default();
        let prefix = format!(
            "{}\t{}\t{}\t{}\t{}",
            dataset.id, dataset.name, dataset.catalog_url, size, modified
        );
        if dataset.services.is_empty() {
            writeln!(out, "{prefix}\t\t\t")?;
        }
        for service in &dataset.services {
            writeln!(
                out,
                "{prefix}\t{}\t{}\t{}",
                service.name, service.service_type, service.url
            )?;
        }
    }
    Ok(())
}
