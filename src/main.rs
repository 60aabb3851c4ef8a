use clap::Parser;
use mrzscan::models::PassengerRecord;
use mrzscan::utils::MrzError;
use mrzscan::MrzExtractor;
use std::path::{Path, PathBuf};

/// Read passport MRZ data from scanned images.
///
/// Each image is processed independently: a failure on one never stops
/// the rest of the batch. Successful reads are printed and saved as
/// `<image>_mrz.json` next to the input unless --no-json is given.
#[derive(Parser)]
#[command(name = "mrzscan", version)]
struct Args {
    /// Image files to scan (JPEG or PNG, any orientation)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Do not write a JSON file next to each input
    #[arg(long)]
    no_json: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let extractor = MrzExtractor::new();

    let mut failures = 0usize;
    for path in &args.images {
        match extractor.extract(path) {
            Ok(record) => {
                print_record(&record);
                if !args.no_json {
                    if let Err(e) = save_json(path, &record) {
                        eprintln!("Warning: could not save JSON for {}: {}", path.display(), e);
                    }
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if failures == args.images.len() {
        std::process::exit(1);
    }
}

fn print_record(record: &PassengerRecord) {
    println!("\n===============================================");
    println!("  {}", record.source_image);
    println!("===============================================");
    println!("  Name:            {}", record.full_name);
    println!("  Passport:        {}", record.passport_number);
    println!("  Date of birth:   {}", record.dob);
    println!("  Gender:          {}", record.gender);
    println!("  Issuing country: {}", record.issuing_country);
    println!("  Nationality:     {}", record.nationality);
    println!("  Expiry date:     {}", record.expiry_date);
    println!("  Method:          {}", record.method);
}

fn json_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    image.with_file_name(format!("{}_mrz.json", stem))
}

fn save_json(image: &Path, record: &PassengerRecord) -> Result<(), MrzError> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| MrzError::Io(format!("Failed to serialize record: {}", e)))?;
    let path = json_path(image);
    std::fs::write(&path, json)
        .map_err(|e| MrzError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
    println!("  Saved: {}", path.display());
    Ok(())
}
