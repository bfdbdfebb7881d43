use chrono::NaiveDate;
use clap::Subcommand;
use pomocycle_core::Database;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List saved records, newest first
    List {
        /// Only records finished on this local day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Maximum number of records to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete every saved record
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { date, limit } => {
            let mut records = match date {
                Some(date) => db.records_on(date)?,
                None => db.all_records()?,
            };
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        HistoryAction::Clear => {
            let deleted = db.clear()?;
            println!("deleted {deleted} records");
        }
    }
    Ok(())
}
