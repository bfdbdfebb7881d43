use chrono::{Local, NaiveDate};
use clap::Subcommand;
use pomocycle_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Stats for one local day
    Date {
        /// Day in YYYY-MM-DD form
        date: NaiveDate,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    let date = match action {
        StatsAction::Today => Local::now().date_naive(),
        StatsAction::Date { date } => date,
    };
    let stats = db.load_statistics(date)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
