use almanac_calendar::{input::parse_date, Calendar, EventDraft, EventSelector};
use almanac_core::config::AlmanacConfig;
use almanac_scheduler::{Clock, EventRecord, RegistryHandle, SystemClock};
use almanac_store::open_store;
use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgGroup, Args};

#[derive(Args)]
pub struct AddArgs {
    /// Day of the event, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Time of the event, HH:MM
    #[arg(long)]
    pub time: String,
    /// Minutes before the event to remind, 0 for none
    #[arg(long, default_value = "30")]
    pub remind: String,
    #[arg(long, default_value = "General")]
    pub category: String,
    /// Event description
    #[arg(required = true, trailing_var_arg = true)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Day to show, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Print portable records as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["index", "id"])))]
pub struct DeleteArgs {
    #[arg(long)]
    pub date: String,
    /// Position in `list` output
    #[arg(long)]
    pub index: Option<usize>,
    #[arg(long)]
    pub id: Option<String>,
}

fn open_calendar(config: &AlmanacConfig) -> anyhow::Result<Calendar> {
    let store = open_store(&config.storage).context("opening event store")?;
    Ok(Calendar::open(store, RegistryHandle::default(), &config.categories)?)
}

fn resolve_date(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    match raw {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(SystemClock.now().date()),
    }
}

pub fn add(config: &AlmanacConfig, args: AddArgs) -> anyhow::Result<()> {
    let date = resolve_date(args.date.as_deref())?;
    let draft = EventDraft {
        text: args.text.join(" "),
        date: date.format("%Y-%m-%d").to_string(),
        time: args.time,
        lead_minutes: args.remind,
        category: args.category,
    };

    let mut calendar = open_calendar(config)?;
    let event = calendar.create(&draft, SystemClock.now())?;
    println!("Event added successfully!");
    println!("{}", format_event(None, &event));
    Ok(())
}

pub fn list(config: &AlmanacConfig, args: ListArgs) -> anyhow::Result<()> {
    let date = resolve_date(args.date.as_deref())?;
    let calendar = open_calendar(config)?;
    let events = calendar.events_on(date);

    if args.json {
        let records: Vec<_> = events.iter().map(|e| e.to_portable()).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No events scheduled for {date}.");
        return Ok(());
    }
    for (i, event) in events.iter().enumerate() {
        println!("{}", format_event(Some(i), event));
    }
    Ok(())
}

pub fn delete(config: &AlmanacConfig, args: DeleteArgs) -> anyhow::Result<()> {
    let date = parse_date(&args.date)?;
    let selector = match (args.index, args.id) {
        (Some(i), _) => EventSelector::Index(i),
        (None, Some(id)) => EventSelector::Id(id.into()),
        (None, None) => anyhow::bail!("Please select an event to delete."),
    };

    let mut calendar = open_calendar(config)?;
    if calendar.events_on(date).is_empty() {
        println!("No events to delete on {date}.");
        return Ok(());
    }
    match calendar.delete(date, &selector)? {
        Some(event) => println!("Deleted: {}", format_event(None, &event)),
        None => println!("Nothing selected: no such event on {date}."),
    }
    Ok(())
}

pub fn categories(config: &AlmanacConfig) -> anyhow::Result<()> {
    for c in &config.categories {
        println!("{c}");
    }
    Ok(())
}

pub fn format_event(index: Option<usize>, event: &EventRecord) -> String {
    let reminder = match event.lead_minutes() {
        0 => "no reminder".to_string(),
        n => format!("reminder {n} min before"),
    };
    let prefix = index.map(|i| format!("[{i}] ")).unwrap_or_default();
    format!(
        "{prefix}{}  {}  ({}, {})  id={}",
        event.datetime().format("%H:%M"),
        event.text(),
        event.category(),
        reminder,
        event.id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_core::Category;

    fn event(lead: u32) -> EventRecord {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        EventRecord::create("Dentist", dt, lead, Category::Personal, Some("e1".into()))
    }

    #[test]
    fn formats_with_index_and_reminder() {
        assert_eq!(
            format_event(Some(2), &event(30)),
            "[2] 10:00  Dentist  (Personal, reminder 30 min before)  id=e1"
        );
    }

    #[test]
    fn formats_without_reminder() {
        assert_eq!(
            format_event(None, &event(0)),
            "10:00  Dentist  (Personal, no reminder)  id=e1"
        );
    }

    #[test]
    fn resolve_date_parses_or_defaults() {
        assert_eq!(
            resolve_date(Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(resolve_date(Some("2024-02-30")).is_err());
        assert!(resolve_date(None).is_ok());
    }
}
