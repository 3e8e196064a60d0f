use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{Table, Tabled};
use zawiyah_lib::types::{AnalyticsSummary, Donation, DonationCampaign, Event, Lesson, User};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format: {} (expected table, json or csv)", other)),
        }
    }
}

#[derive(Tabled, Serialize)]
struct UserRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    #[serde(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    #[serde(rename = "Role")]
    role: String,
    #[tabled(rename = "Joined")]
    #[serde(rename = "Joined")]
    joined: String,
}

#[derive(Tabled, Serialize)]
struct DonationRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Donor")]
    #[serde(rename = "Donor")]
    donor: String,
    #[tabled(rename = "Campaign")]
    #[serde(rename = "Campaign")]
    campaign: String,
    #[tabled(rename = "Amount")]
    #[serde(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Frequency")]
    #[serde(rename = "Frequency")]
    frequency: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Tabled, Serialize)]
struct CampaignRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Goal")]
    #[serde(rename = "Goal")]
    goal: String,
    #[tabled(rename = "Raised")]
    #[serde(rename = "Raised")]
    raised: String,
    #[tabled(rename = "Progress")]
    #[serde(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Tabled, Serialize)]
struct EventRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Starts")]
    #[serde(rename = "Starts")]
    starts: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    #[serde(rename = "Category")]
    category: String,
    #[tabled(rename = "Location")]
    #[serde(rename = "Location")]
    location: String,
    #[tabled(rename = "Seats Left")]
    #[serde(rename = "Seats Left")]
    seats_left: String,
}

#[derive(Tabled, Serialize)]
struct LessonRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Instructor")]
    #[serde(rename = "Instructor")]
    instructor: String,
    #[tabled(rename = "Category")]
    #[serde(rename = "Category")]
    category: String,
    #[tabled(rename = "Level")]
    #[serde(rename = "Level")]
    level: String,
    #[tabled(rename = "Duration")]
    #[serde(rename = "Duration")]
    duration: String,
}

#[derive(Tabled, Serialize)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    #[serde(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

// -- Row builders --

fn build_user_rows(users: &[User]) -> Vec<UserRow> {
    users
        .iter()
        .map(|u| UserRow {
            id: u.id.clone(),
            name: u.full_name(),
            email: u.email.clone(),
            role: label(&u.role),
            joined: format_date(u.created_at),
        })
        .collect()
}

fn build_donation_rows(donations: &[Donation]) -> Vec<DonationRow> {
    donations
        .iter()
        .map(|d| DonationRow {
            id: d.id.clone(),
            date: format_date(d.created_at),
            donor: if d.anonymous {
                "anonymous".to_string()
            } else {
                d.user_id.clone().unwrap_or_else(|| "guest".to_string())
            },
            campaign: d.campaign_id.clone().unwrap_or_else(|| "-".to_string()),
            amount: format!("{} {}", format_amount(d.amount), d.currency),
            frequency: label(&d.frequency),
            status: d.status.to_string(),
        })
        .collect()
}

fn build_campaign_rows(campaigns: &[DonationCampaign]) -> Vec<CampaignRow> {
    campaigns
        .iter()
        .map(|c| CampaignRow {
            id: c.id.clone(),
            title: c.title.clone(),
            goal: format_amount(c.goal_amount),
            raised: format_amount(c.raised_amount),
            progress: format!("{:.1}%", c.progress_percent()),
            status: if c.active { "active" } else { "closed" }.to_string(),
        })
        .collect()
}

fn build_event_rows(events: &[Event]) -> Vec<EventRow> {
    events
        .iter()
        .map(|e| EventRow {
            id: e.id.clone(),
            starts: e.starts_at.format("%Y-%m-%d %H:%M").to_string(),
            title: e.title.clone(),
            category: e.category.clone(),
            location: e.location.clone(),
            seats_left: e
                .seats_left()
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string()),
        })
        .collect()
}

fn build_lesson_rows(lessons: &[Lesson]) -> Vec<LessonRow> {
    lessons
        .iter()
        .map(|l| LessonRow {
            id: l.id.clone(),
            title: l.title.clone(),
            instructor: l.instructor.clone(),
            category: l.category.clone(),
            level: label(&l.level),
            duration: format!("{} min", l.duration_minutes),
        })
        .collect()
}

fn build_metric_rows(summary: &AnalyticsSummary) -> Vec<MetricRow> {
    let metric = |name: &str, value: String| MetricRow {
        metric: name.to_string(),
        value,
    };
    vec![
        metric("Users", summary.total_users.to_string()),
        metric("Donations", summary.total_donations.to_string()),
        metric("Total Raised", format_amount(summary.total_raised)),
        metric("Average Donation", format_amount(summary.average_donation)),
        metric("Active Campaigns", summary.active_campaigns.to_string()),
        metric("Upcoming Events", summary.upcoming_events.to_string()),
        metric("Lessons", summary.total_lessons.to_string()),
    ]
}

// -- Printing --

fn emit<R: Tabled + Serialize, T: Serialize + ?Sized>(
    rows: Vec<R>,
    raw: &T,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => print_json(raw),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

pub fn print_users(users: &[User], format: OutputFormat) -> Result<()> {
    emit(build_user_rows(users), users, format)
}

pub fn print_donations(donations: &[Donation], format: OutputFormat) -> Result<()> {
    emit(build_donation_rows(donations), donations, format)
}

pub fn print_campaigns(campaigns: &[DonationCampaign], format: OutputFormat) -> Result<()> {
    emit(build_campaign_rows(campaigns), campaigns, format)
}

pub fn print_events(events: &[Event], format: OutputFormat) -> Result<()> {
    emit(build_event_rows(events), events, format)
}

pub fn print_lessons(lessons: &[Lesson], format: OutputFormat) -> Result<()> {
    emit(build_lesson_rows(lessons), lessons, format)
}

pub fn print_analytics(summary: &AnalyticsSummary, format: OutputFormat) -> Result<()> {
    emit(build_metric_rows(summary), summary, format)
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Wire name of a serde enum, e.g. `one-time`.
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn format_amount(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn donations() -> Vec<Donation> {
        serde_json::from_value(json!([
            {
                "id": "donation_1",
                "userId": "user_1",
                "campaignId": "campaign_1",
                "amount": 250,
                "frequency": "one-time",
                "status": "completed",
                "createdAt": "2024-03-10T18:20:00.000Z"
            },
            {
                "id": "donation_4",
                "userId": "user_2",
                "amount": 500,
                "currency": "EUR",
                "frequency": "monthly",
                "status": "pending",
                "anonymous": true
            }
        ]))
        .unwrap()
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn format_amount_scales() {
        assert_eq!(format_amount(18_300.0), "$18.3K");
        assert_eq!(format_amount(2_500_000.0), "$2.5M");
        assert_eq!(format_amount(50.0), "$50.00");
        assert_eq!(format_amount(0.0), "$0.00");
    }

    #[test]
    fn donation_rows_mapping() {
        let rows = build_donation_rows(&donations());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date, "2024-03-10");
        assert_eq!(rows[0].donor, "user_1");
        assert_eq!(rows[0].campaign, "campaign_1");
        assert_eq!(rows[0].amount, "$250.00 USD");
        assert_eq!(rows[0].frequency, "one-time");
        assert_eq!(rows[0].status, "completed");

        assert_eq!(rows[1].date, "-");
        assert_eq!(rows[1].donor, "anonymous");
        assert_eq!(rows[1].campaign, "-");
        assert_eq!(rows[1].amount, "$500.00 EUR");
    }

    #[test]
    fn campaign_rows_mapping() {
        let campaigns: Vec<DonationCampaign> = serde_json::from_value(json!([
            { "id": "campaign_1", "title": "Roof", "goalAmount": 50000, "raisedAmount": 18250, "active": true },
            { "id": "campaign_2", "title": "Iftar", "goalAmount": 0, "active": false }
        ]))
        .unwrap();
        let rows = build_campaign_rows(&campaigns);
        assert_eq!(rows[0].goal, "$50.0K");
        assert_eq!(rows[0].progress, "36.5%");
        assert_eq!(rows[0].status, "active");
        assert_eq!(rows[1].progress, "0.0%");
        assert_eq!(rows[1].status, "closed");
    }

    #[test]
    fn event_rows_mapping() {
        let events: Vec<Event> = serde_json::from_value(json!([
            {
                "id": "event_1",
                "title": "Dhikr",
                "category": "spiritual",
                "startsAt": "2030-01-10T19:30:00Z",
                "location": "Main Hall",
                "capacity": 120,
                "registered": 64
            },
            { "id": "event_3", "title": "Tajweed", "startsAt": "2024-02-05T17:00:00Z" }
        ]))
        .unwrap();
        let rows = build_event_rows(&events);
        assert_eq!(rows[0].starts, "2030-01-10 19:30");
        assert_eq!(rows[0].seats_left, "56");
        assert_eq!(rows[1].seats_left, "unlimited");
    }

    #[test]
    fn user_and_lesson_rows_mapping() {
        let users: Vec<User> = serde_json::from_value(json!([
            { "id": "user_2", "email": "v@example.com", "firstName": "Yusuf", "lastName": "Karim", "role": "volunteer" }
        ]))
        .unwrap();
        let rows = build_user_rows(&users);
        assert_eq!(rows[0].name, "Yusuf Karim");
        assert_eq!(rows[0].role, "volunteer");
        assert_eq!(rows[0].joined, "-");

        let lessons: Vec<Lesson> = serde_json::from_value(json!([
            { "id": "lesson_3", "title": "Fiqh of Zakat", "level": "advanced", "durationMinutes": 75 }
        ]))
        .unwrap();
        let rows = build_lesson_rows(&lessons);
        assert_eq!(rows[0].level, "advanced");
        assert_eq!(rows[0].duration, "75 min");
    }

    #[test]
    fn metric_rows_cover_summary() {
        let summary = AnalyticsSummary {
            total_users: 3,
            total_donations: 4,
            total_raised: 800.0,
            average_donation: 200.0,
            active_campaigns: 2,
            upcoming_events: 2,
            total_lessons: 3,
        };
        let rows = build_metric_rows(&summary);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[2].metric, "Total Raised");
        assert_eq!(rows[2].value, "$800.00");
    }

    #[test]
    fn empty_inputs_build_no_rows() {
        assert!(build_user_rows(&[]).is_empty());
        assert!(build_donation_rows(&[]).is_empty());
    }
}
