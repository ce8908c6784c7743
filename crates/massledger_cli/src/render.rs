//! Human-readable rendering of command results.

use massledger_core::{
    DailyRecord, DashboardView, FulfillmentEvent, ImportReport, Intention, IntentionKind,
};
use std::fmt::Write;

pub fn intention(intention: &Intention) -> String {
    let state = match &intention.kind {
        IntentionKind::Periodic(state) => match state.fulfilled_on {
            Some(date) => format!("periodic {:02}/{} fulfilled {date}", state.month, state.year),
            None => format!("periodic {:02}/{} pending", state.month, state.year),
        },
        IntentionKind::FixedDate(state) => {
            let mut line = format!("fixed-date {}", state.original_date);
            if let Some(moved) = state.rescheduled_date {
                let _ = write!(line, " (moved to {moved})");
            }
            line.push_str(if state.fulfilled { " fulfilled" } else { " pending" });
            line
        }
        IntentionKind::Bulk(state) => format!(
            "bulk {}/{} left{}",
            state.remaining,
            state.total,
            if state.paused { " paused" } else { "" }
        ),
    };
    format!("{}  {}  [{state}]", intention.id, intention.title)
}

pub fn intentions(items: &[Intention]) -> String {
    if items.is_empty() {
        return "No intentions.".to_string();
    }
    items.iter().map(intention).collect::<Vec<_>>().join("\n")
}

pub fn event(event: &FulfillmentEvent) -> String {
    if event.notes.is_empty() {
        format!("{}  {}  intention {}", event.date, event.id, event.intention_id)
    } else {
        format!(
            "{}  {}  intention {}  {}",
            event.date, event.id, event.intention_id, event.notes
        )
    }
}

pub fn events(items: &[FulfillmentEvent]) -> String {
    if items.is_empty() {
        return "No fulfillment events.".to_string();
    }
    items.iter().map(event).collect::<Vec<_>>().join("\n")
}

pub fn daily_record(record: &DailyRecord) -> String {
    match (record.met, &record.reason) {
        (true, _) => format!("{} met", record.date),
        (false, Some(reason)) => format!("{} not met: {reason}", record.date),
        (false, None) => format!("{} not met", record.date),
    }
}

pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let today = match &view.today_status {
        Some(record) => daily_record(record),
        None => format!("{} no entry", view.as_of),
    };
    let _ = writeln!(out, "Today: {today}");
    let _ = writeln!(
        out,
        "Periodic this month: {} fulfilled of {}",
        view.periodic_fulfilled_count,
        view.periodic_details.len()
    );

    let _ = writeln!(out, "Active bulk:");
    for bulk in &view.active_bulk {
        let end = bulk
            .estimated_end_date
            .map_or_else(|| "paused".to_string(), |date| format!("ends ~{date}"));
        let _ = writeln!(out, "  {}  ({end})", intention(&bulk.intention));
    }

    let _ = writeln!(out, "Upcoming fixed-date:");
    for item in &view.upcoming_fixed_date {
        let _ = writeln!(out, "  {}", intention(item));
    }

    if !view.alerts.is_empty() {
        let _ = writeln!(out, "Alerts:");
        for alert in &view.alerts {
            let _ = writeln!(out, "  ! {alert}");
        }
    }
    out.trim_end().to_string()
}

pub fn import_report(report: &ImportReport) -> String {
    let mut out = format!(
        "Imported {} row(s), skipped {}.",
        report.accepted,
        report.skipped.len()
    );
    for skip in &report.skipped {
        let _ = write!(out, "\n  row {}: [{}] {}", skip.row, skip.reason_code, skip.message);
    }
    out
}
