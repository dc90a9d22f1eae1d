//! services/api/src/web/render.rs
//!
//! Turns view state into HTML. Every value that came from an upstream webhook
//! goes through [`escape`] before it reaches the page.

use chrono_tz::Tz;
use interview_core::events::EventPanel;
use interview_core::scheduling::{BookingState, SimulationState};
use interview_core::{Disclosure, EventsView, LoadPhase, ProcessingState, SchedulingView};
use std::fmt::Write;
use uuid::Uuid;

/// Format of the `datetime-local` input.
pub const PICKER_FORMAT: &str = "%Y-%m-%dT%H:%M";

const STYLE: &str = "body{font-family:Roboto,Helvetica,Arial,sans-serif;margin:0;background:#fafafa}\
header{background:#1976d2;color:#fff;display:flex;align-items:center;padding:0 24px;height:64px;margin-bottom:32px}\
header h1{flex-grow:1;font-size:20px;font-weight:500}\
header a{color:#fff;text-decoration:none;margin-left:16px;text-transform:uppercase;font-size:14px}\
main{margin:0 auto;padding:0 16px}\
label{display:block;margin-top:16px;font-size:14px;color:#555}\
select,input{width:100%;padding:8px;margin-top:4px;box-sizing:border-box}\
button{background:#1976d2;color:#fff;border:0;border-radius:4px;padding:8px 16px;cursor:pointer}\
button:disabled{background:#ccc;cursor:default}\
.card{border:1px solid #ccc;border-radius:8px;padding:24px;margin-top:32px;background:#fff}\
.notice{background:#e3f2fd;color:#0d47a1;border:1px solid #90caf9;border-radius:8px;padding:24px;margin-top:24px}\
.error{color:#d32f2f;margin-top:16px}\
.chip{display:inline-block;border-radius:16px;padding:4px 12px;font-size:13px}\
.chip.waiting{border:1px solid #ed6c02;color:#ed6c02}\
.chip.busy{background:#e0e0e0;color:#333}\
.spinner{text-align:center;margin-top:32px;color:#1976d2}\
.muted{color:#666;font-size:14px}\
ol.transcript{list-style:none;padding:0}\
ol.transcript li{border:1px solid #ddd;border-radius:4px;padding:8px;margin-bottom:8px}";

/// HTML-escapes text for element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Seconds between reloads while a booking is in flight.
pub const SUBMITTING_REFRESH_SECS: u32 = 1;

fn layout(title: &str, max_width: u32, body: &str) -> String {
    page(title, max_width, "", body)
}

fn page(title: &str, max_width: u32, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n{head}\
<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
<header><h1>Interview Scheduler</h1><nav><a href=\"/\">Schedule</a><a href=\"/events\">Events</a></nav></header>\n\
<main style=\"max-width:{max_width}px\">\n{body}</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn spinner(label: &str) -> String {
    format!("<div class=\"spinner\" role=\"progressbar\">{}</div>\n", escape(label))
}

//=========================================================================================
// Scheduling Page
//=========================================================================================

pub fn schedule_page(view_id: Uuid, view: &SchedulingView, tz: &Tz) -> String {
    if view.phase() == LoadPhase::Loading {
        return layout("Schedule Interview", 600, &spinner("Loading..."));
    }

    let selection = view.selection();
    let submitting = view.is_submitting();
    let mut body = String::new();
    body.push_str("<h2>Schedule Interview</h2>\n");
    let _ = writeln!(body, "<form method=\"post\" action=\"/schedule/{}\">", view_id);

    // Candidate dropdown
    body.push_str("<label for=\"candidate\">Candidate</label>\n");
    body.push_str("<select id=\"candidate\" name=\"candidate\" required>\n");
    body.push_str("<option value=\"\"></option>\n");
    for c in view.candidates() {
        let selected = selection.candidate_email.as_deref() == Some(c.email.as_str());
        let _ = writeln!(
            body,
            "<option value=\"{}\"{}>{}</option>",
            escape(&c.email),
            if selected { " selected" } else { "" },
            escape(&c.label())
        );
    }
    body.push_str("</select>\n");

    // Interviewer multi-select
    body.push_str("<label for=\"interviewers\">Interviewers</label>\n");
    body.push_str("<select id=\"interviewers\" name=\"interviewers\" multiple required>\n");
    for i in view.interviewers() {
        let selected = selection.interviewer_emails.contains(&i.email);
        let _ = writeln!(
            body,
            "<option value=\"{}\"{}>{}</option>",
            escape(&i.email),
            if selected { " selected" } else { "" },
            escape(&i.label())
        );
    }
    body.push_str("</select>\n");

    // Date & time picker, 30-minute steps
    let picked = selection
        .datetime
        .map(|t| t.with_timezone(tz).format(PICKER_FORMAT).to_string())
        .unwrap_or_default();
    body.push_str("<label for=\"datetime\">Pick Date &amp; Time</label>\n");
    let _ = writeln!(
        body,
        "<input id=\"datetime\" type=\"datetime-local\" name=\"datetime\" step=\"1800\" value=\"{}\" required>",
        escape(&picked)
    );
    let _ = writeln!(body, "<p class=\"muted\">Times are in {}.</p>", escape(tz.name()));

    let _ = writeln!(
        body,
        "<button type=\"submit\" style=\"width:100%;margin-top:32px\"{}>{}</button>",
        if submitting { " disabled" } else { "" },
        if submitting { "Scheduling..." } else { "Schedule" }
    );
    body.push_str("</form>\n");

    if let Some(rejection) = view.rejection() {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape(rejection));
    }

    body.push_str(&booking_status(view_id, view.booking()));
    if submitting {
        // Poll until the booking settles.
        let head = format!(
            "<meta http-equiv=\"refresh\" content=\"{}\">\n",
            SUBMITTING_REFRESH_SECS
        );
        return page("Schedule Interview", 600, &head, &body);
    }
    layout("Schedule Interview", 600, &body)
}

fn booking_status(view_id: Uuid, booking: &BookingState) -> String {
    let message = booking.display_message().unwrap_or_default();
    match booking {
        BookingState::Idle => String::new(),
        BookingState::Submitting => spinner("Scheduling..."),
        BookingState::Error { .. } => {
            format!("<p class=\"error\" role=\"alert\">{}</p>\n", escape(&message))
        }
        BookingState::Success { simulation, .. } => {
            let mut out = String::from("<div class=\"notice\">\n");
            let _ = writeln!(out, "<p>{}</p>", escape(&message));
            match simulation {
                SimulationState::Started => out.push_str(
                    "<p><strong>Simulation started, results will be available in few minutes.</strong></p>\n",
                ),
                SimulationState::NotStarted => {
                    let _ = writeln!(
                        out,
                        "<form method=\"post\" action=\"/schedule/{}/simulate\">\
<button type=\"submit\">Simulate meet conversation &amp; initiate AI processing</button></form>",
                        view_id
                    );
                    out.push_str(
                        "<p class=\"muted\">** Pressing Simulate ... is needed only for MVP. \
In real application it will be hooked to Meet recording delivery and started automatically.</p>\n",
                    );
                }
            }
            out.push_str("</div>\n");
            out
        }
    }
}

//=========================================================================================
// Events Page
//=========================================================================================

pub fn events_page(view_id: Uuid, view: &EventsView, tz: &Tz) -> String {
    let mut body = String::from("<h2>Interview Events</h2>\n");
    if view.phase() == LoadPhase::Loading {
        body.push_str(&spinner("Loading..."));
        return layout("Interview Events", 900, &body);
    }

    for card in view.cards(tz) {
        let _ = writeln!(
            body,
            "<section class=\"card\" id=\"event-{}\">",
            escape(&card.key)
        );
        let _ = writeln!(body, "<h3>{}</h3>", escape(card.heading));
        let _ = writeln!(
            body,
            "<p class=\"muted\"><strong>Time:</strong> {} ({})</p>",
            escape(&card.time_range),
            escape(&card.duration)
        );
        let _ = writeln!(
            body,
            "<p><strong>Candidate:</strong> {}</p>",
            escape(&card.candidate)
        );
        let _ = writeln!(
            body,
            "<p><strong>Interviewers:</strong> {}</p>",
            escape(&card.interviewers)
        );

        if let Some(summary) = card.summary {
            let _ = writeln!(
                body,
                "<div class=\"summary\"><h4>Summary</h4><p>{}</p></div>",
                escape(summary)
            );
        }

        match &card.panel {
            EventPanel::Transcript {
                conclusion,
                disclosure,
                lines,
            } => {
                let _ = writeln!(
                    body,
                    "<div class=\"notice\"><h4>🧠 AI Conclusion:</h4><p>{}</p></div>",
                    escape(conclusion.unwrap_or_default())
                );
                let label = match disclosure {
                    Disclosure::Collapsed => "Expand more",
                    Disclosure::Expanded => "Expand less",
                };
                let _ = writeln!(
                    body,
                    "<form method=\"post\" action=\"/events/{}/transcripts\">\
<h4 style=\"display:inline-block;margin-right:16px\">🗣️ Transcript</h4>\
<input type=\"hidden\" name=\"key\" value=\"{}\">\
<button type=\"submit\" aria-label=\"{}\" aria-expanded=\"{}\">{}</button></form>",
                    view_id,
                    escape(&card.key),
                    label,
                    *disclosure == Disclosure::Expanded,
                    if *disclosure == Disclosure::Expanded { "▲" } else { "▼" }
                );
                if let Some(lines) = lines {
                    body.push_str("<ol class=\"transcript\">\n");
                    for line in lines.iter() {
                        let _ = writeln!(
                            body,
                            "<li><strong>[{}] {}</strong><br>{}</li>",
                            escape(&line.timestamp),
                            escape(&line.speaker),
                            escape(&line.message)
                        );
                    }
                    body.push_str("</ol>\n");
                }
            }
            EventPanel::AwaitingRecording {
                event_id,
                processing,
            } => {
                body.push_str("<div style=\"display:flex;justify-content:space-between;align-items:center;margin-top:24px\">\n");
                body.push_str("<span class=\"chip waiting\">Waiting for meet recording...</span>\n");
                match processing {
                    ProcessingState::Requested => body.push_str(
                        "<span class=\"chip busy\">AI processing in progress...</span>\n",
                    ),
                    ProcessingState::Idle => {
                        let _ = writeln!(
                            body,
                            "<form method=\"post\" action=\"/events/{}/processing\">\
<input type=\"hidden\" name=\"event_id\" value=\"{}\">\
<button type=\"submit\">Re-Start AI Processing</button></form>",
                            view_id,
                            escape(event_id)
                        );
                    }
                }
                body.push_str("</div>\n");
            }
        }
        body.push_str("</section>\n");
    }

    layout("Interview Events", 900, &body)
}

/// Shown for a view id that was never issued or has been evicted.
pub fn expired_page(remount: &str) -> String {
    let body = format!(
        "<p>This page has expired. <a href=\"{}\">Reload</a> to start again.</p>\n",
        escape(remount)
    );
    layout("Page expired", 600, &body)
}
