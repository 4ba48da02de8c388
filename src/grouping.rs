//! Grouping of a flat message list into date buckets and sender runs.
//!
//! Messages are sorted chronologically, bucketed by calendar day in the
//! rendering timezone, and each bucket is split wherever the sender changes.
//! Buckets are ordered by their first message, so the output always reads
//! oldest to newest.

use chrono::{Local, NaiveDate, TimeZone};
use std::collections::HashMap;

use crate::models::{Message, LOCAL_SENDER};

/// Long-form date label, e.g. "Tuesday, May 20, 2025"
pub const DATE_LABEL_FORMAT: &str = "%A, %B %-d, %Y";
/// 24-hour bubble time, e.g. "14:05"
pub const TIME_LABEL_FORMAT: &str = "%H:%M";

/// Which side of the conversation a run is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sent,
    Received,
}

impl Side {
    pub fn of(sender: &str) -> Self {
        if sender == LOCAL_SENDER {
            Side::Sent
        } else {
            Side::Received
        }
    }
}

/// Maximal contiguous run of messages from one sender within a day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderRun {
    pub sender: String,
    pub messages: Vec<Message>,
}

impl SenderRun {
    pub fn side(&self) -> Side {
        Side::of(&self.sender)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub label: String,
    pub runs: Vec<SenderRun>,
}

impl DateGroup {
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.runs.iter().flat_map(|run| run.messages.iter())
    }
}

pub fn date_label(date: NaiveDate) -> String {
    date.format(DATE_LABEL_FORMAT).to_string()
}

pub fn time_label<Tz: TimeZone>(message: &Message, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    message
        .timestamp
        .with_timezone(tz)
        .format(TIME_LABEL_FORMAT)
        .to_string()
}

/// Group messages using the local timezone of the running process.
pub fn group(messages: &[Message]) -> Vec<DateGroup> {
    group_in(messages, &Local)
}

/// Group messages by calendar day in `tz`, then by consecutive sender.
pub fn group_in<Tz: TimeZone>(messages: &[Message], tz: &Tz) -> Vec<DateGroup> {
    let mut sorted: Vec<&Message> = messages.iter().collect();
    // Stable: equal timestamps keep their input order
    sorted.sort_by_key(|m| m.timestamp);

    let mut buckets: Vec<(NaiveDate, Vec<&Message>)> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    for message in sorted {
        let day = message.timestamp.with_timezone(tz).date_naive();
        match index.get(&day) {
            Some(&slot) => buckets[slot].1.push(message),
            None => {
                index.insert(day, buckets.len());
                buckets.push((day, vec![message]));
            }
        }
    }

    buckets
        .into_iter()
        .map(|(date, day_messages)| DateGroup {
            date,
            label: date_label(date),
            runs: split_runs(day_messages),
        })
        .collect()
}

/// Split one day's messages into sender runs.
///
/// The bucket is re-sorted first so a bucket handed over on its own still
/// yields chronological runs.
pub fn split_runs(mut day_messages: Vec<&Message>) -> Vec<SenderRun> {
    day_messages.sort_by_key(|m| m.timestamp);

    let mut runs: Vec<SenderRun> = Vec::new();
    let mut current: Option<SenderRun> = None;

    for message in day_messages {
        match current.as_mut() {
            Some(run) if run.sender == message.sender => run.messages.push(message.clone()),
            _ => {
                if let Some(done) = current.take() {
                    runs.push(done);
                }
                current = Some(SenderRun {
                    sender: message.sender.clone(),
                    messages: vec![message.clone()],
                });
            }
        }
    }
    if let Some(done) = current {
        runs.push(done);
    }

    runs
}

/// Messages in display order
pub fn flatten(groups: &[DateGroup]) -> Vec<Message> {
    groups.iter().flat_map(|g| g.messages().cloned()).collect()
}
