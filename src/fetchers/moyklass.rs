use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::{PlannedRequest, SourceFetcher};
use crate::config::MoyKlassVenue;
use crate::domain::{CanonicalSlot, DATE_FORMAT};
use crate::http::{UpstreamRequest, with_query};
use crate::pagination::{HorizonConfig, TimeUnit};

// lesson_<date>_<HH-MM>_<durations>, e.g. lesson_2025-12-04_07-00_60,90
static LESSON_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^lesson_(\d{4}-\d{2}-\d{2})_(\d{2})-(\d{2})_(\d+(?:,\d+)*)$").unwrap());

/// MoyKlass public schedule page, scraped one calendar week at a time
pub struct MoyKlassFetcher<'a> {
    venue: &'a MoyKlassVenue,
    weeks: u32,
}

impl<'a> MoyKlassFetcher<'a> {
    pub fn new(venue: &'a MoyKlassVenue, weeks: u32) -> Self {
        Self { venue, weeks }
    }
}

impl SourceFetcher for MoyKlassFetcher<'_> {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig {
        HorizonConfig::weeks(today, self.weeks)
    }

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest> {
        let monday = unit.first_day().format(DATE_FORMAT).to_string();
        let url = with_query(&self.venue.page_url, &[("date", monday)]);
        let request = UpstreamRequest::get(url).with_cookie(self.venue.cookie.as_deref());
        vec![PlannedRequest::new(request)]
    }

    fn parse(&self, _planned: &PlannedRequest, unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>> {
        let slots = parse_week_page(body)
            .into_iter()
            .filter(|slot| slot.start().is_some_and(|start| unit.contains(start.date())))
            .collect();
        Ok(slots)
    }
}

/// Every lesson block on a week page
pub fn parse_week_page(html: &str) -> Vec<CanonicalSlot> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"[id^="lesson_"]"#) else {
        return Vec::new();
    };
    document.select(&selector).filter_map(parse_lesson).collect()
}

fn parse_lesson(element: ElementRef<'_>) -> Option<CanonicalSlot> {
    let id = element.value().attr("id")?;
    let Some((start, duration)) = parse_lesson_id(id) else {
        debug!("Skipping lesson block with unexpected id: {}", id);
        return None;
    };
    let label = lesson_label(element);
    let slot = CanonicalSlot::new(start, duration)?.with_room(label.clone().unwrap_or_default(), label.as_deref());
    Some(slot)
}

/// Start and first listed duration encoded in a lesson block id
fn parse_lesson_id(id: &str) -> Option<(NaiveDateTime, u32)> {
    let captures = LESSON_ID.captures(id)?;
    let date = NaiveDate::parse_from_str(captures.get(1)?.as_str(), DATE_FORMAT).ok()?;
    let hour = captures.get(2)?.as_str().parse().ok()?;
    let minute = captures.get(3)?.as_str().parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let duration = captures.get(4)?.as_str().split(',').next()?.parse().ok()?;
    Some((date.and_time(time), duration))
}

/// Text of the block, or of the text right after it when the block itself is empty
fn lesson_label(element: ElementRef<'_>) -> Option<String> {
    let own = collapse(element.text());
    if !own.is_empty() {
        return Some(own);
    }
    element.next_siblings().find_map(|node| {
        let text = match ElementRef::wrap(node) {
            Some(sibling) => collapse(sibling.text()),
            None => node.value().as_text().map(|t| collapse(std::iter::once(&**t)))?,
        };
        (!text.is_empty()).then_some(text)
    })
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
