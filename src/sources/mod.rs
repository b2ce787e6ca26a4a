// Upstream adapters
// One module per data source, each implementing `DrawSource`

pub mod api;
pub mod search;

pub use api::LotteryApiSource;
pub use search::SearchPageSource;

use std::time::Duration;

use crate::settings::SourceSettings;
use crate::source::DrawSource;

/// Builds the adapters in priority order: API first, search page second.
pub fn from_settings(
    settings: &SourceSettings,
    calendar: crate::calendar::DrawCalendar,
) -> anyhow::Result<Vec<Box<dyn DrawSource>>> {
    let timeout = Duration::from_secs(settings.timeout_seconds);
    let sources: Vec<Box<dyn DrawSource>> = vec![
        Box::new(LotteryApiSource::new(&settings.api_url, timeout)?),
        Box::new(SearchPageSource::new(
            &settings.search_url,
            &settings.user_agent,
            timeout,
            calendar,
        )?),
    ];
    Ok(sources)
}
