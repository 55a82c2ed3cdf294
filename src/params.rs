use analytics::AggregationParams;
use anyhow::{Context, bail};
use chrono::NaiveDate;
use configuration::DashboardConfig;
use core_types::DateRange;

/// The filter controls as the user last set them.
///
/// Either end of the date range may be left open; it is then closed with the
/// dataset's own first or last purchase date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub top_n: usize,
    pub rows: Option<usize>,
}

impl FilterState {
    pub fn new(top_n: usize) -> Self {
        Self {
            from: None,
            to: None,
            top_n,
            rows: None,
        }
    }

    /// Builds the engine parameters, closing open range ends with `span`.
    pub fn to_params(&self, span: Option<DateRange>) -> AggregationParams {
        AggregationParams::new(self.top_n)
            .with_range(resolve_range(self.from, self.to, span))
            .with_row_limit(self.rows)
    }
}

/// Turns the optional `--from` / `--to` pair into a range.
///
/// The result is not validated here; a reversed range is reported by the
/// engine so the caller can show it to the user.
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    span: Option<DateRange>,
) -> Option<DateRange> {
    match (from, to) {
        (None, None) => None,
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        (Some(start), None) => Some(DateRange {
            start,
            end: span.map_or(start, |s| s.end),
        }),
        (None, Some(end)) => Some(DateRange {
            start: span.map_or(end, |s| s.start),
            end,
        }),
    }
}

/// What the interactive loop should do after reading a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Render,
    Help,
    Quit,
    Nothing,
}

/// Applies one line of interactive input to `state`.
///
/// A line holds whitespace-separated `key=value` pairs (`from`, `to`, `top`,
/// `rows`) or a single word: `reset`, `show`, `help`, `quit`. `rows=all` and
/// `from=` / `to=` with no value clear that control. `top` must lie within the
/// configured bounds. Nothing is applied if any pair on the line is invalid.
pub fn apply_command(
    state: &mut FilterState,
    line: &str,
    dashboard: &DashboardConfig,
) -> anyhow::Result<Action> {
    let line = line.trim();
    match line {
        "" => return Ok(Action::Nothing),
        "quit" | "exit" | "q" => return Ok(Action::Quit),
        "help" | "?" => return Ok(Action::Help),
        "show" => return Ok(Action::Render),
        "reset" => {
            *state = FilterState::new(dashboard.default_top_n);
            return Ok(Action::Render);
        }
        _ => {}
    }

    let mut next = state.clone();
    for token in line.split_whitespace() {
        let (key, value) = token
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{token}'"))?;

        match key {
            "from" => next.from = parse_optional_date(value)?,
            "to" => next.to = parse_optional_date(value)?,
            "top" | "top_n" => next.top_n = parse_top_n(value, dashboard)?,
            "rows" => {
                next.rows = match value {
                    "" | "all" => None,
                    n => Some(
                        n.parse()
                            .with_context(|| format!("'{n}' is not a valid row count"))?,
                    ),
                }
            }
            other => bail!("unknown control '{other}' (expected from, to, top or rows)"),
        }
    }

    *state = next;
    Ok(Action::Render)
}

fn parse_top_n(value: &str, dashboard: &DashboardConfig) -> anyhow::Result<usize> {
    let top_n: usize = value
        .parse()
        .with_context(|| format!("'{value}' is not a valid top-N"))?;
    let (min, max) = (dashboard.top_n_min, dashboard.top_n_max);
    if !(min..=max).contains(&top_n) {
        bail!("top-N must be between {min} and {max}, got {top_n}");
    }
    Ok(top_n)
}

fn parse_optional_date(value: &str) -> anyhow::Result<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("'{value}' is not a date (expected YYYY-MM-DD)"))?;
    Ok(Some(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn span() -> Option<DateRange> {
        Some(DateRange {
            start: date(2016, 9, 4),
            end: date(2018, 10, 17),
        })
    }

    #[test]
    fn open_ends_close_with_dataset_span() {
        assert_eq!(resolve_range(None, None, span()), None);
        assert_eq!(
            resolve_range(Some(date(2017, 1, 1)), None, span()),
            Some(DateRange {
                start: date(2017, 1, 1),
                end: date(2018, 10, 17)
            })
        );
        assert_eq!(
            resolve_range(None, Some(date(2017, 6, 30)), span()),
            Some(DateRange {
                start: date(2016, 9, 4),
                end: date(2017, 6, 30)
            })
        );
    }

    #[test]
    fn reversed_range_is_passed_through() {
        let range =
            resolve_range(Some(date(2018, 1, 1)), Some(date(2017, 1, 1)), span()).unwrap();
        assert!(range.validate().is_err());
    }

    #[test]
    fn commands_update_state() {
        let dashboard = DashboardConfig::default();
        let mut state = FilterState::new(5);
        let line = "from=2017-01-01 to=2017-03-31 top=7 rows=100";
        assert_eq!(apply_command(&mut state, line, &dashboard).unwrap(), Action::Render);
        assert_eq!(state.from, Some(date(2017, 1, 1)));
        assert_eq!(state.to, Some(date(2017, 3, 31)));
        assert_eq!(state.top_n, 7);
        assert_eq!(state.rows, Some(100));

        apply_command(&mut state, "rows=all from=", &dashboard).unwrap();
        assert_eq!(state.rows, None);
        assert_eq!(state.from, None);

        assert_eq!(apply_command(&mut state, "reset", &dashboard).unwrap(), Action::Render);
        assert_eq!(state, FilterState::new(5));
    }

    #[test]
    fn invalid_line_leaves_state_untouched() {
        let dashboard = DashboardConfig::default();
        let mut state = FilterState::new(5);
        assert!(apply_command(&mut state, "top=8 from=yesterday", &dashboard).is_err());
        assert!(apply_command(&mut state, "colour=blue", &dashboard).is_err());
        assert!(apply_command(&mut state, "top", &dashboard).is_err());
        assert_eq!(state, FilterState::new(5));
    }

    #[test]
    fn top_n_outside_configured_bounds_is_rejected() {
        let dashboard = DashboardConfig::default();
        let mut state = FilterState::new(5);

        assert!(apply_command(&mut state, "top=50", &dashboard).is_err());
        assert!(apply_command(&mut state, "from=2017-01-01 top=4", &dashboard).is_err());
        assert_eq!(state, FilterState::new(5));

        apply_command(&mut state, "top=10", &dashboard).unwrap();
        assert_eq!(state.top_n, 10);
    }

    #[test]
    fn single_word_commands() {
        let dashboard = DashboardConfig::default();
        let mut state = FilterState::new(5);
        assert_eq!(apply_command(&mut state, "  ", &dashboard).unwrap(), Action::Nothing);
        assert_eq!(apply_command(&mut state, "quit", &dashboard).unwrap(), Action::Quit);
        assert_eq!(apply_command(&mut state, "help", &dashboard).unwrap(), Action::Help);
        assert_eq!(apply_command(&mut state, "show", &dashboard).unwrap(), Action::Render);
    }
}
