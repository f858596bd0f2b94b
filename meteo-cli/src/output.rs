//! Terminal rendering.
//!
//! Progress lines (loading, suggestions, notices) are written as they happen.
//! The forecast area keeps only the latest render and is printed by
//! [`TerminalRenderer::finish`], so a day or unit change that follows a fetch
//! in the same run replaces the first render instead of repeating it.

use std::io::{self, Stdout, Write};

use meteo_core::{
    ForecastView, Renderer, SuggestionsView, WeatherError, WeatherIcon,
    presenter::{DayView, HourView},
};

#[derive(Debug)]
enum Screen {
    Forecast(ForecastView),
    Failed(String),
}

#[derive(Debug)]
pub struct TerminalRenderer<W: Write> {
    out: W,
    screen: Option<Screen>,
    io_error: Option<io::Error>,
}

impl TerminalRenderer<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, screen: None, io_error: None }
    }

    pub fn suggestions(&mut self, view: &SuggestionsView) -> io::Result<()> {
        match view {
            SuggestionsView::Hidden => Ok(()),
            SuggestionsView::Loading(text) => writeln!(self.out, "{text}..."),
            SuggestionsView::Message(text) => writeln!(self.out, "{text}"),
            SuggestionsView::Items(names) => {
                for (i, name) in names.iter().enumerate() {
                    writeln!(self.out, "  {}. {name}", i + 1)?;
                }
                Ok(())
            }
        }
    }

    /// Print the forecast area and surface any write error seen so far.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(err) = self.io_error.take() {
            return Err(err);
        }

        match self.screen.take() {
            Some(Screen::Forecast(view)) => write_forecast(&mut self.out, &view)?,
            Some(Screen::Failed(details)) => write_failure(&mut self.out, &details)?,
            None => {}
        }
        self.out.flush()
    }

    fn line(&mut self, text: &str) {
        if self.io_error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{text}") {
            self.io_error = Some(err);
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn loading(&mut self, location: &str) {
        self.line(&format!("Loading forecast for {location}..."));
    }

    fn forecast(&mut self, view: &ForecastView) {
        self.screen = Some(Screen::Forecast(view.clone()));
    }

    fn forecast_failed(&mut self, error: &WeatherError) {
        self.screen = Some(Screen::Failed(error.to_string()));
    }

    fn notice(&mut self, message: &str) {
        self.line(message);
    }
}

fn glyph(icon: WeatherIcon) -> &'static str {
    match icon {
        WeatherIcon::Sunny => "☀",
        WeatherIcon::PartlyCloudy => "⛅",
        WeatherIcon::Overcast => "☁",
        WeatherIcon::Fog => "🌫",
        WeatherIcon::Rain => "🌧",
        WeatherIcon::Snow => "❄",
    }
}

fn write_forecast(out: &mut impl Write, view: &ForecastView) -> io::Result<()> {
    let current = &view.current;

    writeln!(out)?;
    writeln!(out, "{}", view.header.location)?;
    writeln!(out, "{}", view.header.date)?;
    writeln!(out)?;
    writeln!(out, "  {} {}  {}", glyph(current.icon), current.temperature, current.icon.label())?;
    writeln!(
        out,
        "  Feels like {}   Humidity {}   Wind {}   Precipitation {}",
        current.feels_like, current.humidity, current.wind, current.precipitation
    )?;

    writeln!(out)?;
    writeln!(out, "Daily forecast")?;
    for day in &view.days {
        write_day(out, day)?;
    }

    writeln!(out)?;
    let day_name = view.day_options.get(view.selected_day).map(String::as_str).unwrap_or("-");
    writeln!(out, "Hourly forecast ({day_name})")?;
    for hour in &view.hours {
        write_hour(out, hour)?;
    }
    Ok(())
}

fn write_day(out: &mut impl Write, day: &DayView) -> io::Result<()> {
    writeln!(
        out,
        "  {:<4} {}  {:>5} / {:<5} {}",
        day.weekday,
        glyph(day.icon),
        day.max,
        day.min,
        day.precipitation
    )
}

fn write_hour(out: &mut impl Write, hour: &HourView) -> io::Result<()> {
    writeln!(out, "  {:>5}  {}  {}", hour.label, glyph(hour.icon), hour.temperature)
}

fn write_failure(out: &mut impl Write, details: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Something went wrong")?;
    writeln!(
        out,
        "We couldn't connect to the weather API. Please try again in a few moments."
    )?;
    writeln!(out, "Retry: run the same command again.")?;
    writeln!(out, "({details})")
}
