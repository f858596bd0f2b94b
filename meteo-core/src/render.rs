use crate::{error::WeatherError, presenter::ForecastView};

/// Output surface driven by the application controller. Each call replaces
/// whatever the corresponding region showed before.
pub trait Renderer {
    /// Placeholder shown while a forecast request is outstanding.
    fn loading(&mut self, location: &str);

    fn forecast(&mut self, view: &ForecastView);

    /// Replaces the whole forecast area; the only recovery offered is a retry.
    fn forecast_failed(&mut self, error: &WeatherError);

    /// Informational message that does not affect the forecast area.
    fn notice(&mut self, message: &str);
}
