use crate::algorithms::projection::AreaBounds;
use crate::layer::model::Layer;

/// Settings merged across every delivered layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSettings {
    /// Disabled as soon as one layer disables it
    pub apply_kalman_filter: bool,
    pub area: AreaBounds,
    /// First refresh interval of at least one second (seconds)
    pub refresh_interval_s: Option<f64>,
    pub information_message: Option<String>,
    /// First positive interval (seconds), 0 updates on every reading
    pub position_update_interval_s: f64,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            apply_kalman_filter: true,
            area: AreaBounds::default(),
            refresh_interval_s: None,
            information_message: None,
            position_update_interval_s: 0.0,
        }
    }
}

impl LayerSettings {
    pub fn merge<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> Self {
        let mut settings = Self::default();
        let mut area_size = 0;
        let mut area_width = 0;

        for layer in layers {
            settings.apply_kalman_filter &= layer.apply_kalman_filter;
            area_size = area_size.max(layer.area_size);
            area_width = area_width.max(layer.area_width);

            if settings.refresh_interval_s.is_none() && layer.refresh_interval >= 1.0 {
                settings.refresh_interval_s = Some(layer.refresh_interval);
            }
            if settings.information_message.is_none() {
                settings.information_message = layer.information_message().map(str::to_string);
            }
            if settings.position_update_interval_s <= 0.0 {
                settings.position_update_interval_s = layer.position_update_interval();
            }
        }

        settings.area = AreaBounds::normalized(area_width as f64, area_size as f64);
        settings
    }
}
