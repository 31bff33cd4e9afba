//! Engine Configuration

use fsvg_dom::values::DEFAULT_DPI;
use fsvg_xml::{ReadOptions, WriteOptions};
use serde::{Deserialize, Serialize};

/// Engine configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolution used to convert absolute units to pixels
    pub dpi: f32,

    /// Maximum decimals written for numbers
    pub float_precision: usize,

    /// Write CSS-sourced attributes as `debug:css`
    pub debug_css_style: bool,

    /// Indent written markup
    pub pretty: bool,

    /// Apply `<style>` rules when a document is loaded
    pub restyle_on_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            float_precision: 3,
            debug_css_style: false,
            pretty: false,
            restyle_on_load: true,
        }
    }
}

impl Config {
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            dpi: self.dpi,
            restyle: self.restyle_on_load,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            precision: self.float_precision,
            debug_css_style: self.debug_css_style,
            pretty: self.pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dpi, 96.0);
        assert_eq!(config.float_precision, 3);
        assert!(config.restyle_on_load);
        assert!(!config.debug_css_style);
    }

    #[test]
    fn test_derived_options() {
        let config = Config {
            dpi: 72.0,
            float_precision: 5,
            pretty: true,
            restyle_on_load: false,
            ..Config::default()
        };
        assert_eq!(config.read_options(), ReadOptions { dpi: 72.0, restyle: false });
        let write = config.write_options();
        assert_eq!(write.precision, 5);
        assert!(write.pretty);
    }
}
