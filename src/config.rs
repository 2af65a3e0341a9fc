use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use cross_xdg::BaseDirs;
use nu_ansi_term::Color;

use crate::theme::catppuccin::Mocha as P;

/// Highlighter colors for the interactive editor, one per command class.
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub move_right: Color, // '>'
    pub move_left: Color,  // '<'
    pub increment: Color,  // '+'
    pub decrement: Color,  // '-'
    pub output: Color,     // '.'
    pub input: Color,      // ','
    pub loop_bracket: Color,
    pub comment: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            move_right: P::SKY,
            move_left: P::TEAL,
            increment: P::GREEN,
            decrement: P::RED,
            output: P::YELLOW,
            input: P::PEACH,
            loop_bracket: P::MAUVE,
            comment: P::SURFACE2,
        }
    }
}

/// User settings read from `$XDG_CONFIG_HOME/fooked.toml`.
///
/// ```toml
/// [interpreter]
/// mem_size = 65536
///
/// [colors]
/// increment = "#a6e3a1"
/// comment = "darkgray"
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub mem_size: Option<usize>,
    pub colors: Colors,
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Settings loaded once per process; defaults when no file is present.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| load_from_toml().unwrap_or_default())
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        return None;
    }

    let name = s.to_ascii_lowercase();
    Some(match name.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" | "purple" => Color::Purple,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "lightgray" | "light_gray" => Color::LightGray,
        "darkgray" | "dark_grey" | "darkgrey" | "dark_gray" => Color::DarkGray,
        "lightred" | "light_red" => Color::LightRed,
        "lightgreen" | "light_green" => Color::LightGreen,
        "lightyellow" | "light_yellow" => Color::LightYellow,
        "lightblue" | "light_blue" => Color::LightBlue,
        "lightmagenta" | "light_magenta" | "lightpurple" | "light_purple" => Color::LightPurple,
        "lightcyan" | "light_cyan" => Color::LightCyan,
        _ => return None,
    })
}

fn config_path() -> Option<PathBuf> {
    // On Linux: resolves to /home/<user>/.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("fooked.toml");
    Some(path)
}

fn load_from_toml() -> Option<Settings> {
    let content = fs::read_to_string(config_path()?).ok()?;
    Some(parse_settings(&content))
}

/// Parse the small TOML subset the config file uses: `[section]` headers
/// and `key = value` pairs, with optional double quotes around values.
/// Unknown sections, unknown keys and bad values are ignored.
pub fn parse_settings(content: &str) -> Settings {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current = String::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            current = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len() - 1].to_string()
            } else {
                val_raw.to_string()
            };
            sections.entry(current.clone()).or_default().insert(key, val);
        }
    }

    let mut cfg = Settings::default();

    if let Some(interp) = sections.get("interpreter") {
        cfg.mem_size = interp
            .get("mem_size")
            .and_then(|s| s.replace('_', "").parse::<usize>().ok())
            .filter(|&n| n > 0);
    }

    if let Some(map) = sections.get("colors") {
        macro_rules! set {
            ($field:ident, $key:literal) => {
                if let Some(v) = map.get($key).and_then(|s| parse_color(s)) {
                    cfg.colors.$field = v;
                }
            };
        }

        set!(move_right, "move_right");
        set!(move_left, "move_left");
        set!(increment, "increment");
        set!(decrement, "decrement");
        set!(output, "output");
        set!(input, "input");
        set!(loop_bracket, "loop");
        set!(comment, "comment");
    }

    cfg
}
