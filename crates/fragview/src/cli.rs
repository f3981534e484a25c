use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fragview",
    author,
    version,
    about = "Full-screen fragment shader viewer"
)]
pub struct Cli {
    /// Shader source: a local `.frag` path or an http(s) URL.
    #[arg(value_name = "SHADER")]
    pub shader: String,

    /// Window size in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0 = uncapped, render on every redraw callback).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Window title override.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in surface size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in surface size".to_string())?;
    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size("640X480").unwrap(), (640, 480));
        assert!(parse_surface_size("0x100").is_err());
        assert!(parse_surface_size("1920").is_err());
        assert!(parse_surface_size("axb").is_err());
    }
}
